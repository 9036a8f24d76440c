use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    sync::{PoisonError, RwLock},
};

use ordered_float::OrderedFloat;

use super::{LoadReport, NewsStore, SearchParams, VectorSearchIndex, VectorStoreError};
use crate::{
    embeddings::Embedding,
    news::{NewsRecord, SearchResult},
};

/// [NewsStore] and [VectorSearchIndex] kept in memory.
///
/// Searches are exact: every record is scored by cosine similarity, so the candidate pool of the
/// [SearchParams] is irrelevant here. Records whose embedding does not have the query's
/// dimensionality, or does not yield a finite score, are skipped.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    records: RwLock<Vec<NewsRecord>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `records`.
    pub fn from_records(records: Vec<NewsRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    fn ranking(
        &self,
        query: &Embedding,
        limit: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let records = self.records.read().map_err(poisoned)?;

        // Min-heap on (score, earliest index) keeping the `limit` best records
        let mut docs = BinaryHeap::new();
        for (idx, record) in records.iter().enumerate() {
            let Some(score) = query.cosine_similarity(&record.embedding) else {
                continue;
            };

            docs.push(Reverse(RankingItem(OrderedFloat(score), Reverse(idx))));
            if docs.len() > limit {
                docs.pop();
            }
        }

        // Ascending order of Reverse(..) is descending score
        let ranked = docs.into_sorted_vec();

        tracing::info!(target: "newsrag",
            "Selected documents: {}",
            ranked
                .iter()
                .map(|Reverse(RankingItem(score, Reverse(idx)))| format!("{idx} ({score})"))
                .collect::<Vec<String>>()
                .join(", ")
        );

        Ok(ranked
            .into_iter()
            .filter_map(|Reverse(RankingItem(score, Reverse(idx)))| {
                records
                    .get(idx)
                    .map(|record| SearchResult::from_record(record, score.0))
            })
            .collect())
    }
}

#[derive(Eq, PartialEq, Ord, PartialOrd)]
struct RankingItem(OrderedFloat<f64>, Reverse<usize>);

fn poisoned<T>(_: PoisonError<T>) -> VectorStoreError {
    VectorStoreError::DatastoreError("in-memory store lock poisoned".into())
}

impl NewsStore for InMemoryVectorStore {
    async fn replace_all(&self, records: &[NewsRecord]) -> Result<LoadReport, VectorStoreError> {
        let mut stored = self.records.write().map_err(poisoned)?;

        let deleted = stored.len() as u64;
        stored.clear();
        stored.extend_from_slice(records);

        Ok(LoadReport {
            deleted,
            inserted: records.len() as u64,
        })
    }

    async fn count(&self) -> Result<u64, VectorStoreError> {
        Ok(self.records.read().map_err(poisoned)?.len() as u64)
    }
}

impl VectorSearchIndex for InMemoryVectorStore {
    async fn search(
        &self,
        query: &Embedding,
        params: &SearchParams,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        self.ranking(query, params.limit() as usize)
    }
}
