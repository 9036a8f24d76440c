//! Download of the remote news dataset.
//!
//! The dataset is published as one or more Parquet files behind bearer-token authentication.
//! [DatasetLoader::load] fetches them in order, skips the ones that cannot be downloaded or
//! decoded, and concatenates the rest into a single [CombinedTable].

use bytes::Bytes;

use crate::news::NewsRecord;

pub mod parquet;

/// Number of rows shown in the debug preview after a load.
const PREVIEW_ROWS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Http error (e.g.: connection error, non-success status, etc.)
    #[error("HttpError: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ParquetError: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),

    #[error("ArrowError: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// A row could not be turned into a news record
    #[error("JsonError: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Unsupported column type: {0}")]
    UnsupportedType(String),

    /// Every source failed
    #[error("No dataset source could be loaded")]
    NoSources,
}

/// Concatenation of every successfully loaded source, in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CombinedTable {
    records: Vec<NewsRecord>,
}

impl CombinedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[NewsRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<NewsRecord> {
        self.records
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> &[NewsRecord] {
        self.records
            .get(..n.min(self.records.len()))
            .unwrap_or_default()
    }
}

impl From<Vec<NewsRecord>> for CombinedTable {
    fn from(records: Vec<NewsRecord>) -> Self {
        Self { records }
    }
}

#[derive(Clone)]
pub struct DatasetLoader {
    http_client: reqwest::Client,
    token: String,
}

impl std::fmt::Debug for DatasetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetLoader")
            .field("http_client", &self.http_client)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl DatasetLoader {
    pub fn new(http_client: reqwest::Client, token: &str) -> Self {
        Self {
            http_client,
            token: token.to_string(),
        }
    }

    /// Create a loader with its own `reqwest::Client`.
    pub fn from_token(token: &str) -> Self {
        Self::new(reqwest::Client::new(), token)
    }

    /// Download and decode every source, in order.
    ///
    /// A source that fails (transport error, non-success status, undecodable body) is logged and
    /// skipped, without retry. Fails with [DatasetError::NoSources] only when nothing could be
    /// loaded at all.
    pub async fn load<S>(&self, urls: &[S]) -> Result<CombinedTable, DatasetError>
    where
        S: AsRef<str>,
    {
        let mut records = Vec::new();
        let mut loaded_sources = 0usize;

        for url in urls.iter().map(AsRef::as_ref) {
            match self.fetch(url).await.and_then(parquet::decode) {
                Ok(rows) => {
                    tracing::info!(target: "newsrag", url, rows = rows.len(), "Loaded dataset source");
                    loaded_sources += 1;
                    records.extend(rows);
                }
                Err(err) => {
                    tracing::warn!(target: "newsrag", url, "Skipping dataset source: {err}");
                }
            }
        }

        if loaded_sources == 0 {
            tracing::error!(target: "newsrag", sources = urls.len(), "No dataset source could be loaded");
            return Err(DatasetError::NoSources);
        }

        let table = CombinedTable::from(records);

        tracing::info!(target: "newsrag",
            sources = loaded_sources,
            rows = table.len(),
            "Combined dataset"
        );
        tracing::debug!(target: "newsrag",
            "Dataset preview:\n{}",
            table
                .head(PREVIEW_ROWS)
                .iter()
                .map(|record| format!(
                    "{} | {}",
                    record.company_name.as_deref().unwrap_or("-"),
                    record.title.as_deref().unwrap_or("-")
                ))
                .collect::<Vec<String>>()
                .join("\n")
        );

        Ok(table)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, DatasetError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::{Method::GET, MockServer};

    use super::{
        parquet::{news_batch, to_parquet_bytes},
        *,
    };

    #[tokio::test]
    async fn concatenates_sources_in_order() {
        let server = MockServer::start_async().await;
        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/train/0000.parquet")
                    .header("Authorization", "Bearer hf_test");
                then.status(200)
                    .body(to_parquet_bytes(&news_batch(&["Alphabet", "Apple"])));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/train/0001.parquet")
                    .header("Authorization", "Bearer hf_test");
                then.status(200)
                    .body(to_parquet_bytes(&news_batch(&["Microsoft"])));
            })
            .await;

        let loader = DatasetLoader::from_token("hf_test");
        let table = loader
            .load(&[
                server.url("/train/0000.parquet"),
                server.url("/train/0001.parquet"),
            ])
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;

        let companies: Vec<_> = table
            .records()
            .iter()
            .filter_map(|r| r.company_name.as_deref())
            .collect();
        assert_eq!(companies, vec!["Alphabet", "Apple", "Microsoft"]);
    }

    #[tokio::test]
    async fn failed_sources_are_skipped() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/forbidden.parquet");
                then.status(401).body("unauthorized");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/garbage.parquet");
                then.status(200).body("not parquet at all");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ok.parquet");
                then.status(200)
                    .body(to_parquet_bytes(&news_batch(&["Alphabet", "Apple", "Microsoft"])));
            })
            .await;

        let table = DatasetLoader::from_token("hf_test")
            .load(&[
                server.url("/forbidden.parquet"),
                server.url("/garbage.parquet"),
                server.url("/ok.parquet"),
            ])
            .await
            .unwrap();

        assert_eq!(table.len(), 3);
    }

    #[tokio::test]
    async fn no_source_loaded_is_an_error() {
        let server = MockServer::start_async().await;
        let missing = server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.parquet");
                then.status(404);
            })
            .await;

        let result = DatasetLoader::from_token("hf_test")
            .load(&[server.url("/missing.parquet")])
            .await;

        missing.assert_async().await;
        assert!(matches!(result, Err(DatasetError::NoSources)));

        let nothing: [&str; 0] = [];
        assert!(matches!(
            DatasetLoader::from_token("hf_test").load(&nothing).await,
            Err(DatasetError::NoSources)
        ));
    }

    #[test]
    fn head_is_bounded() {
        let table = CombinedTable::from(vec![NewsRecord::default(); 2]);
        assert_eq!(table.head(5).len(), 2);
        assert_eq!(table.head(1).len(), 1);
    }
}
