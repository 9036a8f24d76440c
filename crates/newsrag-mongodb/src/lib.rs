use futures::TryStreamExt;
use mongodb::{
    Collection, SearchIndexModel, SearchIndexType,
    bson::{self, Document, doc},
};

use newsrag_core::{
    embeddings::Embedding,
    news::{HIDDEN_FIELDS, NewsRecord, SearchResult},
    vector_store::{LoadReport, NewsStore, SearchParams, VectorSearchIndex, VectorStoreError},
};

/// Number of documents sent per `insert_many` call by default.
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 1000;

fn mongodb_to_store_error(e: mongodb::error::Error) -> VectorStoreError {
    VectorStoreError::DatastoreError(Box::new(e))
}

fn bson_to_store_error<E>(e: E) -> VectorStoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    VectorStoreError::DatastoreError(Box::new(e))
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The connection string could not be parsed or the client could not be built
    #[error("Connection error: {0}")]
    Connection(#[source] mongodb::error::Error),

    /// The server did not answer the ping
    #[error("Ping failed: {0}")]
    Ping(#[source] mongodb::error::Error),
}

/// Connect to the deployment at `uri` and confirm it answers a `ping`.
pub async fn connect(uri: &str) -> Result<mongodb::Client, StoreError> {
    let client = mongodb::Client::with_uri_str(uri)
        .await
        .map_err(StoreError::Connection)
        .inspect_err(|err| tracing::error!(target: "newsrag", "{err}"))?;

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(StoreError::Ping)
        .inspect_err(|err| tracing::error!(target: "newsrag", "{err}"))?;

    tracing::info!(target: "newsrag", "Connection to MongoDB successful");
    Ok(client)
}

/// A MongoDB collection holding the news table.
///
/// # Example
/// ```no_run
/// use newsrag_core::{dataset::CombinedTable, vector_store::NewsStore};
/// use newsrag_mongodb::{connect, MongoDbNewsStore};
///
/// # async fn load(table: CombinedTable) -> Result<(), Box<dyn std::error::Error>> {
/// let client = connect("mongodb+srv://...").await?;
/// let store = MongoDbNewsStore::new(
///     client.database("tech_news").collection("hacker_noon_tech_news"),
/// );
///
/// let report = store.replace_all(table.records()).await?;
/// println!("{} documents loaded", report.inserted);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct MongoDbNewsStore {
    collection: Collection<NewsRecord>,
    insert_batch_size: usize,
}

impl MongoDbNewsStore {
    pub fn new(collection: Collection<NewsRecord>) -> Self {
        Self {
            collection,
            insert_batch_size: DEFAULT_INSERT_BATCH_SIZE,
        }
    }

    /// Number of documents per `insert_many` call. Zero is treated as one.
    pub fn with_insert_batch_size(mut self, insert_batch_size: usize) -> Self {
        self.insert_batch_size = insert_batch_size.max(1);
        self
    }

    pub fn collection(&self) -> &Collection<NewsRecord> {
        &self.collection
    }

    /// Declare an Atlas vector search index over the `embedding` field of the collection.
    ///
    /// The index is built asynchronously by the server; searches only return results once it is
    /// queryable.
    pub async fn create_vector_index(
        &self,
        index_name: &str,
        path: &str,
        dims: usize,
    ) -> Result<String, VectorStoreError> {
        let name = self
            .collection
            .create_search_index(
                SearchIndexModel::builder()
                    .name(Some(index_name.to_string()))
                    .index_type(Some(SearchIndexType::VectorSearch))
                    .definition(vector_index_definition(path, dims))
                    .build(),
            )
            .await
            .map_err(mongodb_to_store_error)?;

        tracing::info!(target: "newsrag",
            index = %name,
            collection = self.collection.name(),
            "Created vector search index"
        );
        Ok(name)
    }
}

/// Definition of a cosine-similarity vector index on `path`.
pub fn vector_index_definition(path: &str, dims: usize) -> Document {
    doc! {
        "fields": [{
            "type": "vector",
            "path": path,
            "numDimensions": dims as i64,
            "similarity": "cosine",
        }]
    }
}

/// Hand `records` to `insert` in slices of at most `batch_size` rows, in order, and sum the
/// counts it reports. Stops at the first failed batch. Nothing is sent for an empty table.
async fn insert_in_batches<'a, F, Fut>(
    records: &'a [NewsRecord],
    batch_size: usize,
    mut insert: F,
) -> Result<u64, VectorStoreError>
where
    F: FnMut(&'a [NewsRecord]) -> Fut,
    Fut: std::future::Future<Output = Result<u64, VectorStoreError>>,
{
    let mut inserted = 0u64;
    for batch in records.chunks(batch_size.max(1)) {
        inserted += insert(batch).await?;
    }
    Ok(inserted)
}

impl NewsStore for MongoDbNewsStore {
    async fn replace_all(&self, records: &[NewsRecord]) -> Result<LoadReport, VectorStoreError> {
        let deleted = self
            .collection
            .delete_many(doc! {})
            .await
            .map_err(mongodb_to_store_error)?
            .deleted_count;

        tracing::info!(target: "newsrag",
            deleted,
            collection = self.collection.name(),
            "Cleared collection"
        );

        let inserted = insert_in_batches(records, self.insert_batch_size, |batch| async move {
            self.collection
                .insert_many(batch)
                .await
                .map(|result| result.inserted_ids.len() as u64)
                .map_err(mongodb_to_store_error)
        })
        .await?;

        tracing::info!(target: "newsrag",
            inserted,
            collection = self.collection.name(),
            "Data ingestion into MongoDB completed"
        );

        Ok(LoadReport { deleted, inserted })
    }

    async fn count(&self) -> Result<u64, VectorStoreError> {
        self.collection
            .count_documents(doc! {})
            .await
            .map_err(mongodb_to_store_error)
    }
}

/// Atlas vector search over a news collection.
///
/// An index of type `vector` named like [SearchParams::index_name] must exist on the collection
/// (see [MongoDbNewsStore::create_vector_index]).
#[derive(Clone, Debug)]
pub struct MongoDbVectorIndex {
    collection: Collection<NewsRecord>,
}

impl MongoDbVectorIndex {
    pub fn new(collection: Collection<NewsRecord>) -> Self {
        Self { collection }
    }
}

/// `$vectorSearch` stage of the aggregation pipeline.
pub fn search_stage(query: &Embedding, params: &SearchParams) -> Document {
    doc! {
        "$vectorSearch": {
            "index": params.index_name(),
            "path": params.path(),
            "queryVector": &query.vec,
            "numCandidates": params.num_candidates(),
            "limit": params.limit(),
        }
    }
}

/// Projection stage: drop the store id and the vector, expose the search score.
pub fn projection_stage() -> Document {
    doc! {
        "$project": {
            "_id": 0,
            "embedding": 0,
            "score": { "$meta": "vectorSearchScore" },
        }
    }
}

impl VectorSearchIndex for MongoDbVectorIndex {
    async fn search(
        &self,
        query: &Embedding,
        params: &SearchParams,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let pipeline = [search_stage(query, params), projection_stage()];

        let documents: Vec<Document> = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(mongodb_to_store_error)?
            .try_collect()
            .await
            .map_err(mongodb_to_store_error)?;

        documents
            .into_iter()
            .map(|mut document| {
                for field in HIDDEN_FIELDS {
                    document.remove(field);
                }
                bson::from_document::<SearchResult>(document).map_err(bson_to_store_error)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::Bson;

    use super::*;

    fn records(n: usize) -> Vec<NewsRecord> {
        (0..n)
            .map(|i| NewsRecord {
                title: Some(format!("story {i}")),
                embedding: vec![i as f64, 1.0],
                ..Default::default()
            })
            .collect()
    }

    async fn batch_sizes(
        records: &[NewsRecord],
        batch_size: usize,
    ) -> (Result<u64, VectorStoreError>, Vec<usize>) {
        let mut sizes = Vec::new();
        let result = insert_in_batches(records, batch_size, |batch| {
            sizes.push(batch.len());
            std::future::ready(Ok(batch.len() as u64))
        })
        .await;
        (result, sizes)
    }

    #[tokio::test]
    async fn empty_table_sends_no_batch() {
        let (inserted, sizes) = batch_sizes(&[], 1000).await;

        assert_eq!(inserted.unwrap(), 0);
        assert!(sizes.is_empty());
    }

    #[tokio::test]
    async fn exactly_one_full_batch() {
        let (inserted, sizes) = batch_sizes(&records(4), 4).await;

        assert_eq!(inserted.unwrap(), 4);
        assert_eq!(sizes, vec![4]);
    }

    #[tokio::test]
    async fn remainder_goes_into_a_last_batch() {
        let (inserted, sizes) = batch_sizes(&records(5), 4).await;

        assert_eq!(inserted.unwrap(), 5);
        assert_eq!(sizes, vec![4, 1]);
    }

    #[tokio::test]
    async fn zero_batch_size_inserts_one_by_one() {
        let (inserted, sizes) = batch_sizes(&records(3), 0).await;

        assert_eq!(inserted.unwrap(), 3);
        assert_eq!(sizes, vec![1, 1, 1]);
    }

    #[tokio::test]
    async fn failed_batch_stops_the_load() {
        let table = records(5);
        let mut calls = 0;
        let result = insert_in_batches(&table, 2, |batch| {
            calls += 1;
            std::future::ready(if calls == 2 {
                Err(VectorStoreError::DatastoreError("insert rejected".into()))
            } else {
                Ok(batch.len() as u64)
            })
        })
        .await;

        assert!(matches!(result, Err(VectorStoreError::DatastoreError(_))));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn reloading_the_same_table_inserts_the_same_rows() {
        let table = records(2500);

        let (first, first_sizes) = batch_sizes(&table, DEFAULT_INSERT_BATCH_SIZE).await;
        let (second, second_sizes) = batch_sizes(&table, DEFAULT_INSERT_BATCH_SIZE).await;

        assert_eq!(first.unwrap(), 2500);
        assert_eq!(second.unwrap(), 2500);
        assert_eq!(first_sizes, vec![1000, 1000, 500]);
        assert_eq!(first_sizes, second_sizes);
    }

    #[test]
    fn search_stage_uses_params() {
        let query = Embedding {
            document: "I am invested in Alphabet".into(),
            vec: vec![0.5, -0.25],
        };
        let params = SearchParams::new("vector_index", "embedding", 150, 5).unwrap();

        assert_eq!(
            search_stage(&query, &params),
            doc! {
                "$vectorSearch": {
                    "index": "vector_index",
                    "path": "embedding",
                    "queryVector": [0.5, -0.25],
                    "numCandidates": 150_i64,
                    "limit": 5_i64,
                }
            }
        );
    }

    #[test]
    fn projection_hides_id_and_embedding() {
        let stage = projection_stage();
        let project = stage.get_document("$project").unwrap();

        assert_eq!(project.get("_id"), Some(&Bson::Int32(0)));
        assert_eq!(project.get("embedding"), Some(&Bson::Int32(0)));
        assert_eq!(
            project.get_document("score").unwrap(),
            &doc! { "$meta": "vectorSearchScore" }
        );
    }

    #[test]
    fn index_definition_is_cosine_on_embedding() {
        let definition = vector_index_definition("embedding", 256);
        let fields = definition.get_array("fields").unwrap();
        let field = fields.first().and_then(Bson::as_document).unwrap();

        assert_eq!(field.get_str("type").unwrap(), "vector");
        assert_eq!(field.get_str("path").unwrap(), "embedding");
        assert_eq!(field.get_i64("numDimensions").unwrap(), 256);
        assert_eq!(field.get_str("similarity").unwrap(), "cosine");
    }

    #[test]
    fn stored_documents_deserialize_into_results() {
        let document = doc! {
            "title": "Alphabet unveils a new AI model",
            "companyName": "Alphabet",
            "published_at": "2024-01-15T00:00:00+00:00",
            "main_image": "https://example.com/a.png",
            "score": 0.93,
        };

        let result: SearchResult = bson::from_document(document).unwrap();

        assert_eq!(result.company_name.as_deref(), Some("Alphabet"));
        assert_eq!(result.score, 0.93);
        assert_eq!(
            result.extra.get("main_image").and_then(|v| v.as_str()),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn records_serialize_with_dataset_field_names() {
        let record = NewsRecord {
            title: Some("Apple ships a new chip".into()),
            company_name: Some("Apple".into()),
            embedding: vec![0.1, 0.2],
            ..Default::default()
        };

        let document = bson::to_document(&record).unwrap();

        assert_eq!(document.get_str("companyName").unwrap(), "Apple");
        assert_eq!(document.get_array("embedding").unwrap().len(), 2);
        assert!(!document.contains_key("_id"));
    }
}
