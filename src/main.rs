use newsrag::{
    NewsRagConfig,
    answer::Answerer,
    dataset::DatasetLoader,
    mongodb::{MongoDbNewsStore, MongoDbVectorIndex, connect},
    news::NewsRecord,
    providers::{anthropic, openai},
    retriever::Retriever,
    vector_store::NewsStore,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_QUERY: &str = "I am invested in Alphabet, Apple and Microsoft";

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // A missing .env file is fine, the variables may come from the environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = NewsRagConfig::from_env()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = if args.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        args.join(" ")
    };

    let client = connect(&config.store.uri).await?;
    let collection = client
        .database(&config.store.database)
        .collection::<NewsRecord>(&config.store.collection);

    let store = MongoDbNewsStore::new(collection.clone())
        .with_insert_batch_size(config.store.insert_batch_size);

    if config.store.create_index {
        store
            .create_vector_index(
                &config.pipeline.index_name,
                &config.pipeline.embedding_path,
                config.pipeline.embedding_dims,
            )
            .await?;
    }

    if config.store.skip_load {
        let documents = store.count().await?;
        tracing::info!(target: "newsrag",
            documents,
            "Skipping dataset load, querying the existing collection"
        );
    } else {
        let table = DatasetLoader::from_token(config.dataset.token()?)
            .load(&config.dataset.urls)
            .await?;
        store.replace_all(table.records()).await?;
    }

    let embedding_model = openai::Client::new(&config.credentials.openai_api_key).embedding_model(
        &config.pipeline.embedding_model,
        config.pipeline.embedding_dims,
    );
    let retriever = Retriever::new(
        embedding_model,
        MongoDbVectorIndex::new(collection),
        config.search_params()?,
    );

    let completion_model = anthropic::Client::new(&config.credentials.anthropic_api_key)
        .completion_model(&config.pipeline.completion_model);
    let answerer = Answerer::new(completion_model, retriever, &config.pipeline);

    let answer = answerer.answer(&query).await?;

    println!("Response: {}", answer.text);
    println!("\nSource Information: \n{}", answer.context);

    Ok(())
}
