//! Pipeline configuration.
//!
//! Every tunable of the pipeline lives in a [NewsRagConfig] which is handed to each component
//! explicitly. [NewsRagConfig::from_env] fills it from environment variables on top of the
//! defaults below.

use std::str::FromStr;

use crate::{
    answer::DEFAULT_SYSTEM_INSTRUCTION,
    providers::{anthropic, openai},
    vector_store::{SearchParams, VectorStoreError},
};

/// The first shard of the pre-embedded tech news dataset.
pub const DEFAULT_PARQUET_URL: &str = "https://huggingface.co/api/datasets/AIatMongoDB/tech-news-embeddings/parquet/default/train/0000.parquet";
pub const DEFAULT_DATABASE: &str = "tech_news";
pub const DEFAULT_COLLECTION: &str = "hacker_noon_tech_news";
pub const DEFAULT_INDEX_NAME: &str = "vector_index";
pub const DEFAULT_EMBEDDING_PATH: &str = "embedding";
pub const DEFAULT_EMBEDDING_DIMS: usize = 256;
pub const DEFAULT_MAX_TOKENS: u64 = 1024;
pub const DEFAULT_NUM_CANDIDATES: u32 = 150;
pub const DEFAULT_LIMIT: u32 = 5;
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Model and search settings.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub embedding_model: String,
    pub embedding_dims: usize,
    pub completion_model: String,
    pub max_tokens: u64,
    pub system_instruction: String,
    /// Size of the candidate pool considered by the approximate search
    pub num_candidates: u32,
    /// Maximum number of results returned per query
    pub limit: u32,
    pub index_name: String,
    /// Field holding the vector in stored documents
    pub embedding_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            embedding_model: openai::TEXT_EMBEDDING_3_SMALL.to_string(),
            embedding_dims: DEFAULT_EMBEDDING_DIMS,
            completion_model: anthropic::CLAUDE_3_OPUS.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            num_candidates: DEFAULT_NUM_CANDIDATES,
            limit: DEFAULT_LIMIT,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            embedding_path: DEFAULT_EMBEDDING_PATH.to_string(),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct DatasetConfig {
    pub urls: Vec<String>,
    /// Bearer token sent with every download. Only required when the dataset is loaded.
    pub token: Option<String>,
}

impl DatasetConfig {
    /// The download token, or [ConfigError::Missing] when it is not set.
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.token.as_deref().ok_or(ConfigError::Missing("HF_TOKEN"))
    }
}

impl std::fmt::Debug for DatasetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetConfig")
            .field("urls", &self.urls)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

#[derive(Clone, PartialEq)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub insert_batch_size: usize,
    /// Create the vector search index before loading
    pub create_index: bool,
    /// Query the collection as is, without reloading it
    pub skip_load: bool,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // connection strings routinely embed credentials
        f.debug_struct("StoreConfig")
            .field("uri", &"<REDACTED>")
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("insert_batch_size", &self.insert_batch_size)
            .field("create_index", &self.create_index)
            .field("skip_load", &self.skip_load)
            .finish()
    }
}

#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub openai_api_key: String,
    pub anthropic_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"<REDACTED>")
            .field("anthropic_api_key", &"<REDACTED>")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewsRagConfig {
    pub pipeline: PipelineConfig,
    pub dataset: DatasetConfig,
    pub store: StoreConfig,
    pub credentials: Credentials,
}

impl NewsRagConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Unset and blank values fall back to
    /// the defaults; credentials have none.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            embedding_model: get("NEWSRAG_EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_dims: parse_or(&get, "NEWSRAG_EMBEDDING_DIMS", defaults.embedding_dims)?,
            completion_model: get("NEWSRAG_COMPLETION_MODEL").unwrap_or(defaults.completion_model),
            max_tokens: parse_or(&get, "NEWSRAG_MAX_TOKENS", defaults.max_tokens)?,
            system_instruction: defaults.system_instruction,
            num_candidates: parse_or(&get, "NEWSRAG_NUM_CANDIDATES", defaults.num_candidates)?,
            limit: parse_or(&get, "NEWSRAG_LIMIT", defaults.limit)?,
            index_name: get("NEWSRAG_INDEX").unwrap_or(defaults.index_name),
            embedding_path: defaults.embedding_path,
        };

        let urls = match get("NEWSRAG_PARQUET_URLS") {
            Some(urls) => urls
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect(),
            None => vec![DEFAULT_PARQUET_URL.to_string()],
        };

        let config = Self {
            pipeline,
            dataset: DatasetConfig {
                urls,
                token: get("HF_TOKEN"),
            },
            store: StoreConfig {
                uri: required("MONGODB_URI")?,
                database: get("NEWSRAG_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                collection: get("NEWSRAG_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
                insert_batch_size: parse_or(&get, "NEWSRAG_BATCH_SIZE", DEFAULT_INSERT_BATCH_SIZE)?,
                create_index: parse_or(&get, "NEWSRAG_CREATE_INDEX", Flag(false))?.0,
                skip_load: parse_or(&get, "NEWSRAG_SKIP_LOAD", Flag(false))?.0,
            },
            credentials: Credentials {
                openai_api_key: required("OPENAI_API_KEY")?,
                anthropic_api_key: required("ANTHROPIC_API_KEY")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.embedding_dims == 0 {
            return Err(ConfigError::Invalid {
                key: "NEWSRAG_EMBEDDING_DIMS",
                reason: "must be greater than zero".into(),
            });
        }
        if self.store.insert_batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "NEWSRAG_BATCH_SIZE",
                reason: "must be greater than zero".into(),
            });
        }
        if !self.store.skip_load {
            self.dataset.token()?;
        }
        if self.dataset.urls.is_empty() {
            return Err(ConfigError::Invalid {
                key: "NEWSRAG_PARQUET_URLS",
                reason: "no URL given".into(),
            });
        }
        if self.pipeline.limit == 0 {
            return Err(ConfigError::Invalid {
                key: "NEWSRAG_LIMIT",
                reason: "must be greater than zero".into(),
            });
        }
        self.search_params().map_err(|err| ConfigError::Invalid {
            key: "NEWSRAG_NUM_CANDIDATES",
            reason: err.to_string(),
        })?;
        Ok(())
    }

    /// Search parameters for the configured index.
    pub fn search_params(&self) -> Result<SearchParams, VectorStoreError> {
        SearchParams::new(
            &self.pipeline.index_name,
            &self.pipeline.embedding_path,
            self.pipeline.num_candidates,
            self.pipeline.limit,
        )
    }
}

fn parse_or<T>(
    get: impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(value) => value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
            key,
            reason: err.to_string(),
        }),
        None => Ok(default),
    }
}

/// Boolean switch accepting `true`/`false`, `yes`/`no` and `1`/`0`.
struct Flag(bool);

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(Flag(true)),
            "0" | "false" | "no" => Ok(Flag(false)),
            other => Err(format!("expected a boolean, got `{other}`")),
        }
    }
}
