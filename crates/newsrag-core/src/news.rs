//! News records as they come out of the dataset and as they come back from a vector search.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Placeholder used in the answer context for fields a record does not carry.
pub const MISSING_FIELD: &str = "N/A";

/// Fields that never leave the store in a [SearchResult].
pub const HIDDEN_FIELDS: [&str; 2] = ["_id", "embedding"];

/// One article of the news dataset.
///
/// Columns the pipeline does not use explicitly are kept in `extra` so that loading the table into
/// a document store preserves every column of the source files.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct NewsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "companyName", default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(rename = "companyUrl", default, skip_serializing_if = "Option::is_none")]
    pub company_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Embedding of the article. An empty vector means the source row had no embedding.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub embedding: Vec<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<f64>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A [NewsRecord] returned by a vector search: no embedding, no store id, plus the similarity
/// score computed by the store. Scores only make sense relative to each other.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "companyName", default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(rename = "companyUrl", default, skip_serializing_if = "Option::is_none")]
    pub company_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub score: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    /// Build a search result from a stored record, dropping its embedding.
    pub fn from_record(record: &NewsRecord, score: f64) -> Self {
        let mut extra = record.extra.clone();
        for field in HIDDEN_FIELDS {
            extra.remove(field);
        }

        Self {
            title: record.title.clone(),
            company_name: record.company_name.clone(),
            company_url: record.company_url.clone(),
            published_at: record.published_at.clone(),
            url: record.url.clone(),
            description: record.description.clone(),
            score,
            extra,
        }
    }

    /// Render the result as one line of answer context.
    pub fn context_line(&self) -> String {
        format!(
            "Title: {}, Company Name: {}, Company URL: {}, Date Published: {}, Article URL: {}, Description: {}, \n",
            or_missing(&self.title),
            or_missing(&self.company_name),
            or_missing(&self.company_url),
            or_missing(&self.published_at),
            or_missing(&self.url),
            or_missing(&self.description),
        )
    }
}

fn or_missing(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or(MISSING_FIELD)
}
