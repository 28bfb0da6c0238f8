//! Vector/document store abstraction.
//!
//! Records live in named collections. Each record carries a document, a flat
//! JSON metadata map and an embedding of the document computed on insert.

pub mod sqlite;

pub use sqlite::SqliteStore;

use noteweave_core::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata attached to a record.
pub type Metadata = Map<String, Value>;

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
}

impl Record {
    pub fn new(id: impl Into<String>, document: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            document: document.into(),
            metadata,
        }
    }

    /// String value of a metadata key.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// A query result with its cosine distance to the query text.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub record: Record,
    pub distance: f32,
}

/// Metadata predicate over string-valued keys.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, String),
    In(String, Vec<String>),
}

impl Filter {
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq(key.into(), value.into())
    }

    pub fn any_of<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::In(key.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            Filter::Eq(key, value) => {
                metadata.get(key).and_then(Value::as_str) == Some(value.as_str())
            }
            Filter::In(key, values) => metadata
                .get(key)
                .and_then(Value::as_str)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
        }
    }
}

/// Collection-scoped vector store.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and insert records; an existing id is overwritten.
    async fn add(&self, collection: &str, records: Vec<Record>) -> AppResult<()>;

    /// The `k` nearest records to `text` among those passing `filter`,
    /// nearest first, then restricted to `distance <= max_distance`.
    async fn query(
        &self,
        collection: &str,
        text: &str,
        k: usize,
        filter: Option<&Filter>,
        max_distance: Option<f32>,
    ) -> AppResult<Vec<QueryHit>>;

    /// Every record passing `filter`, in insertion order.
    async fn get(&self, collection: &str, filter: Option<&Filter>) -> AppResult<Vec<Record>>;

    /// Delete records by id, returning how many existed.
    async fn delete(&self, collection: &str, ids: &[String]) -> AppResult<usize>;
}

/// Cosine distance `1 - cos(a, b)`; `1.0` when either vector is zero or the
/// lengths differ.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 1.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot_product / (norm_a * norm_b)
}
