//! SQLite-backed vector store with a brute-force cosine scan.

use super::{cosine_distance, Filter, Metadata, QueryHit, Record, VectorStore};
use crate::embeddings::EmbeddingProvider;
use noteweave_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Vector store persisted in a single SQLite file.
///
/// The connection sits behind a mutex that is never held across an await:
/// embeddings are computed first, then the lock is taken for the write.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SqliteStore {
    /// Open (or create) the store at `db_path`.
    pub fn open(db_path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Store(format!("Failed to create store directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Store(format!("Failed to open SQLite store: {}", e)))?;
        let store = Self::with_connection(conn, embedder)?;

        tracing::debug!("Opened SQLite store at {:?}", db_path);
        Ok(store)
    }

    /// A throwaway store that lives only as long as the value.
    pub fn in_memory(embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Store(format!("Failed to open in-memory store: {}", e)))?;
        Self::with_connection(conn, embedder)
    }

    fn with_connection(conn: Connection, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                document TEXT NOT NULL,
                embedding BLOB NOT NULL,
                metadata TEXT NOT NULL,
                UNIQUE (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);
            "#,
        )
        .map_err(|e| AppError::Store(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Store("Store connection lock poisoned".to_string()))
    }

    /// Number of records in a collection.
    pub fn count(&self, collection: &str) -> AppResult<usize> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![collection],
            |row| row.get::<_, i64>(0),
        )
        .map(|n| n as usize)
        .map_err(|e| AppError::Store(format!("Failed to count records: {}", e)))
    }

    fn load(&self, collection: &str) -> AppResult<Vec<(Record, Vec<f32>)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, document, embedding, metadata FROM records
                 WHERE collection = ?1 ORDER BY seq",
            )
            .map_err(|e| AppError::Store(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| AppError::Store(format!("Failed to query records: {}", e)))?;

        let mut out = Vec::new();
        for row in rows {
            let (id, document, embedding, metadata) =
                row.map_err(|e| AppError::Store(format!("Failed to read record: {}", e)))?;
            let metadata: Metadata = serde_json::from_str(&metadata)?;
            out.push((
                Record {
                    id,
                    document,
                    metadata,
                },
                bytes_to_embedding(&embedding)?,
            ));
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl VectorStore for SqliteStore {
    async fn add(&self, collection: &str, records: Vec<Record>) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let documents: Vec<String> = records.iter().map(|r| r.document.clone()).collect();
        let embeddings = self.embedder.embed_batch(&documents).await?;
        if embeddings.len() != records.len() {
            return Err(AppError::Store(format!(
                "Embedder returned {} vectors for {} records",
                embeddings.len(),
                records.len()
            )));
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Store(format!("Failed to begin transaction: {}", e)))?;

        for (record, embedding) in records.iter().zip(embeddings.iter()) {
            let metadata_json = serde_json::to_string(&record.metadata)?;
            tx.execute(
                "INSERT INTO records (collection, id, document, embedding, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (collection, id) DO UPDATE SET
                    document = excluded.document,
                    embedding = excluded.embedding,
                    metadata = excluded.metadata",
                params![
                    collection,
                    record.id,
                    record.document,
                    embedding_to_bytes(embedding),
                    metadata_json,
                ],
            )
            .map_err(|e| AppError::Store(format!("Failed to insert record: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Store(format!("Failed to commit records: {}", e)))?;

        tracing::debug!("Added {} records to '{}'", records.len(), collection);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        text: &str,
        k: usize,
        filter: Option<&Filter>,
        max_distance: Option<f32>,
    ) -> AppResult<Vec<QueryHit>> {
        let query_embedding = self.embedder.embed(text).await?;

        let mut hits: Vec<QueryHit> = self
            .load(collection)?
            .into_iter()
            .filter(|(record, _)| filter.map_or(true, |f| f.matches(&record.metadata)))
            .map(|(record, embedding)| QueryHit {
                distance: cosine_distance(&query_embedding, &embedding),
                record,
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        if let Some(max) = max_distance {
            hits.retain(|hit| hit.distance <= max);
        }

        tracing::debug!(
            "Retrieved {} records from '{}' (requested top-{})",
            hits.len(),
            collection,
            k
        );
        Ok(hits)
    }

    async fn get(&self, collection: &str, filter: Option<&Filter>) -> AppResult<Vec<Record>> {
        Ok(self
            .load(collection)?
            .into_iter()
            .map(|(record, _)| record)
            .filter(|record| filter.map_or(true, |f| f.matches(&record.metadata)))
            .collect())
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> AppResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Store(format!("Failed to begin transaction: {}", e)))?;

        let mut deleted = 0;
        for id in ids {
            deleted += tx
                .execute(
                    "DELETE FROM records WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                )
                .map_err(|e| AppError::Store(format!("Failed to delete record: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Store(format!("Failed to commit deletion: {}", e)))?;

        tracing::debug!("Deleted {} records from '{}'", deleted, collection);
        Ok(deleted)
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Store("Invalid embedding bytes length".to_string()));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedEmbedder;
    use serde_json::json;
    use tempfile::TempDir;

    fn meta(value: serde_json::Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    fn axis_store() -> SqliteStore {
        let embedder = FixedEmbedder::new(2)
            .with("east", vec![1.0, 0.0])
            .with("north", vec![0.0, 1.0])
            .with("west", vec![-1.0, 0.0])
            .with("northeast", vec![1.0, 1.0]);
        SqliteStore::in_memory(Arc::new(embedder)).unwrap()
    }

    async fn seed(store: &SqliteStore) {
        store
            .add(
                "c",
                vec![
                    Record::new("1", "north", meta(json!({"vault_path": "/a"}))),
                    Record::new("2", "west", meta(json!({"vault_path": "/a"}))),
                    Record::new("3", "northeast", meta(json!({"vault_path": "/b"}))),
                ],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_query_orders_by_distance() {
        let store = axis_store();
        seed(&store).await;

        let hits = store.query("c", "east", 10, None, None).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.record.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[tokio::test]
    async fn test_max_distance_is_inclusive() {
        let store = axis_store();
        seed(&store).await;

        // "north" sits at exactly distance 1.0 from "east"
        let hits = store.query("c", "east", 10, None, Some(1.0)).await.unwrap();
        assert!(hits.iter().any(|h| h.record.id == "1"));
        assert!(hits.iter().all(|h| h.record.id != "2"));

        let hits = store.query("c", "east", 10, None, Some(0.999)).await.unwrap();
        assert!(hits.iter().all(|h| h.record.id != "1"));
    }

    #[tokio::test]
    async fn test_top_k_applies_before_distance() {
        let store = axis_store();
        seed(&store).await;

        let hits = store.query("c", "east", 1, None, Some(2.0)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.id, "3");
    }

    #[tokio::test]
    async fn test_filter_scopes_query_and_get() {
        let store = axis_store();
        seed(&store).await;

        let scope = Filter::eq("vault_path", "/a");
        let hits = store.query("c", "east", 10, Some(&scope), None).await.unwrap();
        assert_eq!(hits.len(), 2);

        let all = store.get("c", Some(&Filter::any_of("vault_path", ["/b"]))).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "3");
    }

    #[tokio::test]
    async fn test_collections_are_isolated_and_delete_counts() {
        let store = axis_store();
        seed(&store).await;
        store
            .add("other", vec![Record::new("1", "east", Metadata::new())])
            .await
            .unwrap();

        let deleted = store
            .delete("c", &["1".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count("c").unwrap(), 2);
        assert_eq!(store.count("other").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/store.sqlite");
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(FixedEmbedder::new(2));

        {
            let store = SqliteStore::open(&path, embedder.clone()).unwrap();
            store
                .add("c", vec![Record::new("x", "doc", meta(json!({"title": "T"})))])
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path, embedder).unwrap();
        let records = store.get("c", None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].meta_str("title"), Some("T"));
    }

    #[test]
    fn test_embedding_bytes_round_trip() {
        let v = vec![0.5, -1.25, 3.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&v)).unwrap(), v);
        assert!(bytes_to_embedding(&[0, 1, 2]).is_err());
    }
}
