//! Maintenance of the chunk collection.

use crate::store::{Filter, VectorStore};
use noteweave_core::AppResult;
use std::collections::BTreeSet;

/// Distinct source filenames with chunks in `collection`, sorted.
pub async fn list_sources(store: &dyn VectorStore, collection: &str) -> AppResult<Vec<String>> {
    let records = store.get(collection, None).await?;
    let names: BTreeSet<String> = records
        .iter()
        .filter_map(|r| r.meta_str("filename"))
        .map(str::to_string)
        .collect();
    Ok(names.into_iter().collect())
}

/// Delete every chunk of `filename`, returning how many were removed.
pub async fn delete_source(
    store: &dyn VectorStore,
    collection: &str,
    filename: &str,
) -> AppResult<usize> {
    let records = store
        .get(collection, Some(&Filter::eq("filename", filename)))
        .await?;
    tracing::info!("Deleting {} chunks for {}", records.len(), filename);
    if records.is_empty() {
        return Ok(0);
    }

    let ids: Vec<String> = records.into_iter().map(|r| r.id).collect();
    store.delete(collection, &ids).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Metadata, Record};
    use crate::testing::trigram_store;
    use serde_json::Value;

    fn chunk(id: &str, filename: &str) -> Record {
        let mut metadata = Metadata::new();
        metadata.insert("filename".into(), Value::from(filename));
        Record::new(id, format!("text of {}", id), metadata)
    }

    #[tokio::test]
    async fn test_list_and_delete_sources() {
        let store = trigram_store();
        store
            .add(
                "chunks",
                vec![chunk("1", "b.md"), chunk("2", "a.md"), chunk("3", "b.md")],
            )
            .await
            .unwrap();

        assert_eq!(list_sources(&store, "chunks").await.unwrap(), vec!["a.md", "b.md"]);
        assert_eq!(delete_source(&store, "chunks", "b.md").await.unwrap(), 2);
        assert_eq!(delete_source(&store, "chunks", "b.md").await.unwrap(), 0);
        assert_eq!(list_sources(&store, "chunks").await.unwrap(), vec!["a.md"]);
    }
}
