//! Source collection and ingestion into the chunk collection.

use crate::chunk::{split_markdown, Chunk, SplitOptions};
use crate::ids::new_record_id;
use crate::store::VectorStore;
use crate::sync::normalize_root;
use noteweave_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions the original document converter accepted but this build does not.
const UNSUPPORTED_EXTENSIONS: &[&str] = &["pdf", "pptx"];

/// Files found under a source path.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SourceFiles {
    pub markdown: Vec<PathBuf>,
    pub unsupported: Vec<PathBuf>,
}

/// Collect source documents from a file or a directory tree, sorted by path.
pub fn collect_sources(path: &Path) -> AppResult<SourceFiles> {
    let mut files = SourceFiles::default();

    if path.is_file() {
        classify(path, &mut files);
        return Ok(files);
    }
    if !path.is_dir() {
        return Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Source path not found: {}", path.display()),
        )));
    }

    for entry in WalkDir::new(path)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            AppError::Io(std::io::Error::other(format!("Failed to scan sources: {}", e)))
        })?;
        if entry.file_type().is_file() {
            classify(entry.path(), &mut files);
        }
    }

    for skipped in &files.unsupported {
        tracing::warn!("Unsupported source format, skipping: {}", skipped.display());
    }
    Ok(files)
}

fn classify(path: &Path, files: &mut SourceFiles) {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext == "md" {
        files.markdown.push(path.to_path_buf());
    } else if UNSUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        files.unsupported.push(path.to_path_buf());
    }
}

/// Read a markdown document, split it and add its chunks to `collection`.
pub async fn ingest_document(
    store: &dyn VectorStore,
    collection: &str,
    path: &Path,
    vault: &Path,
    options: &SplitOptions,
) -> AppResult<Vec<Chunk>> {
    tracing::debug!("Ingesting document: {:?}", path);

    let text = std::fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let vault = normalize_root(vault)?;
    let chunks = split_markdown(&text, &filename, &vault.to_string_lossy(), options);
    if chunks.is_empty() {
        tracing::warn!("No usable chunks in {}", filename);
        return Ok(chunks);
    }

    let records = chunks.iter().map(|c| c.to_record(new_record_id())).collect();
    store.add(collection, records).await?;

    tracing::info!("Added {} chunks of {} to '{}'", chunks.len(), filename, collection);
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Filter;
    use crate::testing::trigram_store;
    use tempfile::TempDir;

    #[test]
    fn test_collect_sources_classifies() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.md"), "b").unwrap();
        std::fs::write(dir.path().join("a.md"), "a").unwrap();
        std::fs::write(dir.path().join("slides.pptx"), "x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = collect_sources(dir.path()).unwrap();
        assert_eq!(
            files.markdown,
            vec![dir.path().join("a.md"), dir.path().join("b.md")]
        );
        assert_eq!(files.unsupported, vec![dir.path().join("slides.pptx")]);
    }

    #[test]
    fn test_collect_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        assert!(collect_sources(&dir.path().join("absent")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_unreadable_directory_fails() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("a.md"), "a").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        let readable = std::fs::read_dir(&locked).is_ok();
        let result = collect_sources(dir.path());
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        if !readable {
            assert!(result.is_err());
        }
    }

    #[tokio::test]
    async fn test_ingest_adds_chunk_records() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("paper.md");
        let body = vec!["synapse"; 30].join(" ");
        std::fs::write(&doc, format!("# One\n{}\n# Two\n{}", body, body)).unwrap();

        let store = trigram_store();
        let vault = dir.path().join("vault");
        let chunks = ingest_document(&store, "chunks", &doc, &vault, &SplitOptions::default())
            .await
            .unwrap();

        assert_eq!(chunks.len(), 2);
        let stored = store
            .get("chunks", Some(&Filter::eq("filename", "paper.md")))
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].meta_str("vault_dir"), Some("vault"));
    }
}
