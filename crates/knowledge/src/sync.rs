//! Reconciles the notes collection with the markdown files of a vault.
//!
//! A record is valid while a file with its title still exists in its scope
//! directory. Stale records are deleted, files without a valid record are
//! added. Running twice against an unchanged vault changes nothing.

use crate::chunk::dir_name;
use crate::ids::new_record_id;
use crate::images;
use crate::store::{Filter, Metadata, Record, VectorStore};
use noteweave_core::{AppError, AppResult};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A markdown file of the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultFile {
    pub path: PathBuf,
    /// Filename stem
    pub title: String,
    /// Containing directory
    pub scope: String,
}

/// Mutations performed by one sync.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncReport {
    pub files_seen: usize,
    pub records_seen: usize,
    /// Titles of deleted records
    pub deleted: Vec<String>,
    /// Titles of added records
    pub added: Vec<String>,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.added.is_empty()
    }
}

/// Metadata of a notes-collection record.
pub fn note_metadata(title: &str, scope: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("title".into(), Value::from(title));
    metadata.insert("vault_path".into(), Value::from(scope));
    metadata.insert("vault_dir".into(), Value::from(dir_name(scope)));
    metadata
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Absolute form of a vault root with trailing separators and `.` segments
/// removed. Scopes and `vault_path` values are always derived from it.
pub fn normalize_root(root: &Path) -> AppResult<PathBuf> {
    Ok(std::path::absolute(root)?.components().collect())
}

/// Every markdown file under `root` (hidden directories skipped) and the set
/// of directories visited, both spelled from the normalized root.
///
/// A missing root is an empty vault. Any other walk error aborts the scan.
pub fn scan_vault(root: &Path) -> AppResult<(Vec<VaultFile>, BTreeSet<String>)> {
    let root = normalize_root(root)?;
    let mut files = Vec::new();
    let mut scopes = BTreeSet::new();

    if !root.exists() {
        tracing::debug!("Vault {} does not exist yet", root.display());
        return Ok((files, scopes));
    }

    for entry in WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.map_err(|e| AppError::Vault(format!("Failed to scan vault: {}", e)))?;
        let path = entry.path();
        if entry.file_type().is_dir() {
            scopes.insert(path.to_string_lossy().into_owned());
            continue;
        }
        if path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("md"))
        {
            let scope = path
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            let title = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            files.push(VaultFile {
                path: path.to_path_buf(),
                title,
                scope,
            });
        }
    }

    Ok((files, scopes))
}

/// Bring the notes collection in line with the vault on disk.
///
/// The first store or read failure aborts the sync. Mutations already made
/// stay; a later run converges.
pub async fn sync(
    store: &dyn VectorStore,
    collection: &str,
    vault_root: &Path,
) -> AppResult<SyncReport> {
    let (files, scopes) = scan_vault(vault_root)?;
    let on_disk: HashSet<(&str, &str)> = files
        .iter()
        .map(|f| (f.scope.as_str(), f.title.as_str()))
        .collect();

    let filter = Filter::any_of("vault_path", scopes.iter().cloned());
    let records = store.get(collection, Some(&filter)).await?;

    let mut report = SyncReport {
        files_seen: files.len(),
        records_seen: records.len(),
        ..SyncReport::default()
    };

    let mut represented = HashSet::new();
    let mut stale = Vec::new();
    for record in &records {
        let title = record.meta_str("title").unwrap_or_default();
        let scope = record.meta_str("vault_path").unwrap_or_default();
        if on_disk.contains(&(scope, title)) {
            represented.insert((scope.to_string(), title.to_string()));
        } else {
            tracing::info!("DELETE: {} ({})", title, scope);
            stale.push(record.id.clone());
            report.deleted.push(title.to_string());
        }
    }

    if !stale.is_empty() {
        store.delete(collection, &stale).await?;
    }

    let mut additions = Vec::new();
    for file in &files {
        if represented.contains(&(file.scope.clone(), file.title.clone())) {
            continue;
        }
        let text = std::fs::read_to_string(&file.path)?;
        let (content, _) = images::tokenize(&text);
        tracing::info!("ADD: {} ({})", file.title, file.scope);
        additions.push(Record::new(
            new_record_id(),
            content,
            note_metadata(&file.title, &file.scope),
        ));
        report.added.push(file.title.clone());
    }

    if !additions.is_empty() {
        store.add(collection, additions).await?;
    }

    tracing::info!(
        "Vault sync: {} files, {} records, {} deleted, {} added",
        report.files_seen,
        report.records_seen,
        report.deleted.len(),
        report.added.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::trigram_store;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn test_scan_skips_hidden_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "a");
        write(dir.path(), "sub/b.md", "b");
        write(dir.path(), ".obsidian/c.md", "c");
        write(dir.path(), "sub/img.png", "x");

        let (files, scopes) = scan_vault(dir.path()).unwrap();
        let titles: Vec<_> = files.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(scopes.len(), 2);
        assert_eq!(files[1].scope, dir.path().join("sub").to_string_lossy());
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "alpha.md", "alpha body");
        write(dir.path(), "topic/beta.md", "beta body ![Image](data:x)");
        let store = trigram_store();

        let first = sync(&store, "notes", dir.path()).await.unwrap();
        assert_eq!(first.added.len(), 2);
        assert!(first.deleted.is_empty());

        let second = sync(&store, "notes", dir.path()).await.unwrap();
        assert!(second.is_noop());
        assert_eq!(second.records_seen, 2);
        assert_eq!(store.count("notes").unwrap(), 2);

        let beta = store
            .get("notes", Some(&Filter::eq("title", "beta")))
            .await
            .unwrap();
        assert_eq!(beta[0].meta_str("vault_dir"), Some("topic"));
        assert!(!beta[0].document.contains("data:x"));
    }

    #[tokio::test]
    async fn test_sync_removes_deleted_and_adds_new() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "old.md", "old");
        let store = trigram_store();
        sync(&store, "notes", dir.path()).await.unwrap();

        std::fs::remove_file(dir.path().join("old.md")).unwrap();
        write(dir.path(), "new.md", "new");
        let report = sync(&store, "notes", dir.path()).await.unwrap();

        assert_eq!(report.deleted, vec!["old".to_string()]);
        assert_eq!(report.added, vec!["new".to_string()]);
        assert_eq!(store.count("notes").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_same_title_in_other_scope_is_not_represented() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/note.md", "one");
        let store = trigram_store();
        sync(&store, "notes", dir.path()).await.unwrap();

        write(dir.path(), "b/note.md", "two");
        let report = sync(&store, "notes", dir.path()).await.unwrap();
        assert_eq!(report.added, vec!["note".to_string()]);
        assert!(report.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_root_spelling_does_not_change_scopes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "alpha.md", "alpha body");
        write(dir.path(), "sub/beta.md", "beta body");
        let store = trigram_store();
        let slashed = PathBuf::from(format!("{}/", dir.path().display()));

        let first = sync(&store, "notes", &slashed).await.unwrap();
        assert_eq!(first.added.len(), 2);

        let second = sync(&store, "notes", &slashed).await.unwrap();
        assert!(second.is_noop());
        assert_eq!(second.records_seen, 2);

        let dotted = dir.path().join(".");
        assert!(sync(&store, "notes", &dotted).await.unwrap().is_noop());
        assert!(sync(&store, "notes", dir.path()).await.unwrap().is_noop());
        assert_eq!(store.count("notes").unwrap(), 2);

        let alpha = store
            .get("notes", Some(&Filter::eq("title", "alpha")))
            .await
            .unwrap();
        assert_eq!(
            alpha[0].meta_str("vault_path"),
            Some(dir.path().to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_markdown_extension_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Upper.MD", "u");
        write(dir.path(), "lower.md", "l");
        write(dir.path(), "other.txt", "o");

        let (files, _) = scan_vault(dir.path()).unwrap();
        let titles: Vec<_> = files.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Upper", "lower"]);
    }

    #[tokio::test]
    async fn test_missing_vault_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = trigram_store();
        let report = sync(&store, "notes", &dir.path().join("absent")).await.unwrap();
        assert!(report.is_noop());
        assert_eq!(report.files_seen, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_directory_aborts_before_deleting() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "sub/kept.md", "kept body");
        let store = trigram_store();
        sync(&store, "notes", dir.path()).await.unwrap();

        let sub = dir.path().join("sub");
        std::fs::set_permissions(&sub, std::fs::Permissions::from_mode(0o000)).unwrap();
        let readable = std::fs::read_dir(&sub).is_ok();
        let result = sync(&store, "notes", dir.path()).await;
        std::fs::set_permissions(&sub, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Permission bits do not bind a privileged user.
        if readable {
            return;
        }
        assert!(matches!(result, Err(AppError::Vault(_))));
        assert_eq!(store.count("notes").unwrap(), 1);
    }
}
