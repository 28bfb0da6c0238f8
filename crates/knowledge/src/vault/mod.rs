//! Vault parsing and wikilink resolution.
//!
//! Notes are keyed by their vault-relative path without `.md`, using `/` as
//! the separator. A link resolves by path when it contains `/`, otherwise by
//! title. Among several notes sharing a title the pick is, in order: the note
//! in the linking note's folder, the shortest key, the lexically first key.

pub mod parser;

pub use parser::{parse_markdown, ParsedNote};

use crate::sync::{normalize_root, scan_vault};
use noteweave_core::AppResult;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Parsed notes by note key.
pub type Notes = BTreeMap<String, ParsedNote>;

/// Title and key index of a vault.
#[derive(Debug, Default, Clone)]
pub struct VaultIndex {
    titles: HashMap<String, Vec<String>>,
    keys: BTreeSet<String>,
}

impl VaultIndex {
    pub fn insert(&mut self, key: &str) {
        let title = key.rsplit('/').next().unwrap_or(key);
        self.titles
            .entry(title.to_string())
            .or_default()
            .push(key.to_string());
        self.keys.insert(key.to_string());
    }

    /// Resolve a raw link written in the note `from`.
    pub fn resolve(&self, link: &str, from: &str) -> Option<String> {
        let target = link.split('|').next().unwrap_or_default();
        let target = target.split('#').next().unwrap_or_default().trim();
        if target.is_empty() {
            return None;
        }

        if target.contains('/') {
            let target = target.strip_suffix(".md").unwrap_or(target);
            return self.keys.get(target).cloned();
        }

        let candidates = self.titles.get(target)?;
        if let [only] = candidates.as_slice() {
            return Some(only.clone());
        }

        let folder = folder_of(from);
        if let Some(local) = candidates.iter().find(|c| folder_of(c) == folder) {
            return Some(local.clone());
        }
        candidates
            .iter()
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .cloned()
    }
}

fn folder_of(key: &str) -> &str {
    key.rsplit_once('/').map(|(folder, _)| folder).unwrap_or("")
}

/// Note key of `path` relative to `root`.
pub fn note_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?.with_extension("");
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Parse every note under `root` and resolve its wikilinks.
pub fn parse_vault(root: &Path) -> AppResult<Notes> {
    let root = normalize_root(root)?;
    let (files, _) = scan_vault(&root)?;

    let mut index = VaultIndex::default();
    let keyed: Vec<_> = files
        .iter()
        .filter_map(|f| note_key(&root, &f.path).map(|key| (key, &f.path)))
        .collect();
    for (key, _) in &keyed {
        index.insert(key);
    }

    let mut notes = Notes::new();
    for (key, path) in keyed {
        let text = std::fs::read_to_string(path)?;
        let mut note = parse_markdown(&text);
        for link in &note.wikilinks {
            let resolved = index.resolve(link, &key);
            if resolved.is_none() {
                tracing::debug!("Dangling wikilink in {}: [[{}]]", key, link);
            }
            note.resolved_wikilinks.insert(link.clone(), resolved);
        }
        notes.insert(key, note);
    }

    tracing::info!("Parsed {} notes from {}", notes.len(), root.display());
    Ok(notes)
}
