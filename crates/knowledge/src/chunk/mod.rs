//! Header-bounded markdown chunking.
//!
//! A document splits at every `#`, `##` or `###` line outside fenced code.
//! Headers stay in the chunk text, and each chunk remembers the header
//! active at each level.

pub mod headers;

pub use headers::is_skipped_header;

use crate::ids::content_hash;
use crate::images::{self, ImageRefs};
use crate::store::{Metadata, Record};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Metadata key of the embedded-image map on chunk records.
pub const IMAGES_KEY: &str = "images";

const HEADER_LEVELS: usize = 3;

/// A header-bounded excerpt of a source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Chunk text with images replaced by tokens
    pub text: String,
    /// "Header 1".."Header 3" to header text
    pub headers: BTreeMap<String, String>,
    pub source_filename: String,
    /// Vault directory the chunk is scoped to
    pub vault_path: String,
    pub image_refs: ImageRefs,
}

impl Chunk {
    /// Deduplication key.
    pub fn hash(&self) -> String {
        content_hash(&self.text)
    }

    /// Turn the chunk into a chunk-collection record.
    pub fn to_record(&self, id: String) -> Record {
        let mut metadata = Metadata::new();
        metadata.insert("filename".into(), Value::from(self.source_filename.clone()));
        metadata.insert("vault_path".into(), Value::from(self.vault_path.clone()));
        metadata.insert("vault_dir".into(), Value::from(dir_name(&self.vault_path)));
        for (key, header) in &self.headers {
            metadata.insert(key.clone(), Value::from(header.clone()));
        }
        if !self.image_refs.is_empty() {
            let refs = self
                .image_refs
                .iter()
                .map(|(token, markup)| (token.clone(), Value::from(markup.clone())))
                .collect();
            metadata.insert(IMAGES_KEY.into(), Value::Object(refs));
        }
        Record::new(id, self.text.clone(), metadata)
    }
}

/// Image references stored on a chunk record.
pub fn image_refs_of(metadata: &Metadata) -> ImageRefs {
    metadata
        .get(IMAGES_KEY)
        .and_then(Value::as_object)
        .map(|refs| {
            refs.iter()
                .filter_map(|(token, markup)| Some((token.clone(), markup.as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Last path component of a vault directory, as stored in `vault_dir`.
pub fn dir_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Chunking options.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Chunks with fewer space-separated words are dropped
    pub min_words: usize,
    /// Drop chunks under back-matter headers
    pub filter_on_headers: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            min_words: 20,
            filter_on_headers: false,
        }
    }
}

/// Split a markdown document into chunks.
pub fn split_markdown(
    text: &str,
    filename: &str,
    vault_path: &str,
    options: &SplitOptions,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut active: [Option<String>; HEADER_LEVELS] = Default::default();
    let mut current: Vec<&str> = Vec::new();
    let mut current_headers = BTreeMap::new();
    let mut in_fence = false;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }

        let header = if in_fence { None } else { parse_header(trimmed) };
        if let Some((level, title)) = header {
            flush(&mut chunks, &mut current, &current_headers, filename, vault_path);

            active[level - 1] = Some(title.to_string());
            for deeper in active.iter_mut().skip(level) {
                *deeper = None;
            }
            current_headers = header_map(&active);
        }
        current.push(line);
    }
    flush(&mut chunks, &mut current, &current_headers, filename, vault_path);

    let before = chunks.len();
    chunks.retain(|c| c.text.split(' ').count() >= options.min_words);
    if chunks.len() < before {
        tracing::debug!(
            "Dropped {} chunks of {} under {} words",
            before - chunks.len(),
            filename,
            options.min_words
        );
    }

    if options.filter_on_headers {
        chunks.retain(|c| {
            let skip = c.headers.values().find(|h| is_skipped_header(h));
            if let Some(header) = skip {
                tracing::info!("Dropping chunk under header: {}", header);
            }
            skip.is_none()
        });
    }

    for chunk in &mut chunks {
        let (text, refs) = images::tokenize(&chunk.text);
        chunk.text = text;
        chunk.image_refs = refs;
    }

    tracing::info!("Got {} chunks for {}", chunks.len(), filename);
    chunks
}

fn parse_header(line: &str) -> Option<(usize, &str)> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > HEADER_LEVELS {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let title = rest.trim();
    (!title.is_empty()).then_some((hashes, title))
}

fn header_map(active: &[Option<String>; HEADER_LEVELS]) -> BTreeMap<String, String> {
    active
        .iter()
        .enumerate()
        .filter_map(|(i, h)| h.as_ref().map(|h| (format!("Header {}", i + 1), h.clone())))
        .collect()
}

fn flush(
    chunks: &mut Vec<Chunk>,
    lines: &mut Vec<&str>,
    headers: &BTreeMap<String, String>,
    filename: &str,
    vault_path: &str,
) {
    let text = lines.join("\n").trim().to_string();
    lines.clear();
    if text.is_empty() {
        return;
    }
    chunks.push(Chunk {
        text,
        headers: headers.clone(),
        source_filename: filename.to_string(),
        vault_path: vault_path.to_string(),
        image_refs: ImageRefs::new(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, word: &str) -> String {
        vec![word; n].join(" ")
    }

    fn opts(min_words: usize) -> SplitOptions {
        SplitOptions {
            min_words,
            filter_on_headers: false,
        }
    }

    #[test]
    fn test_splits_on_three_levels_and_tracks_path() {
        let doc = format!(
            "# Paper\nintro text\n## Methods\n{}\n### Mice\nmice text\n## Results\nresult text",
            words(3, "method")
        );
        let chunks = split_markdown(&doc, "paper.md", "/vault", &opts(1));

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].text, "# Paper\nintro text");
        assert_eq!(chunks[2].headers.get("Header 1").map(String::as_str), Some("Paper"));
        assert_eq!(chunks[2].headers.get("Header 2").map(String::as_str), Some("Methods"));
        assert_eq!(chunks[2].headers.get("Header 3").map(String::as_str), Some("Mice"));
        // A new level-2 header clears level 3
        assert!(chunks[3].headers.get("Header 3").is_none());
        assert_eq!(chunks[3].headers.get("Header 2").map(String::as_str), Some("Results"));
    }

    #[test]
    fn test_fenced_code_and_deep_headers_do_not_split() {
        let doc = "# Code\n```\n# not a header\n```\n#### deep\n#nospace";
        let chunks = split_markdown(doc, "c.md", "/v", &opts(1));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.ends_with("#nospace"));
    }

    #[test]
    fn test_short_chunks_dropped() {
        let doc = format!("# Short\ntoo few words\n# Long\n{}", words(25, "cortex"));
        let chunks = split_markdown(&doc, "d.md", "/v", &opts(20));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.starts_with("# Long"));
    }

    #[test]
    fn test_header_filter() {
        let doc = format!(
            "# Findings\n{}\n# References\n{}",
            words(25, "neuron"),
            words(25, "citation")
        );
        let filtered = split_markdown(
            &doc,
            "d.md",
            "/v",
            &SplitOptions {
                min_words: 20,
                filter_on_headers: true,
            },
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(split_markdown(&doc, "d.md", "/v", &opts(20)).len(), 2);
    }

    #[test]
    fn test_images_tokenized_and_recorded() {
        let doc = format!("# Figures\n{} ![Image](data:image/png;base64,QQ==)", words(25, "axon"));
        let chunks = split_markdown(&doc, "f.md", "/vault/sub", &opts(20));
        let chunk = &chunks[0];
        assert_eq!(chunk.image_refs.len(), 1);
        assert!(!chunk.text.contains("base64"));

        let record = chunk.to_record("id-1".to_string());
        assert_eq!(record.meta_str("filename"), Some("f.md"));
        assert_eq!(record.meta_str("vault_dir"), Some("sub"));
        assert_eq!(record.meta_str("Header 1"), Some("Figures"));
        assert_eq!(image_refs_of(&record.metadata), chunk.image_refs);
    }
}
