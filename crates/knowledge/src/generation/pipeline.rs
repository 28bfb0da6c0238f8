//! Split, retrieve, generate, link and persist.

use super::format::{finish_note, note_head, source_names};
use super::parse::{parse_reply, GeneratedNote, ParseOutcome};
use super::persist::write_note;
use crate::chunk::{image_refs_of, Chunk, SplitOptions};
use crate::ids::{content_hash, new_record_id};
use crate::images::{self, ImageRefs};
use crate::ingest::{collect_sources, ingest_document};
use crate::store::{Filter, QueryHit, Record, VectorStore};
use crate::sync::{normalize_root, note_metadata, sync};
use noteweave_core::{AppConfig, AppError, AppResult};
use noteweave_llm::LlmClient;
use noteweave_prompt::{build_prompt, PromptDefinition};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub chunk_collection: String,
    pub notes_collection: String,
    pub max_llm_retry: u32,
    /// Pause before the first LLM call of each chunk
    pub cooldown: Duration,
    pub max_cosine_distance: f32,
    /// Only use chunks and notes of the target vault
    pub restrict_to_vault: bool,
    /// Tags put on every note
    pub tags: String,
    pub context_k: usize,
    pub related_k: usize,
    pub split: SplitOptions,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            chunk_collection: "markdown_chunks".to_string(),
            notes_collection: "markdown_notes".to_string(),
            max_llm_retry: 3,
            cooldown: Duration::from_secs(5),
            max_cosine_distance: 0.2,
            restrict_to_vault: true,
            tags: String::new(),
            context_k: 5,
            related_k: 3,
            split: SplitOptions {
                min_words: 20,
                filter_on_headers: true,
            },
        }
    }
}

impl GenerationOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        let generation = &config.generation;
        Self {
            chunk_collection: config.store.chunk_collection.clone(),
            notes_collection: config.store.notes_collection.clone(),
            max_llm_retry: generation.max_llm_retry,
            cooldown: Duration::from_secs(generation.cooldown_secs),
            max_cosine_distance: generation.max_cosine_distance,
            restrict_to_vault: generation.restrict_to_vault,
            tags: generation.tags.clone(),
            split: SplitOptions {
                min_words: 20,
                filter_on_headers: generation.filter_on_headers,
            },
            ..Self::default()
        }
    }
}

/// Hashes of chunks already turned into notes or used as context.
#[derive(Debug, Default, Clone)]
pub struct UsedChunkSet {
    hashes: HashSet<String>,
}

impl UsedChunkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    pub fn insert(&mut self, hash: String) -> bool {
        self.hashes.insert(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Counters of a generation run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GenerationReport {
    pub processed: usize,
    pub written: Vec<PathBuf>,
    pub skipped_duplicate: usize,
    pub skipped_no_context: usize,
    pub skipped_unparsable: usize,
    pub failed: usize,
    /// Source files in formats that are not ingested
    pub unsupported: Vec<PathBuf>,
}

impl GenerationReport {
    fn merge(&mut self, other: GenerationReport) {
        self.processed += other.processed;
        self.written.extend(other.written);
        self.skipped_duplicate += other.skipped_duplicate;
        self.skipped_no_context += other.skipped_no_context;
        self.skipped_unparsable += other.skipped_unparsable;
        self.failed += other.failed;
        self.unsupported.extend(other.unsupported);
    }
}

enum ChunkOutcome {
    Written(PathBuf),
    Duplicate,
    NoContext,
    Unparsable,
}

/// Turns chunks into vault notes.
pub struct NoteGenerator<'a> {
    store: &'a dyn VectorStore,
    llm: &'a dyn LlmClient,
    prompt: &'a PromptDefinition,
    options: &'a GenerationOptions,
}

impl<'a> NoteGenerator<'a> {
    pub fn new(
        store: &'a dyn VectorStore,
        llm: &'a dyn LlmClient,
        prompt: &'a PromptDefinition,
        options: &'a GenerationOptions,
    ) -> Self {
        Self {
            store,
            llm,
            prompt,
            options,
        }
    }

    /// Generate notes for `chunks` into `vault`. Failures are counted per
    /// chunk and never stop the remaining chunks.
    pub async fn generate_notes(
        &self,
        chunks: &[Chunk],
        vault: &Path,
        used: &mut UsedChunkSet,
    ) -> GenerationReport {
        let mut report = GenerationReport::default();
        let total = chunks.len();

        for (idx, chunk) in chunks.iter().enumerate() {
            let number = idx + 1;
            tracing::info!("Chunk {}/{} of {}", number, total, chunk.source_filename);
            report.processed += 1;

            match self.process_chunk(number, chunk, vault, used).await {
                Ok(ChunkOutcome::Written(path)) => {
                    tracing::info!("Wrote note {}", path.display());
                    report.written.push(path);
                }
                Ok(ChunkOutcome::Duplicate) => {
                    tracing::info!("Skipping chunk {}: already used", number);
                    report.skipped_duplicate += 1;
                }
                Ok(ChunkOutcome::NoContext) => {
                    tracing::info!("Skipping chunk {}: no related chunks in store", number);
                    report.skipped_no_context += 1;
                }
                Ok(ChunkOutcome::Unparsable) => {
                    tracing::warn!("Skipping chunk {}: no valid LLM response", number);
                    report.skipped_unparsable += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to generate note for chunk {}: {}", number, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    fn scope_filter(&self, vault: &str) -> Option<Filter> {
        self.options
            .restrict_to_vault
            .then(|| Filter::eq("vault_path", vault))
    }

    async fn process_chunk(
        &self,
        number: usize,
        chunk: &Chunk,
        vault: &Path,
        used: &mut UsedChunkSet,
    ) -> AppResult<ChunkOutcome> {
        let chunk_hash = chunk.hash();
        if used.contains(&chunk_hash) {
            return Ok(ChunkOutcome::Duplicate);
        }

        let vault = normalize_root(vault)?;
        let vault_path = vault.to_string_lossy().into_owned();
        let filter = self.scope_filter(&vault_path);
        let hits = self
            .store
            .query(
                &self.options.chunk_collection,
                &chunk.text,
                self.options.context_k,
                filter.as_ref(),
                Some(self.options.max_cosine_distance),
            )
            .await?;
        if hits.is_empty() {
            return Ok(ChunkOutcome::NoContext);
        }

        let documents: Vec<&str> = hits.iter().map(|h| h.record.document.as_str()).collect();
        let Some(note) = self.generate_with_retry(&documents.join("\n")).await? else {
            return Ok(ChunkOutcome::Unparsable);
        };

        let title = format!("{}__{}", number, note.title);
        let tags = format!("{} {}", self.options.tags, note.tags).trim().to_string();
        let sources = source_names(hits.iter().filter_map(|h| h.record.meta_str("filename")));
        let pictures = images::detokenize(&note.reference_image, &merged_image_refs(&hits));

        let head = note_head(&tags, &sources, &note);
        let related = self.related_titles(&head, filter.as_ref()).await?;
        let formatted = finish_note(head, &related, &note, &pictures);

        let (stem, path) = write_note(&vault, &title, &formatted.file_text)?;
        self.store
            .add(
                &self.options.notes_collection,
                vec![Record::new(
                    new_record_id(),
                    formatted.store_text,
                    note_metadata(&stem, &vault_path),
                )],
            )
            .await?;

        used.insert(chunk_hash);
        for hit in &hits {
            used.insert(content_hash(&hit.record.document));
        }

        Ok(ChunkOutcome::Written(path))
    }

    /// Wait out the cool-down, then ask the LLM up to `max_llm_retry` times.
    async fn generate_with_retry(&self, documents: &str) -> AppResult<Option<GeneratedNote>> {
        let vars = HashMap::from([("documents".to_string(), documents.to_string())]);
        let built = build_prompt(self.prompt, vars)?;

        tokio::time::sleep(self.options.cooldown).await;

        for attempt in 1..=self.options.max_llm_retry {
            let reply = match self.llm.generate(built.system_or_empty(), &built.user).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!("LLM generation failed on attempt {}: {}", attempt, e);
                    continue;
                }
            };
            match parse_reply(&reply) {
                ParseOutcome::Parsed(note) => {
                    tracing::debug!("Parsed LLM response on attempt {}", attempt);
                    return Ok(Some(note));
                }
                ParseOutcome::Unparsable(raw) => {
                    tracing::warn!(
                        "Unparsable LLM response on attempt {} ({} chars)",
                        attempt,
                        raw.len()
                    );
                }
            }
        }

        Ok(None)
    }

    async fn related_titles(&self, text: &str, filter: Option<&Filter>) -> AppResult<Vec<String>> {
        let hits = self
            .store
            .query(
                &self.options.notes_collection,
                text,
                self.options.related_k,
                filter,
                Some(self.options.max_cosine_distance),
            )
            .await?;

        let mut titles: Vec<String> = Vec::new();
        for title in hits.iter().filter_map(|h| h.record.meta_str("title")) {
            if !titles.iter().any(|t| t == title) {
                titles.push(title.to_string());
            }
        }
        Ok(titles)
    }
}

fn merged_image_refs(hits: &[QueryHit]) -> ImageRefs {
    hits.iter()
        .flat_map(|h| image_refs_of(&h.record.metadata))
        .collect()
}

/// Sync the vault, then ingest every source document and generate its notes.
///
/// One unreadable or unstorable source only skips that source.
pub async fn run_generation(
    store: &dyn VectorStore,
    llm: &dyn LlmClient,
    prompt: &PromptDefinition,
    sources: &Path,
    vault: &Path,
    options: &GenerationOptions,
) -> AppResult<GenerationReport> {
    if options.max_llm_retry == 0 {
        return Err(AppError::Config("max_llm_retry must be at least 1".to_string()));
    }

    let vault = normalize_root(vault)?;
    let sync_report = sync(store, &options.notes_collection, &vault).await?;
    tracing::info!(
        "Vault synced: {} added, {} deleted",
        sync_report.added.len(),
        sync_report.deleted.len()
    );

    let files = collect_sources(sources)?;
    let generator = NoteGenerator::new(store, llm, prompt, options);
    let mut used = UsedChunkSet::new();
    let mut report = GenerationReport {
        unsupported: files.unsupported,
        ..GenerationReport::default()
    };

    for source in &files.markdown {
        let chunks =
            match ingest_document(store, &options.chunk_collection, source, &vault, &options.split)
                .await
            {
                Ok(chunks) => chunks,
                Err(e) => {
                    tracing::error!("Skipping source {}: {}", source.display(), e);
                    report.failed += 1;
                    continue;
                }
            };
        report.merge(generator.generate_notes(&chunks, &vault, &mut used).await);
    }

    tracing::info!(
        "Note generation complete: {} written, {} duplicate, {} without context, {} unparsable, {} failed",
        report.written.len(),
        report.skipped_duplicate,
        report.skipped_no_context,
        report.skipped_unparsable,
        report.failed
    );
    Ok(report)
}
