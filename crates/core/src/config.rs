//! Configuration management for noteweave.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (`.noteweave/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric; the note store lives in `.noteweave/`.
//! It is built once at startup and passed by reference to every component.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the generation layer knows how to construct.
pub const KNOWN_PROVIDERS: [&str; 3] = ["ollama", "gemini", "huggingface"];

/// Embedding backends the store knows how to construct.
pub const KNOWN_EMBEDDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .noteweave/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider tag ("ollama", "gemini", "huggingface")
    pub provider: String,

    /// Model identifier; `None` selects the provider default
    pub model: Option<String>,

    /// Custom endpoint for the provider (Ollama base URL)
    pub endpoint: Option<String>,

    /// Explicit API key, overrides the provider's own environment lookup
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Vector/document store settings
    pub store: StoreSettings,

    /// Embedding settings
    pub embedding: EmbeddingSettings,

    /// Note generation settings
    pub generation: GenerationSettings,
}

/// Where records are persisted and under which collection names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite file; relative paths are resolved against the workspace
    pub path: PathBuf,

    /// Collection holding document chunks
    #[serde(rename = "chunkCollection")]
    pub chunk_collection: String,

    /// Collection holding vault notes
    #[serde(rename = "notesCollection")]
    pub notes_collection: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".noteweave/store.sqlite"),
            chunk_collection: "markdown_chunks".to_string(),
            notes_collection: "markdown_notes".to_string(),
        }
    }
}

/// Embedding backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// "trigram" (offline, deterministic) or "ollama"
    pub provider: String,

    /// Model name for HTTP-backed embedders
    pub model: String,

    /// Vector dimensions
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
        }
    }
}

/// Knobs of the note generation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Attempts per chunk before it is skipped
    #[serde(rename = "maxLlmRetry")]
    pub max_llm_retry: u32,

    /// Cool-down before the first generation attempt of each chunk
    #[serde(rename = "cooldownSecs")]
    pub cooldown_secs: u64,

    /// Inclusive cosine distance cut-off for retrieved context
    #[serde(rename = "maxCosineDistance")]
    pub max_cosine_distance: f32,

    /// Scope retrieval to the target vault directory
    #[serde(rename = "restrictToVault")]
    pub restrict_to_vault: bool,

    /// Free-text tags prepended to every generated note
    pub tags: String,

    /// Drop chunks under back-matter headers (References, Funding, ...)
    #[serde(rename = "filterOnHeaders")]
    pub filter_on_headers: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_llm_retry: 3,
            cooldown_secs: 5,
            max_cosine_distance: 0.2,
            restrict_to_vault: true,
            tags: String::new(),
            filter_on_headers: true,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmFileConfig>,
    store: Option<StoreFileConfig>,
    embedding: Option<EmbeddingSettings>,
    generation: Option<GenerationFileConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmFileConfig {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFileConfig {
    path: Option<PathBuf>,
    #[serde(rename = "chunkCollection")]
    chunk_collection: Option<String>,
    #[serde(rename = "notesCollection")]
    notes_collection: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GenerationFileConfig {
    #[serde(rename = "maxLlmRetry")]
    max_llm_retry: Option<u32>,
    #[serde(rename = "cooldownSecs")]
    cooldown_secs: Option<u64>,
    #[serde(rename = "maxCosineDistance")]
    max_cosine_distance: Option<f32>,
    #[serde(rename = "restrictToVault")]
    restrict_to_vault: Option<bool>,
    tags: Option<String>,
    #[serde(rename = "filterOnHeaders")]
    filter_on_headers: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: None,
            endpoint: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            store: StoreSettings::default(),
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and environment variables.
    ///
    /// Environment variables:
    /// - `NOTEWEAVE_WORKSPACE`: Override workspace path
    /// - `NOTEWEAVE_CONFIG`: Path to config file
    /// - `NOTEWEAVE_PROVIDER`: LLM provider
    /// - `NOTEWEAVE_MODEL`: Model identifier
    /// - `NOTEWEAVE_API_KEY`: API key
    /// - `NOTEWEAVE_STORE`: Store file path
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use noteweave_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("NOTEWEAVE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("NOTEWEAVE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.workspace.join(".noteweave/config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("NOTEWEAVE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("NOTEWEAVE_MODEL") {
            config.model = Some(model);
        }

        if let Ok(store) = std::env::var("NOTEWEAVE_STORE") {
            config.store.path = PathBuf::from(store);
        }

        config.api_key = std::env::var("NOTEWEAVE_API_KEY").ok();
        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.clone().merge_file(config_file))
    }

    fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                self.provider = provider;
            }
            if llm.model.is_some() {
                self.model = llm.model;
            }
            if llm.endpoint.is_some() {
                self.endpoint = llm.endpoint;
            }
        }

        if let Some(store) = file.store {
            if let Some(path) = store.path {
                self.store.path = path;
            }
            if let Some(name) = store.chunk_collection {
                self.store.chunk_collection = name;
            }
            if let Some(name) = store.notes_collection {
                self.store.notes_collection = name;
            }
        }

        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }

        if let Some(generation) = file.generation {
            let settings = &mut self.generation;
            if let Some(v) = generation.max_llm_retry {
                settings.max_llm_retry = v;
            }
            if let Some(v) = generation.cooldown_secs {
                settings.cooldown_secs = v;
            }
            if let Some(v) = generation.max_cosine_distance {
                settings.max_cosine_distance = v;
            }
            if let Some(v) = generation.restrict_to_vault {
                settings.restrict_to_vault = v;
            }
            if let Some(v) = generation.tags {
                settings.tags = v;
            }
            if let Some(v) = generation.filter_on_headers {
                settings.filter_on_headers = v;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        self
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables
    /// and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if model.is_some() {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .noteweave directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(".noteweave")
    }

    /// Ensure the .noteweave directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .noteweave directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Absolute path of the store file.
    pub fn store_path(&self) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            self.workspace.join(&self.store.path)
        }
    }

    /// Environment variable holding the credential for a provider, if it needs one.
    pub fn credential_env(provider: &str) -> Option<&'static str> {
        match provider {
            "gemini" => Some("GEMINI_KEY"),
            "huggingface" => Some("HF_TOKEN"),
            _ => None,
        }
    }

    /// Resolve the API key for the active provider.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        Self::credential_env(&self.provider).and_then(|var| std::env::var(var).ok())
    }

    /// Validate configuration before any I/O happens.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if let Some(env_var) = Self::credential_env(provider) {
            if self.resolve_api_key().is_none() {
                return Err(AppError::Config(format!(
                    "API key not found in environment variable: {}",
                    env_var
                )));
            }
        }

        if !KNOWN_EMBEDDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be positive".to_string(),
            ));
        }

        if self.generation.max_llm_retry == 0 {
            return Err(AppError::Config(
                "maxLlmRetry must be at least 1".to_string(),
            ));
        }

        let distance = self.generation.max_cosine_distance;
        if !(0.0..=2.0).contains(&distance) {
            return Err(AppError::Config(format!(
                "maxCosineDistance must lie within [0, 2], got {}",
                distance
            )));
        }

        if self.store.chunk_collection.is_empty() || self.store.notes_collection.is_empty() {
            return Err(AppError::Config(
                "Collection names cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
