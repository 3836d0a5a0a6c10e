//! Configuration management for Scribe
//!
//! Repository-level settings for a documentation run: which files to document,
//! revision and pacing limits, memory chunking, model selection and the HTTP
//! surface. Every field has a default, so an absent or partial config file is fine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Result, ScribeError};

/// Repository-level Scribe configuration
///
/// Loaded from `.scribe/config.toml` in the given directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScribeConfig {
    /// Run pacing and revision limits
    #[serde(default)]
    pub run: RunSettings,

    /// Memory store chunking and search
    #[serde(default)]
    pub memory: MemorySettings,

    /// Model selection per role
    #[serde(default)]
    pub models: ModelSettings,

    /// HTTP surface
    #[serde(default)]
    pub server: ServerSettings,
}

/// Documentation run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// File extension of the sources to document (without the dot)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Writer/reviewer round-trips per file before forced termination
    #[serde(default = "default_max_revisions")]
    pub max_revisions: usize,

    /// Pause between consecutive files, in seconds
    #[serde(default = "default_inter_file_delay_secs")]
    pub inter_file_delay_secs: u64,

    /// Where the CLI writes the final document
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Files/directories the writer may never overwrite
    #[serde(default = "default_protected_files")]
    pub protected_files: Vec<String>,
}

/// Memory store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySettings {
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of chunks returned by a recall
    #[serde(default = "default_search_k")]
    pub search_k: usize,

    /// Embedding vector dimension
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_model")]
    pub writer: String,

    #[serde(default = "default_model")]
    pub reviewer: String,

    #[serde(default = "default_model")]
    pub publisher: String,

    /// Maximum tokens for a single response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Tool-use round trips allowed inside one invocation
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// Environment variable containing API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value providers
fn default_extension() -> String {
    "java".to_string()
}

fn default_max_revisions() -> usize {
    3
}

fn default_inter_file_delay_secs() -> u64 {
    60
}

fn default_output_file() -> String {
    "FINAL_DOCUMENTATION.md".to_string()
}

fn default_protected_files() -> Vec<String> {
    vec![
        ".git".to_string(),
        ".scribe".to_string(),
        ".env".to_string(),
        "Cargo.lock".to_string(),
        ".secrets".to_string(),
        ".gitignore".to_string(),
    ]
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_search_k() -> usize {
    3
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_model() -> String {
    "sonnet".to_string()
}

fn default_max_tokens() -> usize {
    8000
}

fn default_max_tool_rounds() -> usize {
    8
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl ScribeConfig {
    /// Load configuration from `.scribe/config.toml` or use defaults
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(".scribe/config.toml");

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ScribeError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Write default configuration to `.scribe/config.toml`
    pub fn write_default(dir: &Path) -> Result<()> {
        let config_dir = dir.join(".scribe");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| ScribeError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

impl RunSettings {
    pub fn inter_file_delay(&self) -> Duration {
        Duration::from_secs(self.inter_file_delay_secs)
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            max_revisions: default_max_revisions(),
            inter_file_delay_secs: default_inter_file_delay_secs(),
            output_file: default_output_file(),
            protected_files: default_protected_files(),
        }
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            search_k: default_search_k(),
            embedding_dimension: default_embedding_dimension(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            writer: default_model(),
            reviewer: default_model(),
            publisher: default_model(),
            max_tokens: default_max_tokens(),
            max_tool_rounds: default_max_tool_rounds(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
