//! Configuration management.
//!
//! Values come from, in increasing priority: built-in defaults, a TOML file,
//! and `CITE_RENAME__SECTION__KEY` environment variables.
//!
//! ```toml
//! [paths]
//! input_dir = "input"
//! output_dir = "output"
//!
//! [llm]
//! endpoint = "https://api.openai.com/v1/chat/completions"
//! model = "gpt-3.5-turbo"
//! max_input_chars = 4000
//!
//! [search]
//! base_url = "https://cir.nii.ac.jp"
//! retry_wait_ms = 1000
//! max_retries = 10
//! # min_title_similarity = 0.8
//!
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [rename]
//! overwrite = false
//! sanitize_mode = "space"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::{RetryConfig, SanitizeMode};

/// File name looked up in the working directory and the config directory
pub const CONFIG_FILE_NAME: &str = "cite-rename.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "CITE_RENAME";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub rename: RenameConfig,
}

/// Input and output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory scanned for `*.pdf` files
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory renamed files are moved into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("input")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Language-model endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat-completions URL (any OpenAI-compatible server)
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Bearer token; never written back to disk
    #[serde(default = "default_api_key", skip_serializing)]
    pub api_key: Option<String>,

    /// Upper bound on the extracted text sent to the model
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: default_api_key(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok()
}

fn default_max_input_chars() -> usize {
    4000
}

/// Bibliographic search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Service root; result links are relative to it
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Fixed wait after a 429 answer
    #[serde(default = "default_retry_wait_ms")]
    pub retry_wait_ms: u64,

    /// Retries after the first rate-limited attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Minimum Jaro-Winkler similarity between the guessed title and the
    /// first hit's title; unset accepts the first hit unconditionally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_title_similarity: Option<f64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            retry_wait_ms: default_retry_wait_ms(),
            max_retries: default_max_retries(),
            min_title_similarity: None,
        }
    }
}

impl SearchConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries, Duration::from_millis(self.retry_wait_ms))
    }
}

fn default_search_base_url() -> String {
    "https://cir.nii.ac.jp".to_string()
}

fn default_retry_wait_ms() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    10
}

/// HTTP client settings shared by all endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Rename behavior
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenameConfig {
    /// Replace an existing file with the same name instead of failing
    #[serde(default)]
    pub overwrite: bool,

    /// Replacement used on the fallback attempt
    #[serde(default)]
    pub sanitize_mode: SanitizeMode,
}

impl Config {
    /// Save configuration as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Find a config file in the working directory or the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("cite-rename").join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.paths.input_dir, PathBuf::from("input"));
        assert_eq!(config.paths.output_dir, PathBuf::from("output"));
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.search.base_url, "https://cir.nii.ac.jp");
        assert_eq!(config.search.retry_wait_ms, 1000);
        assert!(config.search.min_title_similarity.is_none());
        assert!(!config.rename.overwrite);
        assert_eq!(config.rename.sanitize_mode, SanitizeMode::Space);
    }

    #[test]
    fn test_retry_config_from_search() {
        let search = SearchConfig {
            retry_wait_ms: 250,
            max_retries: 4,
            ..SearchConfig::default()
        };
        let retry = search.retry_config();
        assert_eq!(retry.wait, Duration::from_millis(250));
        assert_eq!(retry.max_attempts(), 5);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cite-rename.toml");

        std::fs::write(
            &path,
            r#"
[paths]
input_dir = "/data/in"
output_dir = "/data/out"

[search]
max_retries = 3
min_title_similarity = 0.75

[rename]
overwrite = true
sanitize_mode = "fullwidth"
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.paths.input_dir, PathBuf::from("/data/in"));
        assert_eq!(config.paths.output_dir, PathBuf::from("/data/out"));
        assert_eq!(config.search.max_retries, 3);
        assert_eq!(config.search.min_title_similarity, Some(0.75));
        assert_eq!(config.search.retry_wait_ms, 1000);
        assert!(config.rename.overwrite);
        assert_eq!(config.rename.sanitize_mode, SanitizeMode::Fullwidth);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("cite-rename.toml");

        let mut config = Config::default();
        config.llm.model = "gpt-4o-mini".to_string();
        config.llm.api_key = Some("sk-secret".to_string());
        config.search.max_retries = 2;
        config.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("sk-secret"));

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.llm.model, "gpt-4o-mini");
        assert_eq!(loaded.search.max_retries, 2);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let path = PathBuf::from("/nonexistent/cite-rename.toml");
        assert!(load_config(Some(&path)).is_err());
    }
}
