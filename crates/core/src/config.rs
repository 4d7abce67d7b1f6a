//! Configuration management for Pulse.
//!
//! Configuration is resolved in layers, later layers winning:
//! - Built-in defaults
//! - Config file (`.pulse/config.yaml` in the workspace, or `PULSE_CONFIG`)
//! - Environment variables
//! - Command-line flags (see [`AppConfig::with_overrides`])
//!
//! The resulting [`AppConfig`] is passed explicitly to every component that
//! needs it; nothing reads the environment after startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Completion providers the factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["gemini", "ollama"];

/// Embedding providers the factory knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["gemini", "ollama", "trigram"];

/// NewsAPI caps `pageSize` at 100.
const MAX_ARTICLES_LIMIT: usize = 100;

const DEFAULT_API_KEY_ENV: &str = "GOOGLE_API_KEY";
const DEFAULT_NEWS_API_KEY_ENV: &str = "NEWS_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .pulse/ and storage/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Completion provider ("gemini", "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// Custom completion endpoint
    pub endpoint: Option<String>,

    /// API key for the completion provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature; 0.0 asks for the least random output
    pub temperature: f32,

    /// Per-attempt timeout for router and synthesizer calls, in seconds
    pub llm_timeout_secs: u64,

    /// Attempts per router/synthesizer call (1 = no retry)
    pub max_attempts: u32,

    /// Embedding provider ("gemini", "ollama", "trigram")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Expected embedding vector length
    pub embedding_dimensions: usize,

    /// Custom embedding endpoint
    pub embedding_endpoint: Option<String>,

    /// Path to the prebuilt SQLite vector index (relative to workspace)
    pub index_path: PathBuf,

    /// Number of knowledge chunks retrieved per question
    pub top_k: usize,

    /// NewsAPI credential
    #[serde(skip_serializing)]
    pub news_api_key: Option<String>,

    /// News search endpoint
    pub news_endpoint: String,

    /// Article language filter
    pub news_language: String,

    /// Maximum articles requested per live fetch
    pub max_articles: usize,

    /// Timeout for the live news request, in seconds
    pub request_timeout_secs: u64,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Command-line values layered on top of a loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub top_k: Option<usize>,
    pub max_articles: Option<usize>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSection>,
    retrieval: Option<RetrievalSection>,
    news: Option<NewsSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalSection {
    index_path: Option<PathBuf>,
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsSection {
    api_key_env: Option<String>,
    endpoint: Option<String>,
    language: Option<String>,
    max_articles: Option<usize>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            endpoint: None,
            api_key: None,
            temperature: 0.0,
            llm_timeout_secs: 60,
            max_attempts: 3,
            embedding_provider: "gemini".to_string(),
            embedding_model: "gemini-embedding-001".to_string(),
            embedding_dimensions: 3072,
            embedding_endpoint: None,
            index_path: PathBuf::from("storage/index.sqlite"),
            top_k: 4,
            news_api_key: None,
            news_endpoint: "https://newsapi.org/v2/everything".to_string(),
            news_language: "en".to_string(),
            max_articles: 3,
            request_timeout_secs: 10,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `PULSE_WORKSPACE`: Override workspace path
    /// - `PULSE_CONFIG`: Path to config file
    /// - `PULSE_PROVIDER`, `PULSE_MODEL`: Completion provider and model
    /// - `PULSE_EMBEDDING_MODEL`: Embedding model
    /// - `PULSE_API_KEY`: Completion API key (falls back to the env var named
    ///   by `llm.apiKeyEnv`, default `GOOGLE_API_KEY`)
    /// - `NEWS_API_KEY`: NewsAPI key (or the var named by `news.apiKeyEnv`)
    /// - `PULSE_TOP_K`, `PULSE_MAX_ARTICLES`: Retrieval bounds
    /// - `RUST_LOG`: Log filter
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use pulse_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Index: {:?}", config.resolved_index_path());
    /// ```
    pub fn load() -> AppResult<Self> {
        let workspace = std::env::var("PULSE_WORKSPACE").ok().map(PathBuf::from);
        let config_file = std::env::var("PULSE_CONFIG").ok().map(PathBuf::from);
        Self::load_with(workspace, config_file)
    }

    /// Load configuration for an explicit workspace and config file.
    ///
    /// `None` falls back to the current directory and
    /// `<workspace>/.pulse/config.yaml` respectively.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }
        config.config_file = config_file;

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.pulse_dir().join("config.yaml"));

        let file = if config_path.exists() {
            read_config_file(&config_path)?
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        } else {
            ConfigFile::default()
        };

        config.apply_file(&file);
        config.apply_env(&file)?;

        Ok(config)
    }

    /// Merge a parsed config file into this config.
    fn apply_file(&mut self, file: &ConfigFile) {
        if let Some(ref llm) = file.llm {
            if let Some(ref provider) = llm.provider {
                self.provider = provider.clone();
            }
            if let Some(ref model) = llm.model {
                self.model = model.clone();
            }
            if llm.endpoint.is_some() {
                self.endpoint = llm.endpoint.clone();
            }
            if let Some(temperature) = llm.temperature {
                self.temperature = temperature;
            }
            if let Some(timeout) = llm.timeout_secs {
                self.llm_timeout_secs = timeout;
            }
            if let Some(attempts) = llm.max_attempts {
                self.max_attempts = attempts;
            }
        }

        if let Some(ref embedding) = file.embedding {
            if let Some(ref provider) = embedding.provider {
                self.embedding_provider = provider.clone();
            }
            if let Some(ref model) = embedding.model {
                self.embedding_model = model.clone();
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding_dimensions = dimensions;
            }
            if embedding.endpoint.is_some() {
                self.embedding_endpoint = embedding.endpoint.clone();
            }
        }

        if let Some(ref retrieval) = file.retrieval {
            if let Some(ref path) = retrieval.index_path {
                self.index_path = path.clone();
            }
            if let Some(top_k) = retrieval.top_k {
                self.top_k = top_k;
            }
        }

        if let Some(ref news) = file.news {
            if let Some(ref endpoint) = news.endpoint {
                self.news_endpoint = endpoint.clone();
            }
            if let Some(ref language) = news.language {
                self.news_language = language.clone();
            }
            if let Some(max_articles) = news.max_articles {
                self.max_articles = max_articles;
            }
            if let Some(timeout) = news.timeout_secs {
                self.request_timeout_secs = timeout;
            }
        }

        if let Some(ref logging) = file.logging {
            if logging.level.is_some() {
                self.log_level = logging.level.clone();
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }
    }

    /// Environment variables override the config file.
    fn apply_env(&mut self, file: &ConfigFile) -> AppResult<()> {
        if let Ok(provider) = std::env::var("PULSE_PROVIDER") {
            self.provider = provider;
        }
        if let Ok(model) = std::env::var("PULSE_MODEL") {
            self.model = model;
        }
        if let Ok(model) = std::env::var("PULSE_EMBEDDING_MODEL") {
            self.embedding_model = model;
        }
        if let Some(top_k) = parse_env_usize("PULSE_TOP_K")? {
            self.top_k = top_k;
        }
        if let Some(max_articles) = parse_env_usize("PULSE_MAX_ARTICLES")? {
            self.max_articles = max_articles;
        }

        let api_key_env = file
            .llm
            .as_ref()
            .and_then(|llm| llm.api_key_env.clone())
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
        self.api_key = std::env::var("PULSE_API_KEY")
            .or_else(|_| std::env::var(&api_key_env))
            .ok();

        let news_key_env = file
            .news
            .as_ref()
            .and_then(|news| news.api_key_env.clone())
            .unwrap_or_else(|| DEFAULT_NEWS_API_KEY_ENV.to_string());
        self.news_api_key = std::env::var(&news_key_env).ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }
        if std::env::var_os("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over the file and the environment.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(provider) = overrides.provider {
            self.provider = provider;
        }

        if let Some(model) = overrides.model {
            self.model = model;
        }

        if let Some(top_k) = overrides.top_k {
            self.top_k = top_k;
        }

        if let Some(max_articles) = overrides.max_articles {
            self.max_articles = max_articles;
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .pulse directory.
    pub fn pulse_dir(&self) -> PathBuf {
        self.workspace.join(".pulse")
    }

    /// Index path resolved against the workspace.
    pub fn resolved_index_path(&self) -> PathBuf {
        if self.index_path.is_absolute() {
            self.index_path.clone()
        } else {
            self.workspace.join(&self.index_path)
        }
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration before any client is built.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if (self.provider == "gemini" || self.embedding_provider == "gemini")
            && self.api_key.is_none()
        {
            return Err(AppError::Config(
                "Gemini requires an API key (set PULSE_API_KEY or GOOGLE_API_KEY)".to_string(),
            ));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be at least 1".to_string()));
        }

        if self.max_articles == 0 || self.max_articles > MAX_ARTICLES_LIMIT {
            return Err(AppError::Config(format!(
                "max_articles must be between 1 and {}",
                MAX_ARTICLES_LIMIT
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "temperature must be within 0.0-2.0, got {}",
                self.temperature
            )));
        }

        if self.max_attempts == 0 {
            return Err(AppError::Config("max_attempts must be at least 1".to_string()));
        }

        if self.embedding_dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be at least 1".to_string(),
            ));
        }

        if self.news_api_key.is_none() {
            // Live questions still get an answer, just the "no live data" one.
            tracing::warn!("NEWS_API_KEY is not set; live questions will report missing data");
        }

        Ok(())
    }
}

/// Read and parse a YAML config file.
fn read_config_file(path: &Path) -> AppResult<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

    serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
}

fn parse_env_usize(name: &str) -> AppResult<Option<usize>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} must be a positive integer, got {:?}", name, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.embedding_model, "gemini-embedding-001");
        assert_eq!(config.top_k, 4);
        assert_eq!(config.max_articles, 3);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.temperature, 0.0);
        assert!(!config.verbose);
    }

    #[test]
    fn test_pulse_dir() {
        let config = AppConfig::default();
        assert!(config.pulse_dir().ends_with(".pulse"));
    }

    #[test]
    fn test_resolved_index_path_is_workspace_relative() {
        let config = AppConfig {
            workspace: PathBuf::from("/srv/pulse"),
            ..AppConfig::default()
        };
        assert_eq!(
            config.resolved_index_path(),
            PathBuf::from("/srv/pulse/storage/index.sqlite")
        );

        let absolute = AppConfig {
            index_path: PathBuf::from("/data/index.sqlite"),
            ..config
        };
        assert_eq!(absolute.resolved_index_path(), PathBuf::from("/data/index.sqlite"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(ConfigOverrides {
            provider: Some("ollama".to_string()),
            model: Some("llama3.2".to_string()),
            top_k: Some(8),
            verbose: true,
            ..Default::default()
        });

        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.top_k, 8);
        assert_eq!(config.max_articles, 3);
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_apply_file_sections() {
        let yaml = r#"
llm:
  provider: ollama
  model: llama3.2
  endpoint: http://localhost:11434
  temperature: 0.2
  maxAttempts: 5
embedding:
  provider: trigram
  model: trigram-v1
  dimensions: 384
retrieval:
  indexPath: data/kb.sqlite
  topK: 6
news:
  language: de
  maxArticles: 10
  timeoutSecs: 4
logging:
  level: warn
  color: false
"#;
        let file: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        let mut config = AppConfig::default();
        config.apply_file(&file);

        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.embedding_provider, "trigram");
        assert_eq!(config.embedding_dimensions, 384);
        assert_eq!(config.index_path, PathBuf::from("data/kb.sqlite"));
        assert_eq!(config.top_k, 6);
        assert_eq!(config.news_language, "de");
        assert_eq!(config.max_articles, 10);
        assert_eq!(config.request_timeout_secs, 4);
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert!(config.no_color);
    }

    #[test]
    fn test_load_with_missing_explicit_file_fails() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_with(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("nope.yaml")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_missing_workspace_fails() {
        let result = AppConfig::load_with(Some(PathBuf::from("/definitely/not/here")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_read_config_file_rejects_bad_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "llm: [unclosed").unwrap();
        assert!(read_config_file(&path).is_err());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config = AppConfig {
            provider: "unknown".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_gemini_requires_key() {
        let config = AppConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_validate_local_stack() {
        let config = AppConfig {
            provider: "ollama".to_string(),
            embedding_provider: "trigram".to_string(),
            embedding_dimensions: 384,
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds() {
        let base = AppConfig {
            provider: "ollama".to_string(),
            embedding_provider: "trigram".to_string(),
            ..AppConfig::default()
        };

        let zero_k = AppConfig { top_k: 0, ..base.clone() };
        assert!(zero_k.validate().is_err());

        let too_many = AppConfig { max_articles: 500, ..base.clone() };
        assert!(too_many.validate().is_err());

        let hot = AppConfig { temperature: 3.5, ..base.clone() };
        assert!(hot.validate().is_err());

        let no_attempts = AppConfig { max_attempts: 0, ..base };
        assert!(no_attempts.validate().is_err());
    }
}
