//! Layered configuration for Redline.
//!
//! Settings come from `.redline/redline.toml`, then environment variables
//! (a `.env` file is loaded first when present), then CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [llm]
//! default_provider = "groq"
//! fallback_provider = "gemini"
//! max_tokens = 2000
//! timeout_secs = 60
//!
//! [llm.groq]
//! model = "llama3-70b-8192"
//! base_url = "https://api.groq.com/openai/v1/chat/completions"
//!
//! [llm.gemini]
//! model = "gemini-1.5-flash"
//! base_url = "https://generativelanguage.googleapis.com/v1beta/models"
//!
//! [review]
//! default_agents = ["technical", "formatting", "diagram"]
//! agent_timeout_secs = 120
//!
//! [storage]
//! data_dir = "data"
//!
//! [logging]
//! level = "info"
//! format = "console"
//! logs_dir = "logs"
//! ```
//!
//! API keys are never read from or written to the file; they come from
//! `GROQ_API_KEY` and `GEMINI_API_KEY` only.

use crate::llm::chat_completions::{GROQ_ENDPOINT, GROQ_MODEL};
use crate::llm::gemini::{GEMINI_BASE_URL, GEMINI_MODEL};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Provider names the gateway knows how to build.
pub const KNOWN_PROVIDERS: &[&str] = &["groq", "gemini"];

pub const CONFIG_DIR: &str = ".redline";
pub const CONFIG_FILE: &str = "redline.toml";

/// Log output format for the console layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Console => write!(f, "console"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(LogFormat::Console),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format '{}'. Valid values: console, json", s),
        }
    }
}

/// Model and endpoint for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSection {
    pub model: String,
    pub base_url: String,
}

fn default_groq() -> ProviderSection {
    ProviderSection {
        model: GROQ_MODEL.to_string(),
        base_url: GROQ_ENDPOINT.to_string(),
    }
}

fn default_gemini() -> ProviderSection {
    ProviderSection {
        model: GEMINI_MODEL.to_string(),
        base_url: GEMINI_BASE_URL.to_string(),
    }
}

/// `[llm]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_fallback")]
    pub fallback_provider: Option<String>,
    /// Token budget per provider request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Transport timeout per provider request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_groq")]
    pub groq: ProviderSection,
    #[serde(default = "default_gemini")]
    pub gemini: ProviderSection,
}

fn default_provider() -> String {
    "groq".to_string()
}

fn default_fallback() -> Option<String> {
    Some("gemini".to_string())
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            fallback_provider: default_fallback(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            groq: default_groq(),
            gemini: default_gemini(),
        }
    }
}

/// `[review]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSection {
    /// Agents run when none are named on the command line (empty = all)
    #[serde(default)]
    pub default_agents: Vec<String>,
    /// Per-agent deadline; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_timeout_secs: Option<u64>,
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            logs_dir: default_logs_dir(),
        }
    }
}

/// The complete redline.toml structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedlineToml {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub review: ReviewSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl RedlineToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse redline.toml")
    }

    /// Load `redline.toml` from `config_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize redline.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Check the file-level settings and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for name in std::iter::once(&self.llm.default_provider).chain(&self.llm.fallback_provider) {
            if !KNOWN_PROVIDERS.contains(&name.as_str()) {
                warnings.push(format!(
                    "Unknown provider '{}'. Known providers: {}",
                    name,
                    KNOWN_PROVIDERS.join(", ")
                ));
            }
        }

        if self.llm.fallback_provider.as_deref() == Some(self.llm.default_provider.as_str()) {
            warnings.push(format!(
                "fallback_provider is the same as default_provider ('{}'); no fallback will be attempted",
                self.llm.default_provider
            ));
        }

        if self.llm.max_tokens == 0 {
            warnings.push("max_tokens is 0; providers will return empty responses".to_string());
        }

        if self.llm.timeout_secs == 0 {
            warnings.push("timeout_secs is 0; every provider request will time out".to_string());
        }

        warnings
    }
}

/// Environment overrides, captured once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub default_provider: Option<String>,
    pub fallback_provider: Option<String>,
    pub max_tokens: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub data_dir: Option<String>,
    pub logs_dir: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment. Empty values count as unset.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            groq_api_key: var("GROQ_API_KEY"),
            gemini_api_key: var("GEMINI_API_KEY"),
            default_provider: var("DEFAULT_PROVIDER"),
            fallback_provider: var("FALLBACK_PROVIDER"),
            max_tokens: var("MAX_TOKENS_PER_REQUEST"),
            log_level: var("LOG_LEVEL"),
            log_format: var("LOG_FORMAT"),
            data_dir: var("DATA_DIR"),
            logs_dir: var("LOGS_DIR"),
        }
    }
}

/// Resolved configuration for one invocation.
///
/// Merges, lowest precedence first:
/// 1. redline.toml
/// 2. Environment variables
/// 3. CLI arguments
#[derive(Debug, Clone)]
pub struct RedlineConfig {
    /// Path to the project directory
    pub project_dir: PathBuf,
    /// Path to the .redline directory
    pub redline_dir: PathBuf,
    /// Parsed redline.toml
    pub toml: RedlineToml,
    pub env: EnvOverrides,
    /// CLI override: verbose mode
    pub verbose: bool,
    /// CLI override: provider to target first
    pub cli_provider: Option<String>,
}

impl RedlineConfig {
    /// Load config for `project_dir`, reading `config_path` instead of the
    /// default location when given.
    pub fn load(project_dir: PathBuf, config_path: Option<&Path>) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve project directory: {}", project_dir.display()))?;
        let redline_dir = project_dir.join(CONFIG_DIR);

        // A missing .env is normal
        let _ = dotenvy::from_path(project_dir.join(".env"));

        let toml = match config_path {
            Some(path) => RedlineToml::load(path)?,
            None => RedlineToml::load_or_default(&redline_dir)?,
        };

        Ok(Self::from_parts(project_dir, toml, EnvOverrides::from_env()))
    }

    /// Assemble a config from already-loaded parts.
    pub fn from_parts(project_dir: PathBuf, toml: RedlineToml, env: EnvOverrides) -> Self {
        Self {
            redline_dir: project_dir.join(CONFIG_DIR),
            project_dir,
            toml,
            env,
            verbose: false,
            cli_provider: None,
        }
    }

    /// Apply CLI overrides.
    pub fn with_cli_args(mut self, verbose: bool, provider: Option<String>) -> Self {
        self.verbose = verbose;
        self.cli_provider = provider;
        self
    }

    pub fn config_file(&self) -> PathBuf {
        self.redline_dir.join(CONFIG_FILE)
    }

    pub fn groq_api_key(&self) -> Option<String> {
        self.env.groq_api_key.clone()
    }

    pub fn gemini_api_key(&self) -> Option<String> {
        self.env.gemini_api_key.clone()
    }

    /// Default provider (CLI → env → file).
    pub fn default_provider(&self) -> String {
        self.cli_provider
            .clone()
            .or_else(|| self.env.default_provider.clone())
            .unwrap_or_else(|| self.toml.llm.default_provider.clone())
    }

    /// Fallback provider (env → file).
    pub fn fallback_provider(&self) -> Option<String> {
        self.env
            .fallback_provider
            .clone()
            .or_else(|| self.toml.llm.fallback_provider.clone())
    }

    /// Token budget per request (env → file). Unparseable env values are ignored.
    pub fn max_tokens(&self) -> u32 {
        self.env
            .max_tokens
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(self.toml.llm.max_tokens)
    }

    /// Resolved logging settings (env → file), with directories made absolute.
    pub fn logging(&self) -> LoggingSection {
        let mut logging = self.toml.logging.clone();
        if let Some(level) = &self.env.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = self.env.log_format.as_deref().and_then(|f| f.parse().ok()) {
            logging.format = format;
        }
        let logs_dir = self
            .env
            .logs_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or(logging.logs_dir);
        logging.logs_dir = self.resolve(logs_dir);
        logging
    }

    /// Data directory (env → file), relative to the project directory.
    pub fn data_dir(&self) -> PathBuf {
        let dir = self
            .env
            .data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.toml.storage.data_dir.clone());
        self.resolve(dir)
    }

    /// Path to the SQLite findings database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("reviews.db")
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.project_dir.join(path)
        }
    }

    /// Agents to run when the CLI names none. `None` means every agent.
    pub fn default_agents(&self) -> Option<Vec<String>> {
        if self.toml.review.default_agents.is_empty() {
            None
        } else {
            Some(self.toml.review.default_agents.clone())
        }
    }

    pub fn agent_timeout(&self) -> Option<std::time::Duration> {
        self.toml
            .review
            .agent_timeout_secs
            .map(std::time::Duration::from_secs)
    }

    /// Validate the resolved configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();

        if self.groq_api_key().is_none() && self.gemini_api_key().is_none() {
            warnings.push(
                "No LLM API keys configured (GROQ_API_KEY, GEMINI_API_KEY); agents will run rule checks only"
                    .to_string(),
            );
        }

        if let Some(provider) = &self.cli_provider
            && !KNOWN_PROVIDERS.contains(&provider.as_str())
        {
            warnings.push(format!("Unknown provider '{}' given with --provider", provider));
        }

        if let Some(format) = &self.env.log_format
            && format.parse::<LogFormat>().is_err()
        {
            warnings.push(format!(
                "Invalid LOG_FORMAT '{}': expected console or json",
                format
            ));
        }

        if let Some(raw) = &self.env.max_tokens
            && raw.trim().parse::<u32>().is_err()
        {
            warnings.push(format!(
                "Invalid MAX_TOKENS_PER_REQUEST '{}': expected a positive integer",
                raw
            ));
        }

        warnings
    }
}

/// Write a default `redline.toml` under `project_dir/.redline/`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(project_dir: &Path, force: bool) -> Result<PathBuf> {
    let redline_dir = project_dir.join(CONFIG_DIR);
    std::fs::create_dir_all(&redline_dir)
        .with_context(|| format!("Failed to create {}", redline_dir.display()))?;

    let path = redline_dir.join(CONFIG_FILE);
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    RedlineToml::default().save(&path)?;
    Ok(path)
}
