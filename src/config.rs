//! Configuration for opsdesk.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (OPSDESK_MODEL, OPSDESK_API_BASE, OPSDESK_API_KEY,
//!    OPSDESK_RULES; OPENAI_API_KEY is honored when OPSDESK_API_KEY is unset)
//! 2. Config file (.opsdesk/config.yaml)
//! 3. Defaults (gpt-4o-mini, OpenAI API, built-in rule book)
//!
//! Config file discovery:
//! - Searches current directory and parents for .opsdesk/config.yaml,
//!   then falls back to ~/.opsdesk/config.yaml
//! - Paths in config file are relative to the project root (parent of .opsdesk/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, Serializer};

use crate::core::{FeedbackLimits, RuleBook};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const DEFAULT_MODEL: &str = "gpt-4o-mini-2024-07-18";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

const CONFIG_DIR: &str = ".opsdesk";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub limits: Option<LimitsConfig>,
    /// Rule book path (relative to project root)
    #[serde(default)]
    pub rules: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationConfig {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub max_text_bytes: Option<usize>,
    pub max_batch_items: Option<usize>,
}

/// Resolved configuration
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Generation backend settings
    pub generation: GenerationSettings,
    /// Input limits
    pub limits: FeedbackLimits,
    /// Rule book file; the built-in rule book is used when absent
    pub rules_path: Option<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationSettings {
    pub model: String,
    pub api_base: String,
    #[serde(serialize_with = "redact")]
    pub api_key: Option<String>,
    /// Per-call timeout for every stage
    pub timeout_seconds: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl GenerationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn redact<S: Serializer>(key: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match key {
        Some(_) => serializer.serialize_str("<redacted>"),
        None => serializer.serialize_none(),
    }
}

impl ResolvedConfig {
    /// Load the configured rule book, or the built-in one
    pub fn load_rules(&self) -> Result<RuleBook> {
        match self.rules_path {
            Some(ref path) => RuleBook::from_file(path),
            None => Ok(RuleBook::default()),
        }
    }
}

/// Find config file by searching current directory and parents, then ~/.opsdesk
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(CONFIG_DIR).join("config.yaml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }
    }

    let user_config = dirs::home_dir()?.join(CONFIG_DIR).join("config.yaml");
    user_config.exists().then_some(user_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Merge environment, config file and defaults
fn resolve(
    config_file: Option<PathBuf>,
    file: Option<ConfigFile>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let defaults = GenerationSettings::default();
    let file_generation = file
        .as_ref()
        .map(|f| f.generation.clone())
        .unwrap_or_default();

    let generation = GenerationSettings {
        model: env("OPSDESK_MODEL")
            .or(file_generation.model)
            .unwrap_or(defaults.model),
        api_base: env("OPSDESK_API_BASE")
            .or(file_generation.api_base)
            .unwrap_or(defaults.api_base),
        api_key: env("OPSDESK_API_KEY").or_else(|| env("OPENAI_API_KEY")),
        timeout_seconds: file_generation
            .timeout_seconds
            .unwrap_or(defaults.timeout_seconds),
    };

    let mut limits = FeedbackLimits::default();
    if let Some(file_limits) = file.as_ref().and_then(|f| f.limits.as_ref()) {
        if let Some(max) = file_limits.max_text_bytes {
            limits.max_text_bytes = max;
        }
        if let Some(max) = file_limits.max_batch_items {
            limits.max_batch_items = max;
        }
    }

    // Project root is the parent of .opsdesk/ (i.e., grandparent of config.yaml)
    let base_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));

    let rules_path = env("OPSDESK_RULES").map(PathBuf::from).or_else(|| {
        file.as_ref()
            .and_then(|f| f.rules.as_deref())
            .map(|p| resolve_path(base_dir, p))
    });

    ResolvedConfig {
        generation,
        limits,
        rules_path,
        config_file,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();
    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    Ok(resolve(config_file, file, env_var))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
