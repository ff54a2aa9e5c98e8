use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::core::engine::{EngineSettings, TieBreak, DEFAULT_ONE_SIDED_BONUS};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub ollama: OllamaSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub availability: AvailabilitySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaSettings {
    #[serde(default = "default_ollama_url")]
    pub url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
    #[serde(default = "default_ollama_timeout")]
    pub timeout_secs: u64,
    /// Pull the model on startup
    #[serde(default)]
    pub pull_on_start: bool,
    #[serde(default = "default_cache_size")]
    pub cache_size: u64,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_ollama_model(),
            timeout_secs: default_ollama_timeout(),
            pull_on_start: false,
            cache_size: default_cache_size(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_ollama_url() -> String { "http://localhost:11434".to_string() }
fn default_ollama_model() -> String { "paraphrase-multilingual".to_string() }
fn default_ollama_timeout() -> u64 { 30 }
fn default_cache_size() -> u64 { 10_000 }
fn default_cache_ttl() -> u64 { 86_400 }

/// Database connection; without a URL results are kept in memory
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_one_sided_bonus")]
    pub one_sided_bonus: f64,
    #[serde(default)]
    pub tie_break: TieBreak,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            one_sided_bonus: default_one_sided_bonus(),
            tie_break: TieBreak::default(),
        }
    }
}

fn default_one_sided_bonus() -> f64 { DEFAULT_ONE_SIDED_BONUS }

/// Time slots a mask position stands for, in mask order
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilitySettings {
    #[serde(default = "default_slots")]
    pub slots: Vec<String>,
}

impl Default for AvailabilitySettings {
    fn default() -> Self {
        Self { slots: default_slots() }
    }
}

fn default_slots() -> Vec<String> {
    [
        "10:00 -- 12:00",
        "12:00 -- 14:00",
        "14:00 -- 16:00",
        "16:00 -- 18:00",
        "18:00 -- 20:00",
        "20:00 -- 22:00",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PAIRING__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PAIRING__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("PAIRING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = with_database_url(settings)?;

        settings.try_deserialize::<Self>()?.validated()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("PAIRING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize::<Self>()?.validated()
    }

    /// Engine tunables derived from the matching and availability sections
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            one_sided_bonus: self.matching.one_sided_bonus,
            slot_count: self.availability.slots.len(),
            tie_break: self.matching.tie_break,
        }
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let slots = self.availability.slots.len();
        if slots == 0 || slots > crate::core::availability::MAX_SLOTS {
            return Err(ConfigError::Message(format!(
                "availability.slots must list between 1 and {} slots, got {}",
                crate::core::availability::MAX_SLOTS,
                slots
            )));
        }
        if !self.matching.one_sided_bonus.is_finite() {
            return Err(ConfigError::Message("matching.one_sided_bonus must be finite".into()));
        }
        Ok(self)
    }
}

/// Take the database URL from the conventional DATABASE_URL variable when set
fn with_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}
