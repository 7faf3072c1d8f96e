//! Service configuration.
//!
//! Layers, lowest priority first: built-in defaults, `config.toml` (or the
//! file named by `--config` / `VEGGIE_CONFIG`), then environment variables.
//! A `.env` file in the working directory is loaded into the environment
//! before anything else; variables that are already set win.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub line: LineConfig,
    pub classifier: ClassifierConfig,
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the frontend build (`index.html` and assets).
    pub static_dir: PathBuf,
    /// Public base URL of the web frontend, linked from cards.
    pub web_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: PathBuf::from("static"),
            web_url: "http://localhost:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/vegetables".to_string(),
            max_connections: crate::catalog::postgres::DEFAULT_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Endpoint the service itself talks to.
    pub endpoint: String,
    /// Base URL clients use to load photos; may differ from `endpoint`
    /// behind a proxy.
    pub public_url: String,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            public_url: "http://localhost:9000".to_string(),
            bucket: "veg-data-bucket".to_string(),
            region: "us-east-1".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub channel_secret: String,
    pub channel_access_token: String,
    pub api_base: String,
    pub data_api_base: String,
    pub timeout_secs: u64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_secret: String::new(),
            channel_access_token: String::new(),
            api_base: "https://api.line.me".to_string(),
            data_api_base: "https://api-data.line.me".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Model service URL; without it image recognition is disabled.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Upper bound on cards per carousel (platform maximum is 12).
    pub carousel_limit: usize,
    pub nutrient_top_n: usize,
    pub recipe_limit: usize,
    /// Classifier confidence at which the bot states the label outright.
    pub confident_threshold: f64,
    /// Below this the bot asks for a clearer photo instead.
    pub plausible_threshold: f64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            carousel_limit: 12,
            nutrient_top_n: 10,
            recipe_limit: 10,
            confident_threshold: 0.8,
            plausible_threshold: 0.5,
        }
    }
}

impl AppConfig {
    /// Load `.env`, the config file and environment overrides, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded .env from {}", path.display()),
            Err(_) => debug!("No .env file found"),
        }

        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("VEGGIE_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                info!("No config file, using defaults and environment");
                Self::default()
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        config.log_secret_lengths();
        Ok(config)
    }

    /// Only lengths are logged, never the values.
    pub fn log_secret_lengths(&self) {
        info!(
            length = self.line.channel_access_token.len(),
            "LINE channel access token loaded"
        );
        info!(length = self.line.channel_secret.len(), "LINE channel secret loaded");
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Overlay environment variables. `lookup` abstracts the environment so
    /// tests can supply their own.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = var("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = var("url_5000") {
            self.server.web_url = url;
        }

        if let Some(url) = var("DATABASE_URL") {
            self.database.url = url;
        } else if let Some(host) = var("DATABASE_HOST") {
            let port = var("DATABASE_PORT").unwrap_or_else(|| "5432".to_string());
            let name = var("DATABASE_NAME").unwrap_or_else(|| "postgres".to_string());
            let user = var("DATABASE_USER").unwrap_or_else(|| "postgres".to_string());
            let password = var("DATABASE_PASSWORD").unwrap_or_default();
            self.database.url = format!(
                "postgres://{}:{}@{host}:{port}/{name}",
                urlencoding::encode(&user),
                urlencoding::encode(&password),
            );
        }

        if let Some(endpoint) = var("MINIO_ENDPOINT") {
            self.storage.endpoint = endpoint;
        }
        if let Some(url) = var("url_9000") {
            self.storage.public_url = url;
        }
        if let Some(bucket) = var("MINIO_BUCKET_NAME") {
            self.storage.bucket = bucket;
        }
        if let Some(key) = var("MINIO_ACCESS_KEY") {
            self.storage.access_key = key;
        }
        if let Some(key) = var("MINIO_SECRET_KEY") {
            self.storage.secret_key = key;
        }

        if let Some(token) = var("LINE_CHANNEL_ACCESS_TOKEN") {
            self.line.channel_access_token = token;
        }
        if let Some(secret) = var("LINE_CHANNEL_SECRET") {
            self.line.channel_secret = secret;
        }

        if let Some(url) = var("CLASSIFIER_URL") {
            self.classifier.endpoint = Some(url);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line.channel_access_token.trim().is_empty() {
            return Err(ConfigError::Missing("LINE_CHANNEL_ACCESS_TOKEN"));
        }
        if self.line.channel_secret.trim().is_empty() {
            return Err(ConfigError::Missing("LINE_CHANNEL_SECRET"));
        }

        let bot = &self.bot;
        if !(0.0..=1.0).contains(&bot.plausible_threshold)
            || !(0.0..=1.0).contains(&bot.confident_threshold)
            || bot.plausible_threshold > bot.confident_threshold
        {
            return Err(ConfigError::Invalid {
                key: "bot thresholds",
                reason: "need 0 <= plausible_threshold <= confident_threshold <= 1".to_string(),
            });
        }
        if bot.carousel_limit == 0 || bot.carousel_limit > crate::line::message::MAX_BUBBLES {
            return Err(ConfigError::Invalid {
                key: "bot.carousel_limit",
                reason: format!("must be between 1 and {}", crate::line::message::MAX_BUBBLES),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
