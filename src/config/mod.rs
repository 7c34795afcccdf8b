//! Configuration module for the OCR service

use serde::Deserialize;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use std::path::PathBuf;

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub quota: QuotaSettings,
    pub database: DatabaseSettings,
    pub ocr: OcrSettings,
    #[serde(default)]
    pub frontend: FrontendSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Where the daily usage counter is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaStoreKind {
    Postgres,
    /// Process-local, for local runs and tests only
    Memory,
}

/// Daily quota configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaSettings {
    pub daily_limit: u32,
    /// Bypass the quota gate entirely (local/test runs)
    pub disabled: bool,
    pub store: QuotaStoreKind,
    pub counter_key: String,
    pub timeout_ms: u64,
}

/// Database configuration for PostgreSQL
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
}

/// OCR engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OcrSettings {
    /// Tesseract language code used when a request carries no override
    pub language: String,
    pub tesseract_path: PathBuf,
    pub timeout_secs: u64,
    pub max_upload_bytes: usize,
}

/// Pre-built single-page-app bundle
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontendSettings {
    pub dist: Option<PathBuf>,
}

/// Flat variables used by the original deployment, mapped onto settings keys
const LEGACY_ENV: &[(&str, &str)] = &[
    ("DAILY_LIMIT", "quota.daily_limit"),
    ("OCR_LANGUAGE", "ocr.language"),
    ("FRONTEND_DIST", "frontend.dist"),
    ("PORT", "server.port"),
    ("DATABASE_URL", "database.url"),
];

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Flat variables (DAILY_LIMIT, OCR_LANGUAGE, DISABLE_QUOTA, FRONTEND_DIST, PORT, DATABASE_URL)
    /// 2. Environment variables prefixed with OCR__ (OCR__QUOTA__DAILY_LIMIT, etc.)
    /// 3. config/local.toml (gitignored)
    /// 4. config/default.toml
    /// 5. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let mut builder = Self::with_defaults(Config::builder())?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("OCR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
            );

        for (var, key) in LEGACY_ENV {
            let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        if let Ok(raw) = std::env::var("DISABLE_QUOTA") {
            builder = builder.set_override("quota.disabled", is_truthy(&raw))?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn with_defaults(builder: ConfigBuilder<DefaultState>) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = Settings::default();
        builder
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("quota.daily_limit", defaults.quota.daily_limit as i64)?
            .set_default("quota.disabled", defaults.quota.disabled)?
            .set_default("quota.store", "postgres")?
            .set_default("quota.counter_key", defaults.quota.counter_key)?
            .set_default("quota.timeout_ms", defaults.quota.timeout_ms as i64)?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", 10_i64)?
            .set_default("ocr.language", defaults.ocr.language)?
            .set_default("ocr.tesseract_path", "tesseract")?
            .set_default("ocr.timeout_secs", defaults.ocr.timeout_secs as i64)?
            .set_default("ocr.max_upload_bytes", defaults.ocr.max_upload_bytes as i64)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quota.daily_limit == 0 {
            return Err(ConfigError::Message("quota.daily_limit must be at least 1".into()));
        }
        if self.quota.timeout_ms == 0 {
            return Err(ConfigError::Message("quota.timeout_ms must be positive".into()));
        }
        if self.ocr.language.trim().is_empty() {
            return Err(ConfigError::Message("ocr.language must not be empty".into()));
        }
        if self.ocr.timeout_secs == 0 {
            return Err(ConfigError::Message("ocr.timeout_secs must be positive".into()));
        }
        if !self.quota.disabled
            && self.quota.store == QuotaStoreKind::Postgres
            && self.database.url.trim().is_empty()
        {
            return Err(ConfigError::Message(
                "database.url (DATABASE_URL) is required when the quota uses the postgres store".into(),
            ));
        }
        Ok(())
    }
}

/// `1`, `true` and `yes` (any case, surrounding whitespace ignored) enable a flag
pub fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: None,
            },
            quota: QuotaSettings {
                daily_limit: 2,
                disabled: false,
                store: QuotaStoreKind::Postgres,
                counter_key: "usage".to_string(),
                timeout_ms: 5_000,
            },
            database: DatabaseSettings {
                url: String::new(),
                max_connections: Some(10),
            },
            ocr: OcrSettings {
                language: "tel".to_string(),
                tesseract_path: PathBuf::from("tesseract"),
                timeout_secs: 60,
                max_upload_bytes: 20 * 1024 * 1024,
            },
            frontend: FrontendSettings::default(),
        }
    }
}
