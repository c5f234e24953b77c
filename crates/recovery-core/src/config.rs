//! Startup configuration and backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::db::SqliteDataSource;
use crate::store::{DataSource, InMemoryDataSource, StoreError};
use crate::supabase::{SupabaseClient, SupabaseConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnv(String),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to open data source: {0}")]
    Connect(#[from] StoreError),
}

/// Which [`DataSource`] implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Memory,
    Sqlite,
    Supabase,
}

impl DataSourceKind {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mock" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "supabase" => Ok(Self::Supabase),
            other => Err(ConfigError::InvalidValue {
                key: "RECOVERY_DATA_SOURCE".to_string(),
                message: format!("unsupported data source '{other}'"),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Supabase => "supabase",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_source: DataSourceKind,
    pub sqlite_path: PathBuf,
    /// Seed the in-memory or empty SQLite store with the mock data set.
    pub seed_mock_data: bool,
    /// `tracing` filter directive.
    pub log_filter: String,
    /// Present only when `data_source` is Supabase.
    pub supabase: Option<SupabaseConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_source: DataSourceKind::Memory,
            sqlite_path: PathBuf::from("recovery.db"),
            seed_mock_data: true,
            log_filter: "info".to_string(),
            supabase: None,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to load .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_source = match get("RECOVERY_DATA_SOURCE") {
            Some(raw) => DataSourceKind::parse(&raw)?,
            None => defaults.data_source,
        };
        let seed_mock_data = match get("RECOVERY_SEED_MOCK_DATA") {
            Some(raw) => parse_bool("RECOVERY_SEED_MOCK_DATA", &raw)?,
            None => defaults.seed_mock_data,
        };
        let supabase = match data_source {
            DataSourceKind::Supabase => Some(SupabaseConfig::from_lookup(&lookup)?),
            _ => None,
        };

        Ok(Self {
            data_source,
            sqlite_path: get("RECOVERY_SQLITE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.sqlite_path),
            seed_mock_data,
            log_filter: get("RECOVERY_LOG").unwrap_or(defaults.log_filter),
            supabase,
        })
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Build the configured backend. Call once at startup.
pub fn connect(config: &AppConfig) -> Result<Arc<dyn DataSource>, ConfigError> {
    let source: Arc<dyn DataSource> = match config.data_source {
        DataSourceKind::Memory => {
            if config.seed_mock_data {
                Arc::new(InMemoryDataSource::seeded())
            } else {
                Arc::new(InMemoryDataSource::new())
            }
        }
        DataSourceKind::Sqlite => {
            let source = SqliteDataSource::open(&config.sqlite_path)?;
            if config.seed_mock_data {
                source.seed_mock_data()?;
            }
            Arc::new(source)
        }
        DataSourceKind::Supabase => {
            let supabase = config
                .supabase
                .clone()
                .ok_or_else(|| ConfigError::MissingEnv(crate::supabase::URL_ENV.to_string()))?;
            Arc::new(SupabaseClient::browser(supabase))
        }
    };
    tracing::info!(backend = source.backend_name(), "Data source selected");
    Ok(source)
}
