//! Environment-driven settings loader.
//!
//! Variables are read from `app.env` (if present) and the process environment.
//! Process variables win over file entries because `dotenvy` never overrides
//! what is already set.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info};

use super::settings::{AppSettings, Environment};

/// Default env file name, looked up in the working directory.
pub const DEFAULT_ENV_FILE: &str = "app.env";

/// Settings loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The env file exists but could not be read or parsed.
    #[error("failed to load env file {path}: {source}")]
    EnvFile {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: dotenvy::Error,
    },
    /// A variable is set but cannot be parsed.
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The assembled settings failed validation.
    #[error("invalid settings: {0}")]
    Invalid(String),
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Loads [`AppSettings`] from environment variables.
pub struct ConfigLoader {
    env_file: Option<PathBuf>,
    lookup: Lookup,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader over `app.env` and the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env_file: Some(PathBuf::from(DEFAULT_ENV_FILE)),
            lookup: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Loader over an injected lookup; no env file is read.
    #[must_use]
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            env_file: None,
            lookup: Box::new(lookup),
        }
    }

    /// Read `path` instead of `app.env`.
    #[must_use]
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Build and validate the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the env file is unreadable, a variable does
    /// not parse, or the result fails validation.
    pub fn load(&self) -> Result<AppSettings, ConfigError> {
        self.load_env_file()?;

        let use_production = self.flag("USE_PRODUCTION")?;
        let is_dev = self.flag("IS_DEV")?;
        let env = Environment::from_flags(use_production, is_dev);
        let mut settings = AppSettings::for_environment(env);

        if let Some(brokers) = self.var("KAFKA_BROKERS") {
            settings.audit.brokers = brokers
                .split(',')
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if let Some(topic) = self.var("KAFKA_TOPIC_NAME") {
            settings.audit.detailed_topic = topic;
        }
        if let Some(topic) = self.var("KAFKA_TOPIC_NAME_ALL") {
            settings.audit.summary_topic = topic;
        }
        if let Some(v) = self.parsed("AUDIT_WORKER_COUNT")? {
            settings.audit.worker_count = v;
        }
        if let Some(v) = self.parsed("AUDIT_QUEUE_CAPACITY")? {
            settings.audit.queue_capacity = v;
        }
        if let Some(v) = self.parsed("AUDIT_WRITE_TIMEOUT_SECS")? {
            settings.audit.write_timeout_secs = v;
        }

        if let Some(url) = self.var("TYPESENSE_URL") {
            settings.search.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = self.var("TYPESENSE_KEY") {
            settings.search.api_key = key;
        }
        if let Some(collection) = self.var("TYPESENSE_COLLECTION") {
            settings.search.collection = collection;
        }
        if let Some(query_by) = self.var("TYPESENSE_QUERY_BY") {
            settings.search.query_by = query_by;
        }

        settings.validate().map_err(ConfigError::Invalid)?;

        info!(
            environment = ?settings.environment,
            brokers = ?settings.audit.brokers,
            detailed_topic = %settings.audit.detailed_topic,
            summary_topic = %settings.audit.summary_topic,
            workers = settings.audit.worker_count,
            queue_capacity = settings.audit.queue_capacity,
            "Loaded settings"
        );
        Ok(settings)
    }

    fn load_env_file(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.env_file else {
            return Ok(());
        };
        match dotenvy::from_filename(path) {
            Ok(loaded) => {
                debug!(path = %loaded.display(), "Loaded env file");
                Ok(())
            }
            Err(err) if err.not_found() => {
                debug!(path = %path.display(), "No env file, using process environment");
                Ok(())
            }
            Err(source) => Err(ConfigError::EnvFile {
                path: path.clone(),
                source,
            }),
        }
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.var(key)
            .map(|value| {
                value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                    key,
                    reason: e.to_string(),
                    value,
                })
            })
            .transpose()
    }

    // Numeric flags: any non-zero integer is true.
    fn flag(&self, key: &'static str) -> Result<bool, ConfigError> {
        let Some(value) = self.var(key) else {
            return Ok(false);
        };
        match value.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => other.parse::<i64>().map(|n| n != 0).map_err(|_| ConfigError::InvalidValue {
                key,
                reason: "expected an integer or true/false".into(),
                value,
            }),
        }
    }
}
