//! Application settings: audit pipeline and search backend.

use serde::{Deserialize, Serialize};

use super::pool::{WorkerPoolConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT};
use crate::core::DEFAULT_WRITE_TIMEOUT;

/// Service name stamped on every audit event and used as the message key.
pub const SERVICE_NAME: &str = "mine";

/// Deployment environment, selects broker and topic defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Local/dev cluster.
    Dev,
    /// Staging.
    #[default]
    Staging,
    /// Production.
    Production,
}

impl Environment {
    /// Resolve from the two deployment flags. `is_dev` wins over `use_production`.
    #[must_use]
    pub const fn from_flags(use_production: bool, is_dev: bool) -> Self {
        if is_dev {
            Self::Dev
        } else if use_production {
            Self::Production
        } else {
            Self::Staging
        }
    }

    /// Bootstrap brokers for this environment.
    #[must_use]
    pub fn default_brokers(self) -> Vec<String> {
        let brokers: &[&str] = match self {
            Self::Dev => &["kafka-1:19092", "kafka-2:29092", "kafka-3:39092"],
            Self::Staging | Self::Production => &["isc-kafka01:9092", "isc-kafka02:9092", "isc-kafka03:9092"],
        };
        brokers.iter().map(ToString::to_string).collect()
    }

    /// Shared cross-service topic.
    #[must_use]
    pub const fn summary_topic(self) -> &'static str {
        match self {
            Self::Dev => "dev-mine",
            Self::Staging => "stag-mine",
            Self::Production => "mine",
        }
    }

    /// Per-service detailed topic.
    #[must_use]
    pub const fn detailed_topic(self) -> &'static str {
        match self {
            Self::Dev => "dev-mine-log",
            Self::Staging => "stag-mine-log",
            Self::Production => "mine-log",
        }
    }
}

/// Audit pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Persistent worker count.
    pub worker_count: usize,
    /// Pending task slots.
    pub queue_capacity: usize,
    /// Kafka bootstrap brokers.
    pub brokers: Vec<String>,
    /// Per-service detailed topic.
    pub detailed_topic: String,
    /// Shared summary topic.
    pub summary_topic: String,
    /// Deadline for connect + write of one message, in seconds.
    pub write_timeout_secs: u64,
    /// Key attached to every message.
    pub message_key: String,
    /// Service name stamped on events.
    pub service_name: String,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl AuditSettings {
    /// Defaults for `env`.
    #[must_use]
    pub fn for_environment(env: Environment) -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            brokers: env.default_brokers(),
            detailed_topic: env.detailed_topic().to_string(),
            summary_topic: env.summary_topic().to_string(),
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT.as_secs(),
            message_key: SERVICE_NAME.to_string(),
            service_name: SERVICE_NAME.to_string(),
        }
    }

    /// Pool sizing derived from these settings.
    #[must_use]
    pub fn pool_config(&self) -> WorkerPoolConfig {
        WorkerPoolConfig::new()
            .with_worker_count(self.worker_count)
            .with_queue_capacity(self.queue_capacity)
    }

    /// Validate the audit settings.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        self.pool_config().validate()?;
        if self.brokers.is_empty() || self.brokers.iter().any(|b| b.trim().is_empty()) {
            return Err("brokers must be a non-empty list of addresses".into());
        }
        if self.detailed_topic.is_empty() {
            return Err("detailed_topic must not be empty".into());
        }
        if self.summary_topic.is_empty() {
            return Err("summary_topic must not be empty".into());
        }
        if self.write_timeout_secs == 0 {
            return Err("write_timeout_secs must be greater than 0".into());
        }
        if self.service_name.is_empty() {
            return Err("service_name must not be empty".into());
        }
        Ok(())
    }
}

/// Typesense search backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Base URL, e.g. `http://typesense-stag`.
    pub base_url: String,
    /// API key sent as `X-TYPESENSE-API-KEY`.
    pub api_key: String,
    /// Collection searched.
    pub collection: String,
    /// Fields searched.
    pub query_by: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: "http://typesense-stag".into(),
            api_key: String::new(),
            collection: "mine".into(),
            query_by: "name".into(),
            timeout_secs: 10,
        }
    }
}

impl SearchSettings {
    /// Validate the search settings.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("base_url must be an http(s) URL, got `{}`", self.base_url));
        }
        if self.collection.is_empty() {
            return Err("collection must not be empty".into());
        }
        if self.query_by.is_empty() {
            return Err("query_by must not be empty".into());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".into());
        }
        Ok(())
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Deployment environment.
    pub environment: Environment,
    /// Audit pipeline.
    pub audit: AuditSettings,
    /// Search backend.
    pub search: SearchSettings,
}

impl AppSettings {
    /// Defaults for `env`.
    #[must_use]
    pub fn for_environment(env: Environment) -> Self {
        Self {
            environment: env,
            audit: AuditSettings::for_environment(env),
            search: SearchSettings::default(),
        }
    }

    /// Parse settings from JSON. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first failure, prefixed with its section.
    pub fn validate(&self) -> Result<(), String> {
        self.audit.validate().map_err(|e| format!("audit: {e}"))?;
        self.search.validate().map_err(|e| format!("search: {e}"))?;
        Ok(())
    }
}
