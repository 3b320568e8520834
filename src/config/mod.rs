//! Configuration models for the worker pool, audit pipeline and search backend.

pub mod loader;
pub mod pool;
pub mod settings;

pub use loader::{ConfigError, ConfigLoader, DEFAULT_ENV_FILE};
pub use pool::WorkerPoolConfig;
pub use settings::{AppSettings, AuditSettings, Environment, SearchSettings, SERVICE_NAME};
