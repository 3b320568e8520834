//! Audit pipeline core: tasks, worker pool, publishing and correlation data.

pub mod audit;
pub mod context;
pub mod emitter;
pub mod error;
pub mod publisher;
pub mod task;
pub mod worker_pool;

pub use audit::{AuditEvent, AuditTask, DetailedAuditEvent, SummaryAuditEvent};
pub use context::{
    CorrelationContext, Identity, Outcome, RequestMeta, RequestScope, SUMMARY_FUNCTION_NAME, SUMMARY_TYPE_LOG,
};
pub use emitter::{AuditEmitter, EmitReport};
pub use error::{AppResult, BoxError, TaskError};
pub use publisher::{
    publish, BrokerConnector, BrokerMessage, PublishTarget, TopicWriter, DEFAULT_WRITE_TIMEOUT,
};
pub use task::Task;
pub use worker_pool::{PoolError, PoolStats, WorkerPool};
