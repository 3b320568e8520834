//! Builders wiring the audit pipeline and the request handler from settings.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::{AppSettings, AuditSettings};
use crate::core::{AppResult, AuditEmitter, BrokerConnector, PoolError, WorkerPool};
use crate::handlers::{Actions, RequestHandler};
use crate::infra::KafkaConnector;
use crate::service::{EchoSampleService, TypesenseSearch};

/// Start a worker pool sized from `settings` and wrap it in an emitter.
///
/// # Errors
///
/// Returns [`PoolError::InvalidConfig`] for invalid settings, or
/// [`PoolError::Internal`] if a worker cannot be started.
pub fn build_audit_emitter(
    settings: &AuditSettings,
    connector: Arc<dyn BrokerConnector>,
) -> Result<AuditEmitter, PoolError> {
    settings.validate().map_err(PoolError::InvalidConfig)?;
    let pool = WorkerPool::new(settings.pool_config())?;
    info!(
        workers = settings.worker_count,
        queue_capacity = settings.queue_capacity,
        detailed_topic = %settings.detailed_topic,
        summary_topic = %settings.summary_topic,
        "Audit pipeline started"
    );
    Ok(AuditEmitter::new(Arc::new(pool), connector, settings))
}

/// Build the production handler: Kafka audit publishing, Typesense search.
///
/// # Errors
///
/// Fails when settings are invalid, the pool cannot start, or the HTTP
/// client cannot be built.
pub fn build_request_handler(settings: &AppSettings) -> AppResult<RequestHandler> {
    settings
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid settings")?;

    let emitter = build_audit_emitter(&settings.audit, Arc::new(KafkaConnector::new()))
        .context("failed to start audit pipeline")?;
    let search = TypesenseSearch::new(settings.search.clone()).context("failed to build search client")?;
    let actions = Actions::new(Arc::new(EchoSampleService), Arc::new(search));

    Ok(RequestHandler::new(actions, Arc::new(emitter)))
}
