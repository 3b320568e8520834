//! Handler-facing entry point of the audit pipeline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::audit::AuditTask;
use super::context::CorrelationContext;
use super::publisher::{BrokerConnector, PublishTarget};
use super::worker_pool::{PoolError, WorkerPool};
use crate::config::AuditSettings;

/// Submission result for the two audit tasks of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitReport {
    /// Outcome of submitting the detailed event.
    pub detailed: Result<(), PoolError>,
    /// Outcome of submitting the summary event.
    pub summary: Result<(), PoolError>,
}

impl EmitReport {
    /// Both tasks were accepted by the pool.
    #[must_use]
    pub const fn all_accepted(&self) -> bool {
        self.detailed.is_ok() && self.summary.is_ok()
    }
}

/// Turns a captured request into audit tasks and submits them.
///
/// Submission never blocks and never fails the request: rejections are logged
/// and reported back in the [`EmitReport`] for callers that care.
pub struct AuditEmitter {
    pool: Arc<WorkerPool>,
    connector: Arc<dyn BrokerConnector>,
    detailed_target: PublishTarget,
    summary_target: PublishTarget,
    service_name: String,
    key: Arc<[u8]>,
    write_timeout: Duration,
}

impl AuditEmitter {
    /// Build an emitter over a shared pool and connector.
    pub fn new(pool: Arc<WorkerPool>, connector: Arc<dyn BrokerConnector>, settings: &AuditSettings) -> Self {
        Self {
            pool,
            connector,
            detailed_target: PublishTarget::new(settings.brokers.clone(), settings.detailed_topic.clone()),
            summary_target: PublishTarget::new(settings.brokers.clone(), settings.summary_topic.clone()),
            service_name: settings.service_name.clone(),
            key: Arc::from(settings.message_key.as_bytes()),
            write_timeout: Duration::from_secs(settings.write_timeout_secs),
        }
    }

    /// The pool tasks are submitted to.
    #[must_use]
    pub const fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Submit the detailed and the summary event for `ctx`.
    ///
    /// The two submissions are independent: a rejection of the first does not
    /// prevent the second.
    pub fn emit(&self, ctx: CorrelationContext) -> EmitReport {
        let detailed = self.submit(
            &ctx,
            AuditTask::new(
                self.detailed_target.clone(),
                Arc::clone(&self.key),
                ctx.detailed_event(&self.service_name),
                Arc::clone(&self.connector),
                self.write_timeout,
            ),
        );

        let summary = self.submit(
            &ctx,
            AuditTask::new(
                self.summary_target.clone(),
                Arc::clone(&self.key),
                ctx.summary_event(&self.service_name, &self.summary_target.topic),
                Arc::clone(&self.connector),
                self.write_timeout,
            ),
        );

        EmitReport { detailed, summary }
    }

    fn submit(&self, ctx: &CorrelationContext, task: AuditTask) -> Result<(), PoolError> {
        let kind = task.event().kind();
        let topic = task.target().topic.clone();
        match self.pool.execute(task) {
            Ok(()) => {
                debug!(request_id = %ctx.request_id(), kind = kind, topic = %topic, "Audit task queued");
                Ok(())
            }
            Err(err) => {
                warn!(
                    request_id = %ctx.request_id(),
                    action = ctx.action(),
                    kind = kind,
                    topic = %topic,
                    error = %err,
                    "Failed to submit audit task"
                );
                Err(err)
            }
        }
    }
}
