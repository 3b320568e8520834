//! Request lifecycle: parse, dispatch, respond, audit.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info_span, warn, Instrument};

use super::actions::{ActionTag, Actions};
use super::api::{ActionRequest, Health, InboundRequest, Resp};
use super::status::Status;
use crate::core::{AuditEmitter, Outcome, PoolStats, RequestScope};

/// Handles action calls and audits every one of them.
pub struct RequestHandler {
    actions: Actions,
    emitter: Arc<AuditEmitter>,
}

impl RequestHandler {
    /// Build a handler.
    pub const fn new(actions: Actions, emitter: Arc<AuditEmitter>) -> Self {
        Self { actions, emitter }
    }

    /// Handle one call.
    ///
    /// The response never depends on the audit pipeline: audit tasks are
    /// queued after the outcome is known and their rejection is only logged.
    pub async fn handle(&self, request: InboundRequest) -> Resp {
        let (meta, identity, body) = request.into_parts();
        let scope = RequestScope::begin(meta, identity);
        let span = info_span!("request", request_id = %scope.request_id());

        async move {
            let (action, input, outcome) = self.process(&body).await;
            let resp = Resp::from(&outcome);

            let report = self.emitter.emit(scope.capture(action, input, outcome));
            if !report.all_accepted() {
                warn!(
                    detailed = ?report.detailed,
                    summary = ?report.summary,
                    "Audit events dropped"
                );
            }
            resp
        }
        .instrument(span)
        .await
    }

    // Returns the action name, the input to record, and the outcome.
    async fn process(&self, body: &[u8]) -> (String, Value, Outcome) {
        let input: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Cannot parse request body");
                let raw = Value::String(String::from_utf8_lossy(body).into_owned());
                return (String::new(), raw, Status::Params.outcome());
            }
        };

        let request = match ActionRequest::deserialize(&input) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Request body is not an action call");
                let action = input
                    .get("type_request")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                return (action, input, Status::Params.outcome());
            }
        };

        let outcome = match request.type_request.parse::<ActionTag>() {
            Ok(tag) => self.actions.dispatch(tag, &request.data).await,
            Err(e) => {
                debug!(error = %e, "Unknown action");
                Status::Params.outcome()
            }
        };
        (request.type_request, input, outcome)
    }

    /// Audit pool counters.
    #[must_use]
    pub fn audit_stats(&self) -> PoolStats {
        self.emitter.pool().stats()
    }

    /// Liveness report.
    #[must_use]
    pub fn health(&self) -> Health {
        Health {
            ok: !self.emitter.pool().is_shutdown(),
            audit: self.audit_stats(),
        }
    }
}
