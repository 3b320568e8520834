//! Request-scoped correlation data captured for auditing.
//!
//! A [`RequestScope`] is opened when a request arrives and owned by the
//! handler. Once the response is known it is consumed by
//! [`RequestScope::capture`], which freezes everything into a read-only
//! [`CorrelationContext`] and computes the elapsed time from a monotonic clock.

use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use uuid::Uuid;

use super::audit::{DetailedAuditEvent, SummaryAuditEvent};
use crate::util::clock::{format_date_action, format_version, now_utc7};

/// Log category stamped on summary events.
pub const SUMMARY_TYPE_LOG: &str = "Webkit";

/// Function name stamped on summary events; consumers match on it verbatim.
pub const SUMMARY_FUNCTION_NAME: &str = "mine/v1/";

/// Caller identity taken from already-validated authentication data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// Customer id.
    pub customer_id: Option<String>,
    /// Customer phone.
    pub phone: Option<String>,
    /// Client app version.
    pub app_version: Option<String>,
}

impl Identity {
    /// Customer id, or `""` when absent.
    #[must_use]
    pub fn customer_id(&self) -> &str {
        self.customer_id.as_deref().unwrap_or_default()
    }

    /// Phone, or `""` when absent.
    #[must_use]
    pub fn phone(&self) -> &str {
        self.phone.as_deref().unwrap_or_default()
    }

    /// App version, or `""` when absent.
    #[must_use]
    pub fn app_version(&self) -> &str {
        self.app_version.as_deref().unwrap_or_default()
    }
}

/// Transport-level facts about the inbound call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    /// Full request URL.
    pub url: String,
    /// Inbound token header.
    pub token: String,
    /// User agent header.
    pub user_agent: String,
    /// Caller IP address.
    pub client_ip: String,
}

/// Response facts recorded in the audit events.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Response status code.
    pub status: i32,
    /// Response message.
    pub message: String,
    /// Response payload.
    pub detail: Value,
}

/// Open, handler-owned scope of one request.
#[derive(Debug)]
pub struct RequestScope {
    request_id: Uuid,
    started: Instant,
    started_at: DateTime<FixedOffset>,
    meta: RequestMeta,
    identity: Identity,
}

impl RequestScope {
    /// Open a scope; call this first thing on request entry.
    #[must_use]
    pub fn begin(meta: RequestMeta, identity: Identity) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            started: Instant::now(),
            started_at: now_utc7(),
            meta,
            identity,
        }
    }

    /// Correlation id of this request.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Identity carried by this scope.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Freeze the scope. Elapsed time is measured here.
    #[must_use]
    pub fn capture(self, action: impl Into<String>, input: Value, outcome: Outcome) -> CorrelationContext {
        CorrelationContext {
            request_id: self.request_id,
            elapsed: self.started.elapsed(),
            started_at: self.started_at,
            captured_at: now_utc7(),
            meta: self.meta,
            identity: self.identity,
            action: action.into(),
            input,
            outcome,
        }
    }
}

/// Frozen snapshot of one request, ready to become audit events.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationContext {
    request_id: Uuid,
    elapsed: Duration,
    started_at: DateTime<FixedOffset>,
    captured_at: DateTime<FixedOffset>,
    meta: RequestMeta,
    identity: Identity,
    action: String,
    input: Value,
    outcome: Outcome,
}

impl CorrelationContext {
    /// Correlation id.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Time between scope open and capture.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Wall-clock request start (UTC+7).
    #[must_use]
    pub const fn started_at(&self) -> DateTime<FixedOffset> {
        self.started_at
    }

    /// Transport facts.
    #[must_use]
    pub const fn meta(&self) -> &RequestMeta {
        &self.meta
    }

    /// Caller identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Action name.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Request input.
    #[must_use]
    pub const fn input(&self) -> &Value {
        &self.input
    }

    /// Response outcome.
    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Elapsed time as rendered in summary events (seconds, six decimals).
    #[must_use]
    pub fn process_time(&self) -> String {
        format!("{:.6}", self.elapsed.as_secs_f64())
    }

    /// Build the detailed event for the per-service topic.
    #[must_use]
    pub fn detailed_event(&self, service_name: &str) -> DetailedAuditEvent {
        DetailedAuditEvent {
            url: self.meta.url.clone(),
            service_name: service_name.to_string(),
            user_agent: self.meta.user_agent.clone(),
            func_name: self.action.clone(),
            token: self.meta.token.clone(),
            input: self.input.clone(),
            output: format!(
                "(customerId {}, customerPhone {}) --> status {}, msg {}, detail {}",
                self.identity.customer_id(),
                self.identity.phone(),
                self.outcome.status,
                self.outcome.message,
                self.outcome.detail,
            ),
            executed_time: self.elapsed.as_secs_f64(),
            version: format_version(&self.captured_at),
        }
    }

    /// Build the summary event for the shared topic `topic`.
    #[must_use]
    pub fn summary_event(&self, service_name: &str, topic: &str) -> SummaryAuditEvent {
        SummaryAuditEvent {
            phone: self.identity.phone().to_string(),
            customer_id: self.identity.customer_id().to_string(),
            ip_address: self.meta.client_ip.clone(),
            app_version: self.identity.app_version().to_string(),
            status: self.outcome.status,
            service_name: service_name.to_string(),
            function_name: SUMMARY_FUNCTION_NAME.to_string(),
            action_name: self.action.clone(),
            url: self.meta.url.clone(),
            date_action: format_date_action(&self.captured_at),
            note: format!("status:{},msg:{}", self.outcome.status, self.outcome.message),
            type_log: SUMMARY_TYPE_LOG.to_string(),
            process_time: self.process_time(),
            topic_name: topic.to_string(),
            ..SummaryAuditEvent::default()
        }
    }
}
