//! Audit events and the task that publishes them.
//!
//! Two event shapes exist: a detailed per-call record for the service's own
//! topic and a fixed-field summary for the shared cross-service topic. Field
//! names are the JSON contract expected by downstream consumers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::publisher::{publish, BrokerConnector, BrokerMessage, PublishTarget};
use super::{Task, TaskError};

/// Full per-call record, destined for the per-service topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedAuditEvent {
    /// Request URL.
    pub url: String,
    /// Name of the service that handled the call.
    #[serde(rename = "mservice_name")]
    pub service_name: String,
    /// Caller user agent.
    pub user_agent: String,
    /// Action name.
    #[serde(rename = "fuc_name")]
    pub func_name: String,
    /// Inbound token.
    pub token: String,
    /// Request input as received.
    pub input: serde_json::Value,
    /// Rendered outcome (identity, status, message, detail).
    pub output: String,
    /// Elapsed seconds.
    #[serde(rename = "dt")]
    pub executed_time: f64,
    /// Capture timestamp, UTC+7.
    pub version: String,
}

/// Fixed-field record shared across services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryAuditEvent {
    /// Customer phone.
    pub phone: String,
    /// Customer id.
    pub customer_id: String,
    /// Caller IP address.
    pub ip_address: String,
    /// Reserved by the shared schema.
    pub is_canh_to: String,
    /// Reserved by the shared schema.
    pub is_customer: String,
    /// Network provider. The shared schema spells this key `orovider`.
    #[serde(rename = "orovider")]
    pub provider: String,
    /// Device id.
    pub device_id: String,
    /// Device platform.
    pub device_platform: String,
    /// Language.
    pub lang: String,
    /// Client app version.
    pub app_version: String,
    /// Contract number.
    pub contract_no: String,
    /// Location zone.
    pub location_zone: String,
    /// Location code.
    pub location_code: String,
    /// Branch name.
    pub branch_name: String,
    /// Response status code.
    pub status: i32,
    /// Service name.
    pub service_name: String,
    /// Function path, e.g. `mine/v1/`.
    pub function_name: String,
    /// Action name.
    pub action_name: String,
    /// Request URL.
    pub url: String,
    /// Action timestamp (`YYYY-MM-DD HH:MM:SS`, UTC+7).
    pub date_action: String,
    /// Reserved by the shared schema.
    pub position_icon: String,
    /// Referer.
    pub referer: String,
    /// `status:<code>,msg:<message>`.
    pub note: String,
    /// Log category.
    pub type_log: String,
    /// Elapsed seconds, six decimals.
    pub process_time: String,
    /// Topic the event was published to.
    #[serde(rename = "topic_name")]
    pub topic_name: String,
    /// Screen id.
    pub screen_id: String,
}

/// Either audit event shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuditEvent {
    /// Per-call detailed event.
    Detailed(DetailedAuditEvent),
    /// Cross-service summary event.
    Summary(SummaryAuditEvent),
}

impl AuditEvent {
    /// Short kind label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Detailed(_) => "detailed",
            Self::Summary(_) => "summary",
        }
    }

    /// Encode as newline-terminated JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

impl From<DetailedAuditEvent> for AuditEvent {
    fn from(event: DetailedAuditEvent) -> Self {
        Self::Detailed(event)
    }
}

impl From<SummaryAuditEvent> for AuditEvent {
    fn from(event: SummaryAuditEvent) -> Self {
        Self::Summary(event)
    }
}

/// Task that serializes one audit event and publishes it to one topic.
pub struct AuditTask {
    target: PublishTarget,
    key: Arc<[u8]>,
    event: AuditEvent,
    connector: Arc<dyn BrokerConnector>,
    write_timeout: Duration,
}

impl AuditTask {
    /// Build a task. The event is serialized only when a worker runs it.
    pub fn new(
        target: PublishTarget,
        key: Arc<[u8]>,
        event: impl Into<AuditEvent>,
        connector: Arc<dyn BrokerConnector>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            target,
            key,
            event: event.into(),
            connector,
            write_timeout,
        }
    }

    /// The event carried by this task.
    #[must_use]
    pub const fn event(&self) -> &AuditEvent {
        &self.event
    }

    /// Destination of this task.
    #[must_use]
    pub const fn target(&self) -> &PublishTarget {
        &self.target
    }
}

#[async_trait]
impl Task for AuditTask {
    fn describe(&self) -> String {
        format!("{} audit event to {}", self.event.kind(), self.target)
    }

    async fn run(&self) -> Result<(), TaskError> {
        let value = self.event.to_bytes()?;
        let message = BrokerMessage {
            key: self.key.to_vec(),
            value,
        };
        publish(self.connector.as_ref(), &self.target, message, self.write_timeout).await
    }
}
