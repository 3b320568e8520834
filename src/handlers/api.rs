//! Wire types of the action endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Identity, Outcome, PoolStats, RequestMeta};

/// Response envelope returned for every action call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resp {
    /// Status code.
    pub status: i32,
    /// Human-readable message.
    pub msg: String,
    /// Result payload, `null` on failure.
    #[serde(default)]
    pub detail: Value,
}

impl From<&Outcome> for Resp {
    fn from(outcome: &Outcome) -> Self {
        Self {
            status: outcome.status,
            msg: outcome.message.clone(),
            detail: outcome.detail.clone(),
        }
    }
}

/// Identity claims extracted from an already verified token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthClaims {
    /// Customer id.
    pub customer_id: Option<String>,
    /// Customer phone.
    pub customer_phone: Option<String>,
    /// Client app version.
    pub app_version: Option<String>,
}

impl From<AuthClaims> for Identity {
    fn from(claims: AuthClaims) -> Self {
        Self {
            customer_id: claims.customer_id,
            phone: claims.customer_phone,
            app_version: claims.app_version,
        }
    }
}

/// Body of an action call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Action name.
    pub type_request: String,
    /// Action input.
    #[serde(default)]
    pub data: Value,
}

/// One inbound call as seen by the handler, after authentication.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// Full request URL.
    pub url: String,
    /// `TOKEN` header.
    pub token: String,
    /// `User-Agent` header.
    pub user_agent: String,
    /// Caller IP.
    pub client_ip: String,
    /// Verified identity claims.
    pub claims: AuthClaims,
    /// Raw JSON body.
    pub body: Vec<u8>,
}

impl InboundRequest {
    /// Split into transport facts and caller identity.
    pub(crate) fn into_parts(self) -> (RequestMeta, Identity, Vec<u8>) {
        let meta = RequestMeta {
            url: self.url,
            token: self.token,
            user_agent: self.user_agent,
            client_ip: self.client_ip,
        };
        (meta, self.claims.into(), self.body)
    }
}

/// Liveness payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    /// Whether the audit pipeline still accepts work.
    pub ok: bool,
    /// Audit pool counters.
    pub audit: PoolStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resp_uses_pascal_case() {
        let resp = Resp {
            status: 1,
            msg: "Ok".into(),
            detail: json!({"a": 1}),
        };
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"Status": 1, "Msg": "Ok", "Detail": {"a": 1}})
        );
    }

    #[test]
    fn test_action_request_without_data() {
        let req: ActionRequest = serde_json::from_str(r#"{"type_request": "search_text"}"#).unwrap();
        assert_eq!(req.type_request, "search_text");
        assert_eq!(req.data, Value::Null);
    }

    #[test]
    fn test_claims_become_identity() {
        let identity: Identity = AuthClaims {
            customer_id: Some("c-1".into()),
            customer_phone: Some("0912345678".into()),
            app_version: None,
        }
        .into();
        assert_eq!(identity.phone(), "0912345678");
        assert_eq!(identity.app_version(), "");
    }
}
