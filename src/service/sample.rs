//! Sample action service.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::ServiceError;

/// Backend of the `do_func_sample` action.
#[async_trait]
pub trait SampleService: Send + Sync {
    /// Run the sample function for an already validated phone and mail.
    async fn do_func_sample(&self, phone: &str, mail: &str) -> Result<Value, ServiceError>;
}

/// Returns its input back as the result.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoSampleService;

#[async_trait]
impl SampleService for EchoSampleService {
    async fn do_func_sample(&self, phone: &str, mail: &str) -> Result<Value, ServiceError> {
        Ok(json!({ "phone": phone, "mail": mail }))
    }
}
