//! Response status table.

use serde_json::Value;

use crate::core::Outcome;

/// Status codes returned in [`Resp`](super::Resp).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Success.
    Ok,
    /// Input accepted but refused by a business rule.
    Rejected,
    /// Malformed or missing parameters.
    Params,
    /// A downstream call failed.
    CallFail,
    /// Processing error.
    ErrorAccess,
}

impl Status {
    /// Numeric code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => 1,
            Self::Rejected => 0,
            Self::Params => 400,
            Self::CallFail => 300,
            Self::ErrorAccess => 301,
        }
    }

    /// Default message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Ok => "Ok",
            Self::Rejected => "Request rejected",
            Self::Params => "Invalid parameters",
            Self::CallFail => "The system is busy, please try again in a few minutes",
            Self::ErrorAccess => "An error occurred while processing, please try again in a few minutes",
        }
    }

    /// Outcome with the default message and no detail.
    #[must_use]
    pub fn outcome(self) -> Outcome {
        self.outcome_with(self.message())
    }

    /// Outcome with a custom message and no detail.
    #[must_use]
    pub fn outcome_with(self, message: impl Into<String>) -> Outcome {
        Outcome {
            status: self.code(),
            message: message.into(),
            detail: Value::Null,
        }
    }
}
