//! Action table and per-action input handling.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use super::status::Status;
use crate::core::Outcome;
use crate::service::{SampleService, Search, SearchService};

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(84|0)\d{9}$").expect("phone pattern is a valid regex"));

/// Whether `phone` is a well-formed Vietnamese phone number.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

/// Closed set of supported actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionTag {
    /// `do_func_sample`
    DoFuncSample,
    /// `search_text`
    SearchText,
}

/// The action name is not in the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action `{0}`")]
pub struct UnknownAction(pub String);

impl ActionTag {
    /// Every supported action.
    pub const ALL: [Self; 2] = [Self::DoFuncSample, Self::SearchText];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DoFuncSample => "do_func_sample",
            Self::SearchText => "search_text",
        }
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionTag {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct SampleInput {
    #[serde(default)]
    phone: String,
    #[serde(default)]
    mail: String,
}

/// Runs actions against their backing services.
#[derive(Clone)]
pub struct Actions {
    sample: Arc<dyn SampleService>,
    search: Arc<dyn SearchService>,
}

impl Actions {
    /// Wire the action table to its services.
    pub fn new(sample: Arc<dyn SampleService>, search: Arc<dyn SearchService>) -> Self {
        Self { sample, search }
    }

    /// Run `tag` with `data` and report the outcome. Never fails; errors become
    /// non-`Ok` outcomes.
    pub async fn dispatch(&self, tag: ActionTag, data: &Value) -> Outcome {
        info!(action = %tag, "Dispatching action");
        let outcome = match tag {
            ActionTag::DoFuncSample => self.do_func_sample(data).await,
            ActionTag::SearchText => self.search_text(data).await,
        };
        info!(action = %tag, status = outcome.status, msg = %outcome.message, "Action finished");
        outcome
    }

    async fn do_func_sample(&self, data: &Value) -> Outcome {
        if !data.is_object() {
            return Status::Params.outcome();
        }
        let input = match SampleInput::deserialize(data) {
            Ok(input) => input,
            Err(e) => {
                error!(error = %e, "Cannot parse sample input");
                return Status::Params.outcome_with("Cannot parse input data");
            }
        };
        if input.phone.is_empty() || input.mail.is_empty() {
            return Status::Params.outcome();
        }
        if !is_valid_phone(&input.phone) {
            return Status::Rejected.outcome_with("Invalid phone number format");
        }

        match self.sample.do_func_sample(&input.phone, &input.mail).await {
            Ok(detail) => Outcome {
                detail,
                ..Status::Ok.outcome()
            },
            Err(e) => {
                error!(error = %e, "Sample service failed");
                Status::Rejected.outcome_with(e.to_string())
            }
        }
    }

    async fn search_text(&self, data: &Value) -> Outcome {
        let search = match Search::deserialize(data) {
            Ok(search) if !search.text.trim().is_empty() => search,
            Ok(_) => return Status::Params.outcome(),
            Err(e) => {
                error!(error = %e, "Cannot parse search input");
                return Status::Params.outcome();
            }
        };

        match self.search.search_text(&search).await {
            Ok(detail) => Outcome {
                detail,
                ..Status::Ok.outcome()
            },
            Err(e) => {
                error!(error = %e, text = %search.text, "Search failed");
                Status::CallFail.outcome()
            }
        }
    }
}
