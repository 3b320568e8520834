//! Action endpoint: request parsing, dispatch and response envelope.

pub mod actions;
pub mod api;
pub mod request;
pub mod status;

pub use actions::{is_valid_phone, ActionTag, Actions, UnknownAction};
pub use api::{ActionRequest, AuthClaims, Health, InboundRequest, Resp};
pub use request::RequestHandler;
pub use status::Status;
