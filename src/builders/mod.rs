//! Builders to construct the pipeline and handler from configuration.

pub mod pipeline_builder;

pub use pipeline_builder::{build_audit_emitter, build_request_handler};
