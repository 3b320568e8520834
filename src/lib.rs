//! # Mine Search
//!
//! Request backend for the `mine` service with an asynchronous, bounded audit
//! pipeline.
//!
//! Every action call produces two audit events: a detailed record for the
//! service's own topic and a summary record for the shared cross-service topic.
//! Publishing them must never slow down or fail the call, so the handler only
//! queues them on a fixed-size [`WorkerPool`](core::WorkerPool) and returns.
//!
//! ## Key Properties
//!
//! - **Bounded**: `W` workers and `C` queue slots. At most `W + C` tasks are
//!   ever held; the next submission is rejected immediately.
//! - **Non-blocking submission**: `execute` never waits for a slot.
//! - **Fault isolation**: a failing or panicking task is logged and counted;
//!   the worker keeps serving.
//! - **Bounded publishes**: one connection per message, connect and write under
//!   a single deadline, close always attempted.
//!
//! ## Worker Pool
//!
//! ```rust,ignore
//! use mine_search::core::{Task, TaskError, WorkerPool};
//!
//! let pool = WorkerPool::with_capacity(50, 100_000)?;
//! pool.execute(my_task)?;          // Err(PoolError::CapacityExceeded) when full
//! println!("{:?}", pool.stats());
//! pool.shutdown();
//! ```
//!
//! ## Request Handling
//!
//! ```rust,ignore
//! use mine_search::builders::build_request_handler;
//! use mine_search::config::ConfigLoader;
//! use mine_search::util::init_tracing;
//!
//! init_tracing();
//! let settings = ConfigLoader::new().load()?;
//! let handler = build_request_handler(&settings)?;
//! let resp = handler.handle(request).await;
//! ```
//!
//! For complete examples, see:
//! - `tests/worker_pool_test.rs` - pool capacity and fault isolation
//! - `tests/audit_pipeline_test.rs` - end-to-end audit publishing

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Worker pool, tasks, publishing and audit events.
pub mod core;
/// Configuration models for the pool, audit pipeline and search backend.
pub mod config;
/// Builders to construct the pipeline and handler from configuration.
pub mod builders;
/// Action endpoint handlers.
pub mod handlers;
/// Broker backends.
pub mod infra;
/// Business services behind the actions.
pub mod service;
/// Shared utilities.
pub mod util;
