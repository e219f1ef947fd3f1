//! # Portunus Executor
//!
//! Bounded worker pool with explicit admission control and graceful
//! shutdown.
//!
//! The router delegates per-request blocking work here, and the session
//! store drives its background expiry sweeps through it. Admission is the
//! pool's defining property: a submission either hands off to a free worker
//! (blocking the submitter — back-pressure), waits in a bounded queue, or
//! is rejected loudly. Nothing queues unboundedly and nothing is dropped
//! silently.
//!
//! - [`Executor`] - the pool itself
//! - [`ExecutorConfig`] / [`QueuePolicy`] - worker count, queue policy,
//!   keep-alive
//! - [`ShutdownReport`] - what completed, what panicked, what was abandoned
//! - [`ShutdownSignal`] - cooperative stop signal for background tasks

#![doc(html_root_url = "https://docs.rs/portunus-executor/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod executor;
mod shutdown;

pub use executor::{Executor, ExecutorConfig, QueuePolicy, ShutdownReport, TaskId};
pub use shutdown::ShutdownSignal;
