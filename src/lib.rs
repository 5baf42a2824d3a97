//! # Broker Task Engine
//!
//! A recurring-task scheduler for message broker internals.
//!
//! Broker subsystems (queue delivery loops, message expiry sweeps, store
//! flushers) register long-lived, pollable tasks. A fixed pool of worker
//! threads runs each task whenever it is due and reschedules it from the
//! hint it returns: immediately after useful work, or after a backoff delay
//! when there was nothing to do.
//!
//! ## Key Features
//!
//! - **No Polling**: Workers park on a Condvar until the earliest task is due
//! - **Mutual Exclusion**: A task never runs on two workers at once
//! - **Ordered Mutations**: `add` / `remove` are applied by one sequencer thread
//!   in submission order
//! - **Failure Isolation**: Errors and panics in a task reach a pluggable
//!   exception handler; the task keeps running with backoff
//! - **Bounded Shutdown**: `shutdown` waits at most a fixed timeout and never
//!   hangs on a stuck task
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use broker_task_engine::builders::SchedulerBuilder;
//! use broker_task_engine::core::{FnTask, Scheduler, TaskHint};
//!
//! broker_task_engine::util::init_tracing();
//!
//! let scheduler: Scheduler = SchedulerBuilder::new().with_worker_count(2).build()?;
//! scheduler.start();
//! scheduler.add(Arc::new(FnTask::new("expiry-sweep", || Ok(TaskHint::Idle))));
//! scheduler.shutdown();
//! ```
//!
//! Async tasks can be driven through [`runtime::BlockingTask`] with the
//! `tokio-runtime` feature.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Task contract, scheduling state, and the scheduler.
pub mod core;
/// Scheduler configuration.
pub mod config;
/// Builders to construct a scheduler from configuration.
pub mod builders;
/// Adapters for running async tasks on the scheduler's threads.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
