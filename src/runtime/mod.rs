//! Runtime adapters for async task bodies.

pub mod async_task;

pub use async_task::{AsyncTask, BlockingTask};
