//! Error types for the task engine.

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Errors produced while constructing or wiring engine components.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An engine thread could not be spawned.
    #[error("thread spawn failed: {0}")]
    ThreadSpawn(String),
    /// An async runtime backing a task could not be built.
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Result returned by task hooks. Collaborators attach context with `anyhow`.
pub type TaskResult<T> = Result<T, anyhow::Error>;

/// A failure raised by a task while the engine was driving it.
#[derive(Debug)]
pub enum TaskFailure {
    /// The hook returned an error.
    Error(anyhow::Error),
    /// The hook panicked; carries the panic message when one was available.
    Panic(String),
}

impl TaskFailure {
    /// Build a failure from a payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panic(message)
    }

    /// Whether the failure was a panic rather than a returned error.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panic(_))
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(err) => write!(f, "task error: {err:#}"),
            Self::Panic(msg) => write!(f, "task panicked: {msg}"),
        }
    }
}

impl From<anyhow::Error> for TaskFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::Error(err)
    }
}
