//! Thread-creation strategy for engine threads.

use std::fmt;
use std::io;
use std::thread::{self, JoinHandle};

use crate::config::SchedulerConfig;

/// Role of a thread the engine is about to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadKind {
    /// Worker executing tasks; carries the worker index.
    Worker(usize),
    /// The single thread applying add/remove requests.
    Sequencer,
}

impl fmt::Display for ThreadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Worker(idx) => write!(f, "worker-{idx}"),
            Self::Sequencer => write!(f, "sequencer"),
        }
    }
}

/// Spawns the OS threads used by a scheduler.
pub trait ThreadFactory: Send + Sync + 'static {
    /// Spawn a thread of the given kind running `body`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be created.
    fn spawn(&self, kind: ThreadKind, body: Box<dyn FnOnce() + Send + 'static>) -> io::Result<JoinHandle<()>>;
}

/// Default factory: names threads `{prefix}-{kind}` and applies an optional
/// stack size.
#[derive(Debug, Clone)]
pub struct NamedThreadFactory {
    prefix: String,
    stack_size: Option<usize>,
}

impl NamedThreadFactory {
    /// Factory naming threads with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            stack_size: None,
        }
    }

    /// Factory using the prefix and stack size from `config`.
    #[must_use]
    pub fn from_config(config: &SchedulerConfig) -> Self {
        let factory = Self::new(config.thread_name_prefix.clone());
        match config.thread_stack_size {
            Some(bytes) => factory.with_stack_size(bytes),
            None => factory,
        }
    }

    /// Spawn threads with `bytes` of stack.
    #[must_use]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Name a thread of `kind` would get.
    #[must_use]
    pub fn thread_name(&self, kind: ThreadKind) -> String {
        format!("{}-{kind}", self.prefix)
    }
}

impl ThreadFactory for NamedThreadFactory {
    fn spawn(&self, kind: ThreadKind, body: Box<dyn FnOnce() + Send + 'static>) -> io::Result<JoinHandle<()>> {
        let mut builder = thread::Builder::new().name(self.thread_name(kind));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        builder.spawn(body)
    }
}
