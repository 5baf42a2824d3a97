//! Scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable holding the worker count.
pub const ENV_WORKER_COUNT: &str = "TASK_ENGINE_WORKER_COUNT";
/// Environment variable holding the idle delay in milliseconds.
pub const ENV_IDLE_DELAY_MS: &str = "TASK_ENGINE_IDLE_DELAY_MS";
/// Environment variable holding the thread name prefix.
pub const ENV_THREAD_PREFIX: &str = "TASK_ENGINE_THREAD_PREFIX";
/// Environment variable holding the thread stack size in bytes.
pub const ENV_THREAD_STACK_SIZE: &str = "TASK_ENGINE_THREAD_STACK_SIZE";

const DEFAULT_IDLE_DELAY_MS: u64 = 100;
const DEFAULT_THREAD_PREFIX: &str = "task-engine";

fn default_worker_count() -> usize {
    num_cpus::get()
}

const fn default_idle_delay_ms() -> u64 {
    DEFAULT_IDLE_DELAY_MS
}

fn default_thread_prefix() -> String {
    DEFAULT_THREAD_PREFIX.to_string()
}

/// Construction parameters for a `Scheduler`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of worker threads executing tasks.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Backoff in milliseconds applied after an `Idle` result when the task
    /// supplies no base delay of its own.
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,
    /// Prefix for engine thread names.
    #[serde(default = "default_thread_prefix")]
    pub thread_name_prefix: String,
    /// Stack size for engine threads; platform default when unset.
    #[serde(default)]
    pub thread_stack_size: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerConfig {
    /// Defaults: one worker per CPU, 100ms idle delay.
    #[must_use]
    pub fn new() -> Self {
        Self {
            worker_count: default_worker_count(),
            idle_delay_ms: DEFAULT_IDLE_DELAY_MS,
            thread_name_prefix: default_thread_prefix(),
            thread_stack_size: None,
        }
    }

    /// Set the number of worker threads.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the idle backoff.
    #[must_use]
    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the thread stack size in bytes.
    #[must_use]
    pub fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = Some(bytes);
        self
    }

    /// Idle backoff as a `Duration`.
    #[must_use]
    pub const fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        if self.thread_stack_size == Some(0) {
            return Err("thread_stack_size must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation error message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading a `.env`
    /// file first when one is present. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a message naming the variable that failed to parse, or a
    /// validation error.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is fine; variables may come from the real environment.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from the `TASK_ENGINE_*` keys resolved by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the key that failed to parse, or a
    /// validation error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::new();
        if let Some(raw) = lookup(ENV_WORKER_COUNT) {
            cfg.worker_count = parse_key(ENV_WORKER_COUNT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_IDLE_DELAY_MS) {
            cfg.idle_delay_ms = parse_key(ENV_IDLE_DELAY_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_THREAD_PREFIX) {
            cfg.thread_name_prefix = raw;
        }
        if let Some(raw) = lookup(ENV_THREAD_STACK_SIZE) {
            cfg.thread_stack_size = Some(parse_key(ENV_THREAD_STACK_SIZE, &raw)?);
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_key<N>(key: &str, raw: &str) -> Result<N, String>
where
    N: std::str::FromStr,
    N::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("{key}: cannot parse `{raw}`: {e}"))
}
