//! Tests for builder modules

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use broker_task_engine::builders::SchedulerBuilder;
use broker_task_engine::config::SchedulerConfig;
use broker_task_engine::core::{EngineError, FnTask, Scheduler, TaskFailure, ThreadFactory, ThreadKind};

#[test]
fn test_scheduler_builder_defaults() {
    let builder: SchedulerBuilder = SchedulerBuilder::new();
    assert_eq!(builder.config(), &SchedulerConfig::new());
}

#[test]
fn test_scheduler_builder_from_config() {
    let config = SchedulerConfig::new()
        .with_worker_count(5)
        .with_thread_name_prefix("store");
    let builder: SchedulerBuilder = SchedulerBuilder::from_config(config.clone());
    assert_eq!(builder.config(), &config);
}

#[test]
fn test_scheduler_builder_rejects_invalid_config() {
    let result: Result<Scheduler, EngineError> = SchedulerBuilder::new().with_worker_count(0).build();
    assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
}

struct CountingFactory {
    spawned: Arc<AtomicUsize>,
}

impl ThreadFactory for CountingFactory {
    fn spawn(&self, kind: ThreadKind, body: Box<dyn FnOnce() + Send + 'static>) -> io::Result<JoinHandle<()>> {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        thread::Builder::new().name(format!("custom-{kind}")).spawn(body)
    }
}

#[test]
fn test_scheduler_builder_uses_thread_factory() {
    let spawned = Arc::new(AtomicUsize::new(0));
    let scheduler: Scheduler = SchedulerBuilder::new()
        .with_worker_count(3)
        .with_thread_factory(CountingFactory {
            spawned: Arc::clone(&spawned),
        })
        .build()
        .unwrap();

    // Sequencer only.
    assert_eq!(spawned.load(Ordering::SeqCst), 1);

    scheduler.start();
    assert_eq!(spawned.load(Ordering::SeqCst), 4);
    assert_eq!(scheduler.stats().worker_count, 3);

    assert!(scheduler.shutdown_within(Duration::from_secs(5)));
}

#[test]
fn test_scheduler_builder_installs_exception_handler() {
    let failures = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&failures);
    let scheduler: Scheduler = SchedulerBuilder::new()
        .with_worker_count(1)
        .with_idle_delay(Duration::from_millis(10))
        .with_exception_handler(move |_: &TaskFailure, _: &str| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    scheduler.add(Arc::new(FnTask::new("failing", || Err(anyhow::anyhow!("disk full")))));
    scheduler.start();

    let deadline = Instant::now() + Duration::from_secs(5);
    while failures.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(scheduler.shutdown_within(Duration::from_secs(5)));
    assert!(failures.load(Ordering::SeqCst) >= 1);
}
