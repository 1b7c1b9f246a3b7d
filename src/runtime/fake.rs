//! In-memory container runtime for tests
//!
//! Records every lifecycle call and lets a test script the outcome: exit
//! code, captured logs, a wait that never resolves, or failures at any
//! step. One instance stands in for one daemon; handles are checked only
//! for basic sanity.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ContainerHandle, ContainerLogs, ContainerRuntime, RuntimeError};
use crate::execution::ExecutionConfig;

#[derive(Default)]
pub struct FakeRuntime {
    exit_code: i64,
    stdout: String,
    stderr: String,
    create_fails: bool,
    start_fails: bool,
    wait_hangs: bool,
    remove_fails: bool,
    created: AtomicUsize,
    started: AtomicUsize,
    removed: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
    pub piped_stdin: Mutex<Option<String>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exit(mut self, exit_code: i64) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Simulate a backend that cannot create containers.
    pub fn failing_create(mut self) -> Self {
        self.create_fails = true;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.start_fails = true;
        self
    }

    /// Simulate a process that never exits (forces the timeout path).
    pub fn hanging_wait(mut self) -> Self {
        self.wait_hangs = true;
        self
    }

    pub fn failing_remove(mut self) -> Self {
        self.remove_fails = true;
        self
    }

    pub fn create_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn remove_count(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn create(&self, config: &ExecutionConfig) -> Result<ContainerHandle, RuntimeError> {
        self.record("create");
        if self.create_fails {
            return Err(RuntimeError::Unavailable("daemon unreachable".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(ContainerHandle::new(format!("fake-{}", config.image)))
    }

    async fn start(&self, _handle: &ContainerHandle) -> Result<(), RuntimeError> {
        self.record("start");
        if self.start_fails {
            return Err(RuntimeError::Api("start failed".into()));
        }
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn pipe_stdin(&self, _handle: &ContainerHandle, input: &str) -> Result<(), RuntimeError> {
        self.record("pipe_stdin");
        *self.piped_stdin.lock().unwrap() = Some(input.to_string());
        Ok(())
    }

    async fn wait(&self, _handle: &ContainerHandle) -> Result<i64, RuntimeError> {
        self.record("wait");
        if self.wait_hangs {
            std::future::pending::<()>().await;
        }
        Ok(self.exit_code)
    }

    async fn fetch_logs(&self, _handle: &ContainerHandle) -> Result<ContainerLogs, RuntimeError> {
        self.record("fetch_logs");
        Ok(ContainerLogs {
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        })
    }

    async fn remove(&self, _handle: &ContainerHandle) -> Result<(), RuntimeError> {
        self.record("remove");
        self.removed.fetch_add(1, Ordering::SeqCst);
        if self.remove_fails {
            return Err(RuntimeError::Api("remove failed".into()));
        }
        Ok(())
    }
}
