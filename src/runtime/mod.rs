//! Container runtime boundary
//!
//! Capability interface over the runtime operations the orchestrator needs:
//! create, start, wait, logs, remove, plus piping submission input to the
//! process stdin. The orchestrator is written against this trait so it can
//! be exercised with an in-memory runtime in tests; `DockerRuntime` is the
//! production implementation.

pub mod docker;
#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use thiserror::Error;

use crate::execution::ExecutionConfig;

pub use docker::DockerRuntime;

/// Identity of one created container. Valid for exactly one execution
/// attempt; handles are never reused across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
}

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Failure at the container runtime boundary.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// The backend itself could not be reached
    #[error("container runtime unavailable: {0}")]
    Unavailable(String),
    /// The backend rejected or failed an operation
    #[error("container runtime error: {0}")]
    Api(String),
}

/// Combined output of one finished container.
#[derive(Debug, Clone, Default)]
pub struct ContainerLogs {
    pub stdout: String,
    pub stderr: String,
}

/// Operations the orchestrator drives against a container backend.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create a container from a validated configuration.
    async fn create(&self, config: &ExecutionConfig) -> Result<ContainerHandle, RuntimeError>;

    /// Start the created container.
    async fn start(&self, handle: &ContainerHandle) -> Result<(), RuntimeError>;

    /// Write `input` to the running process stdin and close the stream.
    async fn pipe_stdin(&self, handle: &ContainerHandle, input: &str) -> Result<(), RuntimeError>;

    /// Resolve with the process exit code once the container terminates.
    async fn wait(&self, handle: &ContainerHandle) -> Result<i64, RuntimeError>;

    /// Retrieve captured stdout/stderr of the container.
    async fn fetch_logs(&self, handle: &ContainerHandle) -> Result<ContainerLogs, RuntimeError>;

    /// Force-remove the container, killing a still-running process first.
    /// Must tolerate containers that never started or are already gone.
    async fn remove(&self, handle: &ContainerHandle) -> Result<(), RuntimeError>;
}
