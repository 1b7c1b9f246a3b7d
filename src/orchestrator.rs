//! Container orchestrator
//!
//! Drives one container through its whole lifecycle for one execution
//! attempt: validate, create, start, race the wait against the timeout,
//! collect logs, and always remove. Containers are never pooled or reused;
//! removal runs on every exit path and its own failures are logged, never
//! propagated.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::execution::{ContainerResult, ExecutionConfig, TIMEOUT_EXIT_CODE};
use crate::runtime::{ContainerHandle, ContainerRuntime, RuntimeError};
use crate::security::{SecurityPolicy, SecurityViolation};

/// Failure modes of one execution attempt. Anything else (non-zero exit,
/// timeout) is a normal `ContainerResult`, not an error.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("security violation: {0}")]
    Security(#[from] SecurityViolation),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub struct ContainerOrchestrator {
    runtime: Arc<dyn ContainerRuntime>,
    policy: SecurityPolicy,
}

impl ContainerOrchestrator {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, policy: SecurityPolicy) -> Self {
        Self { runtime, policy }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Run one container to completion. The configuration is validated
    /// before any container exists; after creation the container is removed
    /// on every path, including timeout and start failure.
    pub async fn run(&self, config: &ExecutionConfig) -> Result<ContainerResult, ExecutionError> {
        self.policy.validate(config)?;

        let started_at = Instant::now();
        let handle = self.runtime.create(config).await?;
        debug!("Created container {}", handle.id);

        let outcome = self.execute(&handle, config).await;

        // Scoped-resource guarantee: removal happens whether execution
        // finished, timed out, or failed to start.
        self.cleanup(&handle).await;

        let mut result = outcome?;
        result.duration_ms = started_at.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn execute(
        &self,
        handle: &ContainerHandle,
        config: &ExecutionConfig,
    ) -> Result<ContainerResult, ExecutionError> {
        self.runtime.start(handle).await?;
        debug!("Started container {}", handle.id);

        if let Some(input) = config.stdin.as_deref() {
            if !input.is_empty() {
                // A short-lived process may exit before the attach lands;
                // that race is benign.
                if let Err(e) = self.runtime.pipe_stdin(handle, input).await {
                    warn!("Failed to pipe stdin to container {}: {}", handle.id, e);
                }
            }
        }

        // First to resolve wins; the loser is abandoned, not cancelled. A
        // timed-out process keeps running until the forced removal below.
        let exit_code = tokio::select! {
            code = self.runtime.wait(handle) => code?,
            _ = sleep(Duration::from_millis(config.timeout_ms)) => {
                info!(
                    "Container {} timed out after {}ms",
                    handle.id, config.timeout_ms
                );
                return Ok(ContainerResult {
                    success: false,
                    stdout: String::new(),
                    stderr: format!(
                        "Container execution timed out after {}ms",
                        config.timeout_ms
                    ),
                    exit_code: TIMEOUT_EXIT_CODE,
                    duration_ms: 0,
                });
            }
        };

        let logs = self.runtime.fetch_logs(handle).await?;
        debug!("Container {} exited with code {}", handle.id, exit_code);

        Ok(ContainerResult {
            success: exit_code == 0,
            stdout: logs.stdout,
            stderr: logs.stderr,
            exit_code,
            duration_ms: 0,
        })
    }

    /// Best-effort removal. Failures must not mask the primary result.
    async fn cleanup(&self, handle: &ContainerHandle) {
        if let Err(e) = self.runtime.remove(handle).await {
            warn!("Cleanup of container {} failed: {}", handle.id, e);
        } else {
            debug!("Removed container {}", handle.id);
        }
    }
}
