//! Docker-backed container runtime
//!
//! Drives the Docker daemon through bollard. Isolation flags from the
//! execution configuration map onto the container create body: network
//! mode, memory and CPU limits, non-root user, working directory, and the
//! read-only root filesystem all land on `HostConfig`/`ContainerCreateBody`.

use async_trait::async_trait;
use bollard::container::LogOutput;
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerCreateBody, HostConfig};
use bollard::query_parameters::{
    AttachContainerOptions, CreateContainerOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, WaitContainerOptions,
};
use bollard::Docker;
use futures_util::stream::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ContainerHandle, ContainerLogs, ContainerRuntime, RuntimeError};
use crate::execution::ExecutionConfig;

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon.
    pub fn new() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, config: &ExecutionConfig) -> Result<ContainerHandle, RuntimeError> {
        let name = format!("scorebox-{}", Uuid::new_v4());
        let options = Some(CreateContainerOptions {
            name: Some(name.clone()),
            ..Default::default()
        });

        let env: Vec<String> = config
            .environment
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        let pipes_stdin = config.stdin.is_some();

        let body = ContainerCreateBody {
            image: Some(config.image.clone()),
            cmd: Some(config.argv.clone()),
            env: Some(env),
            user: Some(config.user.clone()),
            working_dir: Some(config.working_dir.clone()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            attach_stdin: Some(pipes_stdin),
            open_stdin: Some(pipes_stdin),
            stdin_once: Some(pipes_stdin),
            network_disabled: Some(config.network_mode == "none"),
            host_config: Some(HostConfig {
                memory: Some(config.memory_limit_bytes),
                cpu_shares: Some(config.cpu_shares),
                network_mode: Some(config.network_mode.clone()),
                readonly_rootfs: Some(config.read_only_root_fs),
                auto_remove: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let container = self
            .docker
            .create_container(options, body)
            .await
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;

        debug!("Created container {} ({})", name, container.id);
        Ok(ContainerHandle::new(container.id))
    }

    async fn start(&self, handle: &ContainerHandle) -> Result<(), RuntimeError> {
        self.docker
            .start_container(&handle.id, None::<StartContainerOptions>)
            .await
            .map_err(|e| RuntimeError::Api(e.to_string()))
    }

    async fn pipe_stdin(&self, handle: &ContainerHandle, input: &str) -> Result<(), RuntimeError> {
        let options = Some(AttachContainerOptions {
            stdin: true,
            stdout: false,
            stderr: false,
            stream: true,
            ..Default::default()
        });

        let results = self
            .docker
            .attach_container(&handle.id, options)
            .await
            .map_err(|e| RuntimeError::Api(e.to_string()))?;

        let mut writer = results.input;
        writer
            .write_all(input.as_bytes())
            .await
            .map_err(|e| RuntimeError::Api(e.to_string()))?;
        // Close the stream so the process sees EOF
        writer
            .shutdown()
            .await
            .map_err(|e| RuntimeError::Api(e.to_string()))?;

        Ok(())
    }

    async fn wait(&self, handle: &ContainerHandle) -> Result<i64, RuntimeError> {
        let mut stream = self
            .docker
            .wait_container(&handle.id, None::<WaitContainerOptions>);

        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // Bollard reports a non-zero exit as a wait error carrying the code
            Some(Err(BollardError::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(RuntimeError::Api(e.to_string())),
            None => Err(RuntimeError::Api(
                "container wait stream ended unexpectedly".into(),
            )),
        }
    }

    async fn fetch_logs(&self, handle: &ContainerHandle) -> Result<ContainerLogs, RuntimeError> {
        let options = Some(LogsOptions {
            stdout: true,
            stderr: true,
            ..Default::default()
        });

        let mut stream = self.docker.logs(&handle.id, options);
        let mut logs = ContainerLogs::default();

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(LogOutput::StdOut { message }) => {
                    logs.stdout.push_str(&String::from_utf8_lossy(&message));
                }
                Ok(LogOutput::StdErr { message }) => {
                    logs.stderr.push_str(&String::from_utf8_lossy(&message));
                }
                Ok(_) => {}
                Err(e) => return Err(RuntimeError::Api(e.to_string())),
            }
        }

        Ok(logs)
    }

    async fn remove(&self, handle: &ContainerHandle) -> Result<(), RuntimeError> {
        let options = Some(RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        });

        match self.docker.remove_container(&handle.id, options).await {
            Ok(()) => Ok(()),
            // Already gone: removal is idempotent
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                debug!("Container {} already removed", handle.id);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to remove container {}: {}", handle.id, e);
                Err(RuntimeError::Api(e.to_string()))
            }
        }
    }
}
