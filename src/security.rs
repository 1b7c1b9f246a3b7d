//! Security policy for execution configurations
//!
//! Every `ExecutionConfig` must pass validation against the process-wide
//! constraint table before a container may be created. The table is built
//! once at startup and shared read-only; validation is pure and can run
//! from any number of tasks concurrently.

use std::collections::HashSet;

use thiserror::Error;

use crate::execution::ExecutionConfig;

/// Immutable allow-list/limit table applied to every execution.
#[derive(Debug, Clone)]
pub struct SecurityConstraints {
    /// Hard ceiling on per-container memory
    pub max_memory_bytes: i64,
    /// Hard ceiling on per-execution wall-clock timeout
    pub max_timeout_ms: u64,
    pub allowed_network_modes: HashSet<String>,
    pub allowed_users: HashSet<String>,
    pub allowed_images: HashSet<String>,
    /// Environment keys that could redirect library loading or shell behavior
    pub dangerous_env_keys: HashSet<String>,
}

impl Default for SecurityConstraints {
    fn default() -> Self {
        let to_set =
            |items: &[&str]| -> HashSet<String> { items.iter().map(|s| s.to_string()).collect() };

        Self {
            max_memory_bytes: 512 * 1024 * 1024,
            max_timeout_ms: 30_000,
            allowed_network_modes: to_set(&["none"]),
            allowed_users: to_set(&["nobody"]),
            allowed_images: to_set(&[
                "node:18-alpine",
                "python:3.11-alpine",
                "ruby:3.2-alpine",
            ]),
            dangerous_env_keys: to_set(&[
                "PATH",
                "LD_LIBRARY_PATH",
                "LD_PRELOAD",
                "HOME",
                "USER",
                "SHELL",
            ]),
        }
    }
}

/// Reason an execution configuration was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SecurityViolation {
    #[error("image not on allow-list: {0}")]
    ImageNotAllowed(String),
    #[error("network mode not allowed: {0}")]
    NetworkModeNotAllowed(String),
    #[error("user not allowed: {0}")]
    UserNotAllowed(String),
    #[error("memory limit {requested} exceeds maximum {max}")]
    MemoryLimitExceeded { requested: i64, max: i64 },
    #[error("timeout {requested}ms exceeds maximum {max}ms")]
    TimeoutExceeded { requested: u64, max: u64 },
    #[error("dangerous environment variables: {0}")]
    DangerousEnvironment(String),
    #[error("read-only root filesystem is required")]
    WritableRootFilesystem,
}

/// Validates execution configurations against a fixed constraint table.
#[derive(Debug, Clone, Default)]
pub struct SecurityPolicy {
    constraints: SecurityConstraints,
}

impl SecurityPolicy {
    pub fn new(constraints: SecurityConstraints) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &SecurityConstraints {
        &self.constraints
    }

    /// Check a configuration against every constraint; the first failing
    /// check determines the reported violation. No side effects.
    pub fn validate(&self, config: &ExecutionConfig) -> Result<(), SecurityViolation> {
        let c = &self.constraints;

        if !c.allowed_images.contains(&config.image) {
            return Err(SecurityViolation::ImageNotAllowed(config.image.clone()));
        }

        if !c.allowed_network_modes.contains(&config.network_mode) {
            return Err(SecurityViolation::NetworkModeNotAllowed(
                config.network_mode.clone(),
            ));
        }

        if !c.allowed_users.contains(&config.user) {
            return Err(SecurityViolation::UserNotAllowed(config.user.clone()));
        }

        if config.memory_limit_bytes > c.max_memory_bytes {
            return Err(SecurityViolation::MemoryLimitExceeded {
                requested: config.memory_limit_bytes,
                max: c.max_memory_bytes,
            });
        }

        if config.timeout_ms > c.max_timeout_ms {
            return Err(SecurityViolation::TimeoutExceeded {
                requested: config.timeout_ms,
                max: c.max_timeout_ms,
            });
        }

        let dangerous: Vec<&str> = config
            .environment
            .keys()
            .filter(|key| c.dangerous_env_keys.contains(key.as_str()))
            .map(String::as_str)
            .collect();
        if !dangerous.is_empty() {
            return Err(SecurityViolation::DangerousEnvironment(dangerous.join(", ")));
        }

        if !config.read_only_root_fs {
            return Err(SecurityViolation::WritableRootFilesystem);
        }

        Ok(())
    }
}
