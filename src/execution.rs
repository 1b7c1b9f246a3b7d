//! Execution data model
//!
//! Shapes exchanged between the scoring façade, the security policy, and the
//! container orchestrator. An `ExecutionConfig` is built fresh per request
//! and must pass `SecurityPolicy::validate` before a container is created;
//! construction itself enforces nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fully-specified description of one container run.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Container image to run (must be on the policy allow-list)
    pub image: String,
    /// Argument vector for the sandboxed process
    pub argv: Vec<String>,
    /// Wall-clock timeout in milliseconds
    pub timeout_ms: u64,
    /// Memory limit in bytes
    pub memory_limit_bytes: i64,
    /// Relative CPU weight
    pub cpu_shares: i64,
    /// Docker network mode ("none" for submitted code)
    pub network_mode: String,
    /// User the process runs as (non-root)
    pub user: String,
    /// Working directory inside the container
    pub working_dir: String,
    /// Whether the root filesystem is mounted read-only
    pub read_only_root_fs: bool,
    /// Environment passed to the process
    pub environment: BTreeMap<String, String>,
    /// Content piped to the process stdin after start (None = nothing)
    pub stdin: Option<String>,
}

impl ExecutionConfig {
    pub fn new(image: impl Into<String>, argv: Vec<String>) -> Self {
        Self {
            image: image.into(),
            argv,
            timeout_ms: 5000,
            memory_limit_bytes: 128 * 1024 * 1024,
            cpu_shares: 512,
            network_mode: "none".into(),
            user: "nobody".into(),
            working_dir: "/tmp".into(),
            read_only_root_fs: true,
            environment: BTreeMap::new(),
            stdin: None,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_memory_limit_bytes(mut self, bytes: i64) -> Self {
        self.memory_limit_bytes = bytes;
        self
    }

    pub fn with_cpu_shares(mut self, shares: i64) -> Self {
        self.cpu_shares = shares;
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }
}

/// Exit code synthesized when an execution hits its wall-clock timeout.
pub const TIMEOUT_EXIT_CODE: i64 = 124;

/// Raw outcome of one container run, produced exactly once per attempt.
#[derive(Debug, Clone)]
pub struct ContainerResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i64,
    pub duration_ms: u64,
}

impl ContainerResult {
    pub fn timed_out(&self) -> bool {
        self.exit_code == TIMEOUT_EXIT_CODE
    }
}

/// Caller-facing execution request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeExecutionRequest {
    pub language: String,
    pub code: String,
    /// Content for the program's stdin
    #[serde(default)]
    pub input: String,
    /// Override for the language's default timeout (clamped to the policy maximum)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Caller-facing execution result. `error` is `None` iff `success` is true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeExecutionResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl CodeExecutionResult {
    /// Failed result with empty output and the given message.
    pub fn failure(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            duration_ms,
        }
    }
}
