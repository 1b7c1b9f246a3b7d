//! Sandboxed execution core for scoring programming-assessment submissions.
//!
//! Untrusted, user-submitted source code runs in one isolated container per
//! execution: network disabled, non-root user, read-only root filesystem,
//! memory/CPU limits, and a hard wall-clock timeout. The pieces:
//!
//! - [`security`]: the immutable constraint table and the validation gate
//!   every configuration must pass before a container is created
//! - [`languages`]: the static language-to-image/command registry
//! - [`runtime`]: the container backend boundary (Docker via bollard in
//!   production, an in-memory fake in tests)
//! - [`orchestrator`]: create → start → wait-vs-timeout → logs → remove,
//!   with removal guaranteed on every path
//! - [`scoring`]: the caller-facing façade that never raises for sandbox
//!   or input-shape problems

pub mod execution;
pub mod languages;
pub mod orchestrator;
pub mod runtime;
pub mod scoring;
pub mod security;

pub use execution::{
    CodeExecutionRequest, CodeExecutionResult, ContainerResult, ExecutionConfig,
};
pub use languages::{LanguageProfile, LanguageRegistry};
pub use orchestrator::{ContainerOrchestrator, ExecutionError};
pub use runtime::{ContainerRuntime, DockerRuntime};
pub use scoring::ScoringService;
pub use security::{SecurityConstraints, SecurityPolicy, SecurityViolation};
