//! Scoring façade
//!
//! Entry point the (out-of-scope) HTTP layer calls once per submission.
//! Resolves the language profile, builds the execution configuration,
//! invokes the orchestrator, and translates every outcome into a
//! `CodeExecutionResult` — callers never see a raised error for input-shape
//! or sandbox problems.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::execution::{CodeExecutionRequest, CodeExecutionResult, ExecutionConfig};
use crate::languages::LanguageRegistry;
use crate::orchestrator::ContainerOrchestrator;
use crate::runtime::ContainerRuntime;
use crate::security::SecurityPolicy;

pub struct ScoringService {
    registry: LanguageRegistry,
    orchestrator: ContainerOrchestrator,
}

impl ScoringService {
    pub fn new(registry: LanguageRegistry, orchestrator: ContainerOrchestrator) -> Self {
        Self {
            registry,
            orchestrator,
        }
    }

    /// Service over the embedded language table and the default constraint
    /// table, executing against the given runtime.
    pub fn with_runtime(runtime: Arc<dyn ContainerRuntime>) -> anyhow::Result<Self> {
        let registry = LanguageRegistry::from_embedded()?;
        let orchestrator = ContainerOrchestrator::new(runtime, SecurityPolicy::default());
        Ok(Self::new(registry, orchestrator))
    }

    /// Execute one submission. Always returns a well-formed result; failures
    /// (unsupported language, security rejection, runtime trouble, timeout)
    /// come back as `success=false` with a descriptive message.
    pub async fn execute_code(&self, request: &CodeExecutionRequest) -> CodeExecutionResult {
        let started_at = Instant::now();

        let profile = match self.registry.resolve(&request.language) {
            Some(profile) => profile,
            None => {
                // Fail fast: no container work for unknown languages
                let supported = self.supported_languages().join(", ");
                return CodeExecutionResult::failure(
                    format!(
                        "Unsupported language: {} (supported: {})",
                        request.language, supported
                    ),
                    elapsed_ms(started_at),
                );
            }
        };

        let max_timeout_ms = self.orchestrator.policy().constraints().max_timeout_ms;
        let timeout_ms = request
            .timeout_ms
            .unwrap_or(profile.default_timeout_ms)
            .min(max_timeout_ms);

        let mut config =
            ExecutionConfig::new(profile.image.clone(), profile.build_command(&request.code))
                .with_timeout_ms(timeout_ms)
                .with_memory_limit_bytes(profile.memory_limit_bytes)
                .with_cpu_shares(profile.cpu_shares);
        if !request.input.is_empty() {
            config = config.with_stdin(request.input.clone());
        }

        info!(
            "Executing {} submission ({} bytes, timeout {}ms)",
            profile.id,
            request.code.len(),
            timeout_ms
        );

        match self.orchestrator.run(&config).await {
            Ok(result) => {
                let duration_ms = elapsed_ms(started_at);
                if result.success {
                    CodeExecutionResult {
                        success: true,
                        output: result.stdout,
                        error: None,
                        duration_ms,
                    }
                } else {
                    // Output and error are mutually exclusive on exit code
                    let message = if result.stderr.is_empty() {
                        result.stdout
                    } else {
                        result.stderr
                    };
                    CodeExecutionResult::failure(message, duration_ms)
                }
            }
            Err(e) => {
                error!("Execution failed before completion: {}", e);
                CodeExecutionResult::failure(e.to_string(), elapsed_ms(started_at))
            }
        }
    }

    /// Supported language identifiers, stable and sorted.
    pub fn supported_languages(&self) -> Vec<String> {
        self.registry.supported_languages()
    }
}

fn elapsed_ms(started_at: Instant) -> u64 {
    started_at.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::runtime::fake::FakeRuntime;

    fn service(runtime: Arc<FakeRuntime>) -> ScoringService {
        ScoringService::with_runtime(runtime).unwrap()
    }

    fn request(language: &str, code: &str) -> CodeExecutionRequest {
        CodeExecutionRequest {
            language: language.into(),
            code: code.into(),
            input: String::new(),
            timeout_ms: None,
        }
    }

    #[tokio::test]
    async fn hello_world_succeeds() {
        let runtime = Arc::new(FakeRuntime::new().with_exit(0).with_stdout("Hello, World!\n"));
        let result = service(runtime)
            .execute_code(&request("javascript", "console.log(\"Hello, World!\")"))
            .await;

        assert!(result.success);
        assert_eq!(result.output, "Hello, World!\n");
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn uncaught_error_maps_to_error_field() {
        let runtime = Arc::new(
            FakeRuntime::new()
                .with_exit(1)
                .with_stderr("Error: something broke\n"),
        );
        let result = service(runtime)
            .execute_code(&request("javascript", "throw new Error('something broke')"))
            .await;

        assert!(!result.success);
        assert_eq!(result.output, "");
        assert!(result.error.as_deref().unwrap().contains("Error"));
    }

    #[tokio::test]
    async fn unsupported_language_fails_fast() {
        let runtime = Arc::new(FakeRuntime::new());
        let svc = service(runtime.clone());
        let result = svc.execute_code(&request("ruby-nonexistent", "puts 1")).await;

        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("Unsupported language"));
        assert!(error.contains("javascript"));
        // No container lifecycle calls at all
        assert!(runtime.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn infinite_loop_times_out_with_cleanup() {
        let runtime = Arc::new(FakeRuntime::new().hanging_wait());
        let mut req = request("javascript", "while (true) {}");
        req.timeout_ms = Some(1000);

        let result = service(runtime.clone()).execute_code(&req).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("timed out"));
        assert_eq!(runtime.remove_count(), 1);
    }

    #[tokio::test]
    async fn oversized_timeout_is_clamped_not_rejected() {
        let runtime = Arc::new(FakeRuntime::new().with_exit(0).with_stdout("ok\n"));
        let mut req = request("python", "print('ok')");
        req.timeout_ms = Some(600_000);

        let result = service(runtime).execute_code(&req).await;

        // Clamped to the policy ceiling, so execution proceeds normally
        assert!(result.success);
    }

    #[tokio::test]
    async fn runtime_unavailable_becomes_failed_result() {
        let runtime = Arc::new(FakeRuntime::new().failing_create());
        let result = service(runtime)
            .execute_code(&request("python", "print(1)"))
            .await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn request_input_reaches_stdin() {
        let runtime = Arc::new(FakeRuntime::new().with_exit(0));
        let mut req = request("python", "print(input())");
        req.input = "42\n".into();

        let result = service(runtime.clone()).execute_code(&req).await;

        assert!(result.success);
        assert_eq!(runtime.piped_stdin.lock().unwrap().as_deref(), Some("42\n"));
    }

    #[tokio::test]
    async fn supported_languages_non_empty_and_stable() {
        let svc = service(Arc::new(FakeRuntime::new()));
        let first = svc.supported_languages();
        assert!(!first.is_empty());
        assert_eq!(first, svc.supported_languages());

        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(first, sorted);
    }
}
