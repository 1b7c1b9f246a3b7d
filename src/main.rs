//! Command-line entry point: run one submission against the local Docker
//! daemon and print the result as JSON.
//!
//! Usage: `scorebox <language> <source-file> [input-file]`

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use scorebox::{CodeExecutionRequest, DockerRuntime, ScoringService};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scorebox=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let (language, source_path) = match args.as_slice() {
        [_, language, source_path, ..] => (language.clone(), source_path.clone()),
        _ => {
            eprintln!("Usage: scorebox <language> <source-file> [input-file]");
            std::process::exit(2);
        }
    };

    let code = tokio::fs::read_to_string(&source_path)
        .await
        .with_context(|| format!("Failed to read source file {}", source_path))?;
    let input = match args.get(3) {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input file {}", path))?,
        None => String::new(),
    };

    let runtime = Arc::new(DockerRuntime::new()?);
    let service = ScoringService::with_runtime(runtime)?;
    info!(
        "Supported languages: {}",
        service.supported_languages().join(", ")
    );

    let request = CodeExecutionRequest {
        language,
        code,
        input,
        timeout_ms: None,
    };

    let result = service.execute_code(&request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
