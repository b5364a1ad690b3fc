use std::io::{self, Read};
use std::sync::Arc;

use study_forge::config::Config;
use study_forge::errors::{AppError, AppResult};
use study_forge::services::completion_provider::OpenAiCompletionProvider;
use study_forge::services::study_guide_orchestrator::StudyGuideOrchestrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    // stdout carries the study guide JSON
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = run().await {
        log::error!("[{}] {}", e.error_code(), e);
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let config = Config::from_env();
    config.validate()?;

    let title = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Untitled".to_string());

    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    if text.trim().is_empty() {
        return Err(AppError::NoContent(
            "expected source text on stdin".to_string(),
        ));
    }

    let orchestrator = if config.llm_enabled {
        log::info!(
            "Using model {} at {}",
            config.llm_model_name,
            config.llm_api_base_url
        );
        StudyGuideOrchestrator::with_provider(Arc::new(OpenAiCompletionProvider::new(&config)), &config)
    } else {
        log::info!("Model-backed generation disabled; using heuristics only");
        let orchestrator = StudyGuideOrchestrator::heuristic();
        match config.shuffle_seed {
            Some(seed) => orchestrator.with_seed(seed),
            None => orchestrator,
        }
    };

    let guide = orchestrator.generate(&title, &text).await;
    if guide.is_degraded() {
        log::warn!(
            "{} generation steps fell back to heuristic output",
            guide.fallbacks.len()
        );
    }

    let json = serde_json::to_string_pretty(&guide).map_err(AppError::from)?;
    println!("{}", json);
    Ok(())
}
