//! Secret Scorer - CLI entry point
//!
//! Usage:
//!   secret-scorer analyze <secret> [context] [variable_name]
//!   secret-scorer feedback <secret> <label> [context] [user_action]
//!   secret-scorer stats

use std::env;
use std::process::ExitCode;

use secret_scorer_core::constants::{APP_DIR, APP_NAME, APP_VERSION, FEEDBACK_DIR};
use secret_scorer_core::logic::collab::{InMemoryCache, JsonlRecordStore, NoopMetrics};
use secret_scorer_core::logic::model::load_or_init;
use secret_scorer_core::{AnalyzeRequest, EngineConfig, EngineResult, FeedbackRequest, SecretAnalyzer};

fn build_analyzer(config: EngineConfig) -> EngineResult<SecretAnalyzer> {
    let model = load_or_init(&config.model_path, &config.model, config.seed)?;
    let feedback_dir = config
        .model_path
        .parent()
        .map(|p| p.join(FEEDBACK_DIR))
        .unwrap_or_else(|| std::path::PathBuf::from(APP_DIR).join(FEEDBACK_DIR));

    Ok(SecretAnalyzer::with_collaborators(
        config,
        model,
        Box::new(InMemoryCache::new()),
        Box::new(JsonlRecordStore::new(feedback_dir)?),
        Box::new(NoopMetrics),
    ))
}

fn run(args: &[String]) -> EngineResult<()> {
    let arg = |i: usize| args.get(i).map(String::as_str);

    match arg(1) {
        Some("analyze") => {
            let analyzer = build_analyzer(EngineConfig::from_env())?;
            let mut request = AnalyzeRequest::new(arg(2).unwrap_or_default(), arg(3).unwrap_or_default());
            request.variable_name = arg(4).map(str::to_string);

            let result = analyzer.analyze(&request);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Some("feedback") => {
            let analyzer = build_analyzer(EngineConfig::from_env())?;
            let request = FeedbackRequest {
                secret_value: arg(2).unwrap_or_default().to_string(),
                label: arg(3).unwrap_or_default().to_string(),
                context: arg(4).unwrap_or_default().to_string(),
                user_action: arg(5).unwrap_or("cli").to_string(),
                ..Default::default()
            };

            let outcome = analyzer.record_feedback(&request)?;
            if outcome.status == "trained" {
                analyzer.save_model()?;
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Some("stats") => {
            let analyzer = build_analyzer(EngineConfig::from_env())?;
            let stats = serde_json::json!({
                "model": analyzer.model_stats(),
                "training": analyzer.training_stats(),
                "versions": analyzer.list_versions(),
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        _ => {
            eprintln!("{} v{}", APP_NAME, APP_VERSION);
            eprintln!("usage: secret-scorer <analyze|feedback|stats> ...");
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let args: Vec<String> = env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
