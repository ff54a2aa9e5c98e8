use anyhow::Context;
use clap::Parser;
use pairing_algo::config::Settings;
use pairing_algo::core::PairingEngine;
use pairing_algo::models::{PairUsersRequest, PairingResponse};
use pairing_algo::services::OllamaProvider;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use validator::Validate;

/// Pair a snapshot of users read from a JSON file
#[derive(Parser, Debug)]
#[command(name = "match-file")]
#[command(about = "Pair users from a JSON snapshot", long_about = None)]
struct Args {
    /// Input file holding {"users": [...]}
    input: PathBuf,

    /// Where to write the result
    #[arg(short, long, default_value = "output.json")]
    output: PathBuf,

    /// Configuration file; defaults to config/default.toml and config/local.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load configuration")?;

    pairing_algo::logging::init(&settings.logging.level, "pretty");

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let request: PairUsersRequest = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;
    request.validate().context("invalid user snapshot")?;

    info!("Loaded {} users from {}", request.users.len(), args.input.display());

    let provider = OllamaProvider::new(
        &settings.ollama.url,
        settings.ollama.model.clone(),
        Duration::from_secs(settings.ollama.timeout_secs),
        settings.ollama.cache_size,
        Duration::from_secs(settings.ollama.cache_ttl_secs),
    )?;

    if settings.ollama.pull_on_start {
        provider.pull_model().await?;
    }

    let engine = PairingEngine::new(settings.engine_settings());
    let outcome = engine.run(&request.users, &provider).await?;

    let response = PairingResponse::build(&request.users, &outcome, &settings.availability.slots);
    let json = serde_json::to_string_pretty(&response)?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        "Wrote {} pairs, {} full matches, {} unmatched to {}",
        response.pairs.len(),
        response.full_matches.len(),
        response.unmatched.len(),
        args.output.display()
    );

    Ok(())
}
