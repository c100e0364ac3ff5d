//! llm-backend CLI
//!
//! Inspect the resolved LLM configuration and exercise the configured backend.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use llm_backend::config::parse_override;
use llm_backend::{
    Config, InferenceClient, ProviderKind, ProviderOrigin, ResolvedConfig, Telemetry,
};
use serde_json::Value;
use std::path::PathBuf;

const SMOKE_PROMPT: &str = "Hello, how are you?";
const SMOKE_PREVIEW_CHARS: usize = 100;

#[derive(Parser)]
#[command(name = "llm-backend")]
#[command(about = "Resolve and exercise LLM backends", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Provider to use (gemini, openai, anthropic, ollama, vllm, local) - auto-detected when unset
    #[arg(short, long)]
    provider: Option<String>,

    /// Override a setting, e.g. --set model=llama3 --set temperature=0.2
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    overrides: Vec<(String, Value)>,

    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log directory (default: $XDG_DATA_HOME/llm_backend/logs)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved configuration
    Info {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the request defaults handed to agent frameworks
    Defaults,

    /// Check that the backend is reachable
    Health,

    /// Generate a completion for a single prompt
    Generate {
        /// The user prompt
        prompt: String,

        /// Optional system prompt
        #[arg(short, long)]
        system: Option<String>,
    },

    /// Health check plus a canned prompt (local providers only)
    Smoke,
}

/// Build configuration - priority: CLI flags > config file > environment
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;

    if let Some(provider) = &cli.provider {
        config = config.with_provider(provider.clone());
    }
    for (key, value) in &cli.overrides {
        config = config.with_override(key.clone(), value.clone());
    }
    if let Some(log_dir) = &cli.log_dir {
        config = config.with_log_dir(log_dir.clone());
    }
    if cli.verbose {
        config = config.with_verbose(true);
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let _telemetry = Telemetry::init(&config.telemetry)?;

    let resolved = config.resolve();
    if let ProviderOrigin::Fallback { requested } = resolved.origin() {
        eprintln!(
            "Warning: unknown provider '{}', falling back to {}",
            requested,
            resolved.provider()
        );
    }

    match cli.command {
        Commands::Info { json } => {
            let summary = resolved.summary();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", summary);
            }
        }
        Commands::Defaults => {
            let defaults = resolved.provider_request_defaults();
            println!("{}", serde_json::to_string_pretty(&defaults)?);
        }
        Commands::Health => {
            let client = InferenceClient::with_options(&resolved, config.client)?;
            if client.health_check().await {
                println!("{} is healthy", client.describe());
            } else {
                bail!("{} is not healthy", client.describe());
            }
        }
        Commands::Generate { prompt, system } => {
            resolved.ensure_valid()?;
            let client = InferenceClient::with_options(&resolved, config.client)?;
            let text = client.generate(&prompt, system.as_deref()).await?;
            println!("{}", text);
        }
        Commands::Smoke => {
            if !run_smoke_test(&resolved, &config).await? {
                bail!("Smoke test failed");
            }
        }
    }

    Ok(())
}

/// Health check followed by one generation against a local provider
async fn run_smoke_test(resolved: &ResolvedConfig, config: &Config) -> Result<bool> {
    let provider: ProviderKind = resolved.provider();
    if !provider.is_local() {
        bail!("Not using a local LLM provider ({} is hosted)", provider);
    }

    let client = InferenceClient::with_options(resolved, config.client)?;
    println!("Testing {} service...", provider);

    if !client.health_check().await {
        println!("{} service is not healthy", provider);
        return Ok(false);
    }
    println!("{} service is healthy", provider);

    match client.generate(SMOKE_PROMPT, None).await {
        Ok(response) => {
            let preview: String = response.chars().take(SMOKE_PREVIEW_CHARS).collect();
            println!("Generated response: {}...", preview);
            Ok(true)
        }
        Err(e) => {
            println!("Generation failed: {}", e);
            Ok(false)
        }
    }
}
