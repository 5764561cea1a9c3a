use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use styleguard_lib::api::{self, ErrorResponse};
use styleguard_lib::models::AnalyzeRequest;
use styleguard_lib::services::analysis::Analyzer;
use styleguard_lib::services::config_store::{AppConfig, ExplanationStrategy};
use styleguard_lib::services::parse_provider;
use styleguard_lib::startup_elapsed_ms;

const EXIT_VALIDATION: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "styleguard", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a document for authorship obfuscation
    Analyze(AnalyzeArgs),
    /// Print the liveness status
    Health,
    /// Inspect or edit the saved configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// .txt, .docx or .pdf file; reads stdin when omitted
    path: Option<PathBuf>,

    /// Words per segment (defaults to the configured size)
    #[arg(long)]
    segment_size: Option<usize>,

    /// Clean the text before analysis
    #[arg(long, default_value_t = false)]
    preprocess: bool,

    /// Strip URLs during preprocessing
    #[arg(long, default_value_t = false)]
    remove_urls: bool,

    /// Explanation source: rule_based, api or local
    #[arg(long)]
    strategy: Option<ExplanationStrategy>,

    /// Explanation provider name[:model], e.g. deepseek:deepseek-chat
    #[arg(long)]
    provider: Option<String>,

    /// Write the JSON result to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Compact single-line JSON
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show the configuration with keys masked
    Show,
    /// Store an API key for a provider
    SetKey { provider: String, key: String },
    /// Remove a provider's stored API key
    DeleteKey { provider: String },
    /// Persist the default explanation source
    SetStrategy {
        strategy: ExplanationStrategy,
        /// Provider name[:model] used by the api strategy
        #[arg(long)]
        provider: Option<String>,
    },
}

fn to_json<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(json)
}

async fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            api::preprocess_file(file_name, bytes)
                .await
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("failed to extract text from {}", path.display()))
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

async fn run_analyze(args: AnalyzeArgs) -> Result<ExitCode> {
    let mut config = api::load_config_or_default();
    if let Some(strategy) = args.strategy {
        config.explanation.strategy = strategy;
    }
    if let Some(spec) = args.provider.as_deref() {
        apply_provider(&mut config, spec);
    }

    let text = read_input(args.path.as_ref()).await?;
    let mut request = AnalyzeRequest::new(text)
        .with_segment_size(args.segment_size.unwrap_or(config.analysis.segment_size));
    request.preprocess = args.preprocess || args.remove_urls;
    request.remove_urls = args.remove_urls;

    let analyzer = Analyzer::from_app_config(&config);
    match api::analyze_text(&analyzer, request).await {
        Ok(response) => {
            let json = to_json(&response, args.compact)?;
            match &args.out {
                Some(out) => {
                    std::fs::write(out, json)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    info!("Result written to {}", out.display());
                }
                None => println!("{}", json),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_validation() => {
            eprintln!("{}", to_json(&ErrorResponse::from(&e), true)?);
            Ok(ExitCode::from(EXIT_VALIDATION))
        }
        Err(e) => Err(anyhow::Error::new(e).context("analysis failed")),
    }
}

fn apply_provider(config: &mut AppConfig, spec: &str) {
    let spec = parse_provider(spec);
    config.explanation.provider = spec.name;
    if !spec.model.is_empty() {
        config.explanation.model = Some(spec.model);
    }
}

fn run_config(action: ConfigAction) -> Result<ExitCode> {
    match action {
        ConfigAction::Show => {
            let config = api::get_config().map_err(anyhow::Error::msg)?;
            #[derive(Serialize)]
            struct ConfigView {
                config: AppConfig,
                api_keys: Vec<api::ApiKeyStatus>,
            }
            let view = ConfigView {
                api_keys: api::api_key_statuses(&config),
                config: api::redacted_config(&config),
            };
            println!("{}", to_json(&view, false)?);
        }
        ConfigAction::SetKey { provider, key } => {
            api::store_api_key(provider.clone(), key).map_err(anyhow::Error::msg)?;
            println!("Stored API key for {}", provider);
        }
        ConfigAction::DeleteKey { provider } => {
            let removed = api::delete_api_key(provider.clone()).map_err(anyhow::Error::msg)?;
            if removed {
                println!("Deleted API key for {}", provider);
            } else {
                println!("No stored API key for {}", provider);
            }
        }
        ConfigAction::SetStrategy { strategy, provider } => {
            let mut config = api::get_config().map_err(anyhow::Error::msg)?;
            config.explanation.strategy = strategy;
            if let Some(spec) = provider.as_deref() {
                apply_provider(&mut config, spec);
            }
            api::save_config(config).map_err(anyhow::Error::msg)?;
            println!("Explanation strategy set to {}", strategy);
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    styleguard_lib::init_logging();
    info!(startup_ms = startup_elapsed_ms(), "logging.initialized");

    match cli.command {
        Commands::Analyze(args) => run_analyze(args).await,
        Commands::Health => {
            println!("{}", to_json(&api::health_check(), true)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { action } => run_config(action),
    }
}
