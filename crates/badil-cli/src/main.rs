use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use badil_core::config::Config;
use badil_core::protocol::ClientFrame;
use badil_core::types::{ApiKey, ProviderKind};
use badil_gateway::{GatewayState, start_gateway};
use badil_providers::{FailoverEngine, HttpBackend, JsonKeyStore, KeyStore};

#[derive(Parser)]
#[command(
    name = "badil",
    about = "Boycott product analyzer — identify products and find local alternatives",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the analysis WebSocket server
    Serve {
        /// Port to listen on (default: 8970)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a one-shot analysis and print result frames as JSON lines
    Analyze {
        /// Path to a product image
        #[arg(long)]
        image: Option<PathBuf>,

        /// Company name to look up
        #[arg(long)]
        company: Option<String>,
    },

    /// Provider credential management
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum KeysAction {
    /// List provisioned credentials (secrets redacted)
    List,
    /// Add a credential
    Add {
        /// Provider: "groq" or "hf"
        provider: String,
        /// API key secret
        secret: String,
        /// Model identifier to use with this credential
        #[arg(long)]
        model: String,
    },
    /// Retire a credential by secret suffix
    Retire { suffix: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Validate the configuration and report problems
    Check,
}

fn parse_provider(s: &str) -> anyhow::Result<ProviderKind> {
    match s.to_ascii_lowercase().as_str() {
        "groq" => Ok(ProviderKind::Groq),
        "hf" | "huggingface" => Ok(ProviderKind::HuggingFace),
        other => anyhow::bail!("unknown provider {other:?} (expected \"groq\" or \"hf\")"),
    }
}

async fn build_state(config: Arc<Config>) -> anyhow::Result<Arc<GatewayState<HttpBackend>>> {
    let store = Arc::new(JsonKeyStore::new(config.keystore_path()));
    let engine = FailoverEngine::new(store, HttpBackend::new());
    let catalog = badil_analyzer::JsonCatalog::new(config.catalog_path())
        .load()
        .await?;
    Ok(Arc::new(GatewayState::new(config, engine, catalog)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    // Initialize logging: CLI verbosity beats config, RUST_LOG beats both.
    let filter = if cli.verbose {
        "debug"
    } else {
        config.log_level().unwrap_or("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let config = Arc::new(config);

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(|| config.gateway_port());
            let state = build_state(config).await?;
            tracing::info!("Starting Badil gateway on port {port}");
            start_gateway(state, port).await?;
        }

        Commands::Analyze { image, company } => {
            let frame = match (image, company) {
                (Some(path), None) => {
                    let bytes = tokio::fs::read(&path).await?;
                    ClientFrame::Image {
                        image_data: BASE64.encode(bytes),
                    }
                }
                (None, Some(name)) => ClientFrame::Company { company_name: name },
                _ => anyhow::bail!("pass exactly one of --image or --company"),
            };

            let state = build_state(config).await?;
            let (tx, mut rx) = mpsc::unbounded_channel();
            badil_gateway::analysis::run_analysis(&state, frame, &tx).await;
            drop(tx);

            while let Some(frame) = rx.recv().await {
                println!("{}", serde_json::to_string(&frame)?);
            }
        }

        Commands::Keys { action } => {
            let store = JsonKeyStore::new(config.keystore_path());
            match action {
                KeysAction::List => {
                    let keys = store.list_candidates().await?;
                    if keys.is_empty() {
                        println!("No credentials provisioned.");
                    }
                    for key in keys {
                        let status = match key.retired_at {
                            Some(at) => format!("retired {}", at.format("%Y-%m-%d %H:%M UTC")),
                            None => "active".to_string(),
                        };
                        println!(
                            "{:<8} {:<12} {:<40} {status}",
                            key.provider.to_string(),
                            key.redacted(),
                            key.model
                        );
                    }
                }
                KeysAction::Add {
                    provider,
                    secret,
                    model,
                } => {
                    let provider = parse_provider(&provider)?;
                    store.add(ApiKey::new(provider, secret, model)).await?;
                    println!("Credential added.");
                }
                KeysAction::Retire { suffix } => {
                    let keys = store.list_candidates().await?;
                    let matches: Vec<_> = keys
                        .iter()
                        .filter(|k| k.secret.ends_with(&suffix))
                        .collect();
                    match matches.as_slice() {
                        [] => anyhow::bail!("no credential ends with {suffix:?}"),
                        [key] => {
                            store.retire(key).await?;
                            println!("Retired {}.", key.redacted());
                        }
                        _ => anyhow::bail!("suffix {suffix:?} matches more than one credential"),
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let json = serde_json::to_string_pretty(config.as_ref())?;
                println!("{json}");
            }
            ConfigAction::Check => {
                let (warnings, errors) = config.validate();
                for w in &warnings {
                    println!("warning: {w}");
                }
                for e in &errors {
                    println!("error: {e}");
                }
                if errors.is_empty() {
                    println!("Configuration OK ({})", config_path.display());
                } else {
                    anyhow::bail!("{} configuration error(s)", errors.len());
                }
            }
        },
    }

    Ok(())
}
