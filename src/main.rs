//! Graphite Bridge server and tools
//!
//! Run with: cargo run -- serve --demo
//!
//! # Configuration
//!
//! Settings come from `--config`, else the first config file found in the
//! default locations, else built-in defaults. `GRAPHITE_BRIDGE_*`
//! environment variables override file values and `RUST_LOG` overrides
//! the configured log level.

use anyhow::Context;
use clap::{Parser, Subcommand};
use graphite_bridge::api::{serve, AppState};
use graphite_bridge::config::{generate_default_config, Config, LoggingConfig};
use graphite_bridge::graphite::{build_query, parse_time, quote_identifiers};
use graphite_bridge::query::DslEngine;
use graphite_bridge::storage::MemoryStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "graphite-bridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Graphite web protocol front end for a series query engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// JSON seed file loaded into the in-memory store
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Generate synthetic servers.* metrics
        #[arg(long)]
        demo: bool,
    },

    /// Print a default config file
    InitConfig {
        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show how a render target is rewritten for the query engine
    Quote {
        /// Graphite target expression
        target: String,
    },

    /// Resolve a from/until value
    ParseTime {
        /// e.g. "now", "-1h30min", "1700000000"
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        seed: None,
        demo: false,
    }) {
        Commands::Serve {
            host,
            port,
            seed,
            demo,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(seed) = seed {
                config.storage.seed_file = Some(seed.to_string_lossy().to_string());
            }
            config.storage.demo |= demo;
            config.validate()?;

            run_server(config).await
        }
        Commands::InitConfig { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Wrote default config to {}", path.display());
                }
                None => print!("{}", content),
            }
            Ok(())
        }
        Commands::Quote { target } => {
            println!("quoted: {}", quote_identifiers(&target));
            println!("query:  {}", build_query(&target));
            Ok(())
        }
        Commands::ParseTime { text } => {
            match parse_time(&text)? {
                Some(time) => println!("{} ({})", time.to_rfc3339(), time.timestamp()),
                None => println!("unset"),
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(Config::load_with_env(path)?),
        None => {
            let (config, source, skipped) = Config::load_default();
            init_logging(&config.logging);
            for e in skipped {
                tracing::warn!("Skipped config file: {}", e);
            }
            match source {
                Some(path) => tracing::info!("Loaded config from {:?}", path),
                None => tracing::info!("Using default config with environment overrides"),
            }
            Ok(config)
        }
    }
}

/// Install the global subscriber; later calls are ignored
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "graphite_bridge={level},tower_http={level}",
            level = config.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    // Already installed when load_config logged the config source.
    let _ = result;
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    init_logging(&config.logging);

    tracing::info!(
        "Starting Graphite bridge v{}",
        env!("CARGO_PKG_VERSION")
    );

    let store = MemoryStore::new();
    if let Some(seed_file) = &config.storage.seed_file {
        store
            .load_seed_file(Path::new(seed_file))
            .with_context(|| format!("loading seed file {}", seed_file))?;
    }
    if config.storage.demo {
        store.seed_demo(chrono::Utc::now())?;
    }
    if store.series_count() == 0 {
        tracing::warn!("Store is empty; use --seed or --demo to load series");
    }

    let api_config = config.api_config();
    let state = AppState::new(Arc::new(store), Arc::new(DslEngine::new()), api_config.clone());

    serve(state, &api_config).await?;
    Ok(())
}
