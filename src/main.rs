//! vhost-router
//!
//! Resolves each request's host and path to one backend and forwards it.
//!
//! ```text
//!     Client Request          ┌──────────────────────────────────────────┐
//!     ────────────────────────┼─▶ http server ─▶ routing table ─┐        │
//!                             │                                  ▼        │
//!     Client Response         │                           owning backend ─┼──▶ Backend
//!     ◀───────────────────────┼──────────────────────────────────────────┘│
//!                             │  config + watcher → compile → swap        │
//!                             └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use vhost_router::config::{load_config, read_config, ConfigError};
use vhost_router::observability::logging;
use vhost_router::routing::{router::RequestTarget, Router};

#[derive(Parser)]
#[command(name = "vhost-router")]
#[command(about = "Route requests to backends by host and path", long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "router.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server (default)
    Run {
        /// Do not reload when the config file changes
        #[arg(long)]
        no_watch: bool,
    },
    /// Validate the configuration and routing table
    Check,
    /// Show which backend a request would reach
    Resolve {
        #[arg(long)]
        host: String,
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Print the compiled routing table in evaluation order
    Routes,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Subscriber first, so validation and compile warnings are not lost.
    let level = read_config(&cli.config)
        .map(|config| config.observability.log_level)
        .unwrap_or_else(|_| "info".to_string());
    logging::init(&level);

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            eprintln!("{}: invalid configuration", cli.config.display());
            for error in errors {
                eprintln!("  - {}", error);
            }
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Commands::Run { no_watch: false }) {
        Commands::Run { no_watch } => {
            tracing::info!(config = %cli.config.display(), "vhost-router v{} starting", env!("CARGO_PKG_VERSION"));

            let watch = (!no_watch).then_some(cli.config.as_path());
            if let Err(e) = vhost_router::lifecycle::serve(config, watch).await {
                tracing::error!(error = %e, "Fatal error");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Commands::Check => match Router::from_config(&config) {
            Ok(router) => {
                println!(
                    "ok: {} rules, default backend: {}",
                    router.table().len(),
                    config.router.default_backend.as_deref().unwrap_or("none")
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Resolve { host, path } => {
            let router = match Router::from_config(&config) {
                Ok(router) => router,
                Err(e) => {
                    eprintln!("error: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            let target = RequestTarget::new(&host, &path);
            match router.resolve(&target.host, &target.segments) {
                Some(backend) => {
                    println!("{} ({})", backend.name, backend.base_url);
                    ExitCode::SUCCESS
                }
                None => {
                    println!("no match");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Routes => {
            let router = match Router::from_config(&config) {
                Ok(router) => router,
                Err(e) => {
                    eprintln!("error: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            match serde_json::to_string_pretty(&router.routes()) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
