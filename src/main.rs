use anyhow::{Context, Result};
use clap::Parser;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{error, info, warn};

use mobile_guru::{
    catalog::Catalog,
    chat::{self, ServerClient},
    constants,
    direct::DirectClient,
    llm_interaction::GeminiClient,
    web_server::{self, AppState},
};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the web server.
    Start {
        #[arg(long, default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
        #[arg(long, env = "GURU_CATALOG", help = "Phone catalog JSON file (defaults to the built-in catalog).")]
        catalog: Option<PathBuf>,
        #[arg(long, default_value_t = constants::DEFAULT_TIMEOUT_SECS, help = "Timeout for Gemini requests, in seconds.")]
        timeout_secs: u64,
    },
    /// Chat with the assistant in the terminal.
    Chat {
        #[arg(long, default_value = "http://127.0.0.1:9900", help = "Base URL of a running server.")]
        server: String,
        #[arg(long, help = "Call Gemini directly with GEMINI_CLIENT_KEY instead of going through the server.")]
        direct: bool,
        #[arg(long, env = "GURU_CATALOG", help = "Phone catalog JSON file for direct mode.")]
        catalog: Option<PathBuf>,
        #[arg(long, default_value_t = constants::DEFAULT_TIMEOUT_SECS, help = "Timeout for each chat request, in seconds.")]
        timeout_secs: u64,
    },
    /// Print the phones in the catalog.
    Catalog {
        #[arg(long, env = "GURU_CATALOG", help = "Phone catalog JSON file (defaults to the built-in catalog).")]
        catalog: Option<PathBuf>,
    },
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,mobile_guru=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("Mobile Guru starting with command: {:?}", cli.command);

    match cli.command {
        Commands::Start {
            port,
            catalog,
            timeout_secs,
        } => {
            let catalog = Arc::new(Catalog::load(catalog.as_deref()).context("Failed to load catalog")?);
            if constants::GOOGLE_API_KEY.is_empty() {
                warn!("GOOGLE_API_KEY is not set; every chat request will get the unavailable reply");
            }
            let llm = GeminiClient::from_env(&constants::GOOGLE_API_KEY, Duration::from_secs(timeout_secs))
                .context("Failed to build Gemini client")?;
            let state = AppState::new(catalog, llm)?;

            let mut web_server_handle = tokio::spawn(async move {
                if let Err(e) = web_server::start_web_server(port, state).await {
                    error!("Web server failed: {:?}", e);
                }
            });

            let ctrl_c = tokio::signal::ctrl_c();
            // Pin the ctrl_c future to the stack so its address is stable
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, initiating shutdown...");
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(_) => info!("Web server task completed unexpectedly."),
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }

            if !web_server_handle.is_finished() {
                info!("Aborting web server task...");
                web_server_handle.abort();
            }
            info!("Shutdown complete.");
        }
        Commands::Chat {
            server,
            direct,
            catalog,
            timeout_secs,
        } => {
            let stdin = std::io::stdin().lock();
            let stdout = std::io::stdout().lock();
            if direct {
                let catalog = Arc::new(Catalog::load(catalog.as_deref()).context("Failed to load catalog")?);
                let llm = GeminiClient::from_env(&constants::GEMINI_CLIENT_KEY, Duration::from_secs(timeout_secs))
                    .context("Failed to build Gemini client")?;
                let backend = DirectClient::new(llm, catalog);
                chat::run_chat(&backend, stdin, stdout)
                    .await
                    .context("Chat session failed")?;
            } else {
                let backend = ServerClient::new(&server, Duration::from_secs(timeout_secs))?;
                chat::run_chat(&backend, stdin, stdout)
                    .await
                    .context("Chat session failed")?;
            }
        }
        Commands::Catalog { catalog } => {
            let catalog = Catalog::load(catalog.as_deref()).context("Failed to load catalog")?;
            for phone in catalog.phones() {
                println!("{} ({}) - ₹{}", phone.name, phone.brand, phone.price);
            }
        }
    }

    Ok(())
}
