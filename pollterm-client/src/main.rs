//! pollterm client - terminal front end for HTTP-polled remote terminals
//!
//! Puts the local terminal in raw mode, forwards every key to the host and
//! shows the screen the host sends back.

use pollterm_utils::{init_logging_with_config, LogConfig, Result};

mod cli;
mod config;
mod connection;
mod input;
mod session;
mod ui;

use cli::Args;
use config::Settings;
use ui::App;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments first (before terminal setup)
    let args = Args::parse_args();

    // Initialize logging to file (not stderr, since we're using the terminal)
    let log_config = if args.debug {
        LogConfig::debug()
    } else {
        LogConfig::client()
    };
    init_logging_with_config(log_config)?;
    tracing::info!("pollterm client starting");
    tracing::debug!("CLI args: {:?}", args);

    match run_app(args).await {
        Ok(()) => {
            tracing::info!("pollterm client exiting normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("pollterm client error: {}", e);
            // Print error to stderr after terminal restoration
            eprintln!("Error: {}", e);
            Err(e)
        }
    }
}

async fn run_app(args: Args) -> Result<()> {
    let settings = Settings::load(&args)?;
    tracing::debug!("Effective settings: {:?}", settings);

    let mut app = App::new(settings);
    app.run().await
}
