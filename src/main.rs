// src/main.rs

//! slotwatch CLI
//!
//! Meant to run from a scheduler (cron or similar): one `check` invocation
//! performs one poll cycle and always exits zero, so a transient failure
//! never breaks the schedule.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use slotwatch::config::Config;
use slotwatch::pipeline::{Outcome, Watcher};
use slotwatch::services::TelegramNotifier;
use slotwatch::storage::StateStore;
use slotwatch::utils::http;

/// slotwatch - TLSContact announcement watcher
#[derive(Parser, Debug)]
#[command(name = "slotwatch", version, about = "TLSContact announcement watcher")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one poll cycle (fetch, compare, notify). Always exits zero.
    Check,

    /// Validate configuration and credentials
    Validate,

    /// Show the persisted last-seen announcement
    Status,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();

    match cli.command {
        Command::Check => {
            if let Err(e) = config.validate() {
                // Even a bad configuration must not break the schedule.
                log::error!("Configuration invalid, skipping cycle: {}", e);
                return ExitCode::SUCCESS;
            }

            let client = match http::create_client(&config.watcher) {
                Ok(client) => client,
                Err(e) => {
                    log::error!("HTTP client setup failed, skipping cycle: {}", e);
                    return ExitCode::SUCCESS;
                }
            };

            let store = StateStore::new(&config.watcher.state_file);
            let notifier =
                TelegramNotifier::new(client.clone(), &config.telegram, &config.watcher.url);
            let watcher = Watcher::new(config, client, store, notifier);

            match watcher.run_once().await {
                Outcome::Notified => log::info!("Cycle complete: notification sent"),
                Outcome::NoChange => log::info!("Cycle complete: no change"),
                Outcome::Skipped => log::info!("Cycle complete: skipped"),
            }
            ExitCode::SUCCESS
        }

        Command::Validate => match config.validate() {
            Ok(()) => {
                log::info!("Configuration OK ({} markup profiles)", config.markup.len());
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Configuration invalid: {}", e);
                ExitCode::FAILURE
            }
        },

        Command::Status => {
            let store = StateStore::new(&config.watcher.state_file);
            let stored = store.load().await;
            if stored.is_empty() {
                log::info!("No prior announcement recorded");
            } else {
                log::info!("Last seen: {} ({})", stored.title, stored.date);
            }
            ExitCode::SUCCESS
        }
    }
}
