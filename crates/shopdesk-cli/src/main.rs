use clap::Parser;
use shopdesk_core::core::app_context::AppContext;
use shopdesk_core::error::{AppError, CliError};
use shopdesk_core::storage::config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::command_handlers::flush_notifications;
use cli::dispatcher::Dispatcher;
use cli::main_types::Cli;

/// `RUST_LOG` wins; otherwise warnings only, or debug for our crates with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,shopdesk=debug,shopdesk_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_dir = cli.config_dir.as_ref().map(PathBuf::from);
    let config = match Config::file_in(config_dir.as_deref()).and_then(|p| Config::load(Some(p))) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {}", err);
            std::process::exit(1);
        }
    };

    if let Some(dir) = &config_dir {
        log::debug!("Using config directory: {}", dir.display());
    }

    let ctx = Arc::new(AppContext::new());
    let dispatcher = Dispatcher::new(config, config_dir, cli.api_url, cli.format);
    let result = dispatcher.dispatch(cli.command, ctx.clone()).await;

    flush_notifications(&ctx);
    if ctx.take_redirect().is_some() {
        eprintln!("Your session has ended. Run 'shopdesk auth login' to sign in again.");
    }

    if let Err(e) = result {
        if !matches!(e, AppError::Cli(CliError::ActionFailed(_))) {
            eprintln!("{} Error: {}", e.severity().emoji(), e.display_friendly());
            if let Some(hint) = e.troubleshooting_hint() {
                eprintln!("Hint: {}", hint);
            }
        }
        std::process::exit(1);
    }
}
