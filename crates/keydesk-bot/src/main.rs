//! keydesk operator console entrypoint.

use anyhow::Context;
use clap::Parser;
use keydesk_bot::commands::Commands;
use keydesk_bot::config::BotConfig;
use keydesk_bot::dispatcher::ActionDispatcher;
use keydesk_bot::handlers;
use keydesk_bot::presence::PresenceRotator;
use keydesk_bot::rate_limit::RateLimiter;
use keydesk_licensing::{HttpLicenseApi, LicenseClient};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keydesk")]
#[command(author, version, about = "License key desk operator console", long_about = None)]
struct Cli {
    /// User id the command runs as
    #[arg(long, global = true, default_value = "console")]
    actor: String,

    /// Print outcomes as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,keydesk=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = BotConfig::load().context("Failed to load configuration")?;
    tracing::debug!(config = ?config, "Loaded configuration");

    let licenses = LicenseClient::new(Arc::new(HttpLicenseApi::new(config.license_config())));
    let dispatcher = ActionDispatcher::new(
        licenses.clone(),
        Arc::new(RateLimiter::new()),
        config.dispatch_settings(),
    );

    if let Some(action) = cli.command.action() {
        let ok = handlers::dispatch(&dispatcher, &cli.actor, action, cli.json).await?;
        if !ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    match cli.command {
        Commands::Executions => handlers::executions(&dispatcher, cli.json).await?,
        Commands::Presence { ticks } => {
            let mut rotator = PresenceRotator::new(
                licenses,
                config.presence_lines(),
                config.presence_interval_secs,
            );
            handlers::presence(&mut rotator, ticks, cli.json).await?
        }
        _ => {}
    }

    Ok(())
}
