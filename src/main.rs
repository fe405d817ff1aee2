use log::{error, info};
use std::sync::Arc;

use clap::Parser;
use env_logger::Env;
use log::LevelFilter;
use teloxide::{adaptors::throttle::Limits, prelude::*};

use payout_watch::backend::BackendClient;
use payout_watch::bot;
use payout_watch::config::{Config, DEFAULT_CONFIG_PATH};
use payout_watch::context::AppContext;
use payout_watch::services::monitor::PayoutMonitor;
use payout_watch::services::notification_handler::NotificationHandler;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse command line arguments and setup logging
    let args = Args::parse();
    let log_level = match args.log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level.to_string())).init();

    // 2. Load and check configuration
    let config = Config::load(&args.config);
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e);
    }
    info!("Starting payout watch bot, backend {}", config.backend.url);

    // 3. Wire collaborators into one explicit context
    let token = config.telegram.token.clone().unwrap_or_default();
    let telegram = Bot::new(token).throttle(Limits::default());
    let backend = Arc::new(BackendClient::from_config(&config.backend)?);
    let notifier = Arc::new(NotificationHandler::new(telegram.clone()));
    let ctx = Arc::new(AppContext::from_config(&config, backend, notifier));

    // 4. Periodic check in the background, bot dispatch in the foreground
    let monitor = Arc::new(PayoutMonitor::new(ctx.clone()));
    let check_task = monitor.clone().start();

    bot::run(telegram, ctx, monitor).await;

    check_task.abort();
    info!("Bot stopped");
    Ok(())
}
