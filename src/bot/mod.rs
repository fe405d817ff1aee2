pub mod callbacks;
pub mod commands;

use log::{error, info};
use std::sync::Arc;
use teloxide::{adaptors::throttle::Throttle, prelude::*, utils::command::BotCommands};

use crate::context::AppContext;
use crate::services::monitor::PayoutMonitor;
use commands::Command;

pub type BotClient = Throttle<Bot>;
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Serve operator commands and button presses until Ctrl-C.
pub async fn run(bot: BotClient, ctx: Arc<AppContext>, monitor: Arc<PayoutMonitor>) {
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        error!("Failed to set telegram bot commands: {}", e);
    }

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(commands::handle_command),
        )
        .branch(Update::filter_callback_query().endpoint(callbacks::handle_callback));

    info!("Bot is listening for commands");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx, monitor])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
