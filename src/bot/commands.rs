use log::{error, info};
use std::sync::Arc;
use teloxide::{prelude::*, utils::command::BotCommands};

use super::{BotClient, HandlerResult};
use crate::context::AppContext;
use crate::models::AutoModeConfig;
use crate::services::monitor::PayoutMonitor;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Команды бота:")]
pub enum Command {
    #[command(description = "подписаться на уведомления о выплатах")]
    Start,
    #[command(description = "отписаться от уведомлений")]
    Stop,
    #[command(description = "статус бота")]
    Status,
    #[command(description = "проверить выплаты сейчас")]
    Update,
    #[command(description = "включить или выключить автоматический режим")]
    Auto,
    #[command(description = "автоматически обрабатывать только суммы в диапазоне: /range <min> <max> или /range off")]
    Range(String),
    #[command(description = "показать эту справку")]
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeArg {
    Clear,
    Set { min: f64, max: f64 },
}

pub fn parse_range(arg: &str) -> Result<RangeArg, String> {
    let parts: Vec<&str> = arg.split_whitespace().collect();
    match parts.as_slice() {
        ["off"] | ["clear"] => Ok(RangeArg::Clear),
        [min, max] => {
            let min = min
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|_| format!("'{}' не является числом", min))?;
            let max = max
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|_| format!("'{}' не является числом", max))?;
            Ok(RangeArg::Set { min, max })
        }
        _ => Err("использование: /range <min> <max> или /range off".to_string()),
    }
}

fn max_amount_text(pending: &[crate::models::Payout]) -> String {
    pending
        .iter()
        .filter_map(|p| p.amount_value())
        .fold(None, |max: Option<f64>, amount| {
            Some(max.map_or(amount, |m| m.max(amount)))
        })
        .map(|max| format!("{:.1}", max))
        .unwrap_or_else(|| "0".to_string())
}

pub async fn handle_command(
    bot: BotClient,
    msg: Message,
    cmd: Command,
    ctx: Arc<AppContext>,
    monitor: Arc<PayoutMonitor>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    info!("Command {:?} from chat {}", cmd, chat_id);

    let reply = match cmd {
        Command::Start => match ctx.subscribers.add(chat_id.0).await {
            Ok(()) => format!(
                "✅ Вы подписаны на уведомления о выплатах!\nВаш ID: {}",
                chat_id.0
            ),
            Err(e) => {
                error!("Failed to subscribe {}: {}", chat_id, e);
                "⚠️ Не удалось сохранить подписку, попробуйте позже".to_string()
            }
        },
        Command::Stop => match ctx.subscribers.remove(chat_id.0).await {
            Ok(()) => "❌ Вы отписаны от уведомлений".to_string(),
            Err(e) => {
                error!("Failed to unsubscribe {}: {}", chat_id, e);
                "⚠️ Не удалось обновить подписку, попробуйте позже".to_string()
            }
        },
        Command::Status => {
            let processed = ctx.ledger.count().await.unwrap_or_else(|e| {
                error!("Failed to read ledger: {}", e);
                0
            });
            let auto_mode = ctx.auto_mode.get().await.unwrap_or_else(|e| {
                error!("Failed to read automatic mode: {}", e);
                AutoModeConfig::Disabled
            });
            let pending = ctx.backend.fetch_pending_payouts().await;
            format!(
                "📊 Статус бота\n\nОбработано выплат: {}\nВ обработке: {} / {}\nМакс сумма в обработке: {}\nАвтоматический режим: {}",
                processed,
                pending.len(),
                ctx.capacity(),
                max_amount_text(&pending),
                auto_mode
            )
        }
        Command::Update => {
            bot.send_message(chat_id, "⏳ Проверяю выплаты...").await?;
            match monitor.run_cycle().await {
                Ok(report) => format!(
                    "✅ Проверка завершена\nВсего: {}, в обработке: {}, новых: {}",
                    report.total,
                    report.pending,
                    report.handled.len()
                ),
                Err(e) => {
                    error!("Manual check failed: {}", e);
                    format!("⚠️ Проверка не удалась: {}", e)
                }
            }
        }
        Command::Auto => match ctx.auto_mode.toggle().await {
            Ok(mode) => format!("🤖 Автоматический режим: {}", mode),
            Err(e) => {
                error!("Failed to toggle automatic mode: {}", e);
                "⚠️ Не удалось изменить автоматический режим".to_string()
            }
        },
        Command::Range(arg) => {
            let result = match parse_range(&arg) {
                Ok(RangeArg::Clear) => ctx.auto_mode.clear_range().await,
                Ok(RangeArg::Set { min, max }) => ctx.auto_mode.set_range(min, max).await,
                Err(usage) => Err(anyhow::anyhow!(usage)),
            };
            match result {
                Ok(mode) => format!("🤖 Автоматический режим: {}", mode),
                Err(e) => format!("⚠️ {}", e),
            }
        }
        Command::Help => Command::descriptions().to_string(),
    };

    bot.send_message(chat_id, reply).await?;
    Ok(())
}
