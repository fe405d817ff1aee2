use anyhow::Result;
use log::{error, info};
use teloxide::{
    adaptors::throttle::Throttle,
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
    Bot,
};

use crate::models::Payout;
use crate::services::interaction::{ButtonAction, Prompt, Resolution};

pub const CURRENCY: &str = "KGS";

/// Escape special characters for MarkdownV2
pub fn escape_markdownv2(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|'
            | '{' | '}' | '.' | '!' | '\\' => {
                format!("\\{}", c)
            }
            _ => c.to_string(),
        })
        .collect()
}

pub fn format_amount(payout: &Payout) -> String {
    match payout.amount_value() {
        Some(amount) => format!("{:.1} {}", amount, CURRENCY),
        None => {
            let raw = match &payout.amount {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{} {}", raw, CURRENCY)
        }
    }
}

/// "2025-10-18 18:56:16.050351+03" -> "2025-10-18 18:56:16"
pub fn format_creation_time(raw: &str) -> String {
    let without_offset = raw.split('+').next().unwrap_or(raw);
    let without_fraction = without_offset.split('.').next().unwrap_or(without_offset);
    let trimmed = without_fraction.trim().trim_end_matches('Z').replace('T', " ");
    if trimmed.is_empty() {
        "N/A".to_string()
    } else {
        trimmed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationType {
    /// A new payout needs an operator decision.
    HighValuePayout { payout: Payout, prompt: Prompt },
    AutoAccepted { payout: Payout },
    AutoEvicted { payout: Payout, victim: Payout },
}

/// Delivery of a rendered notification to one chat.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, chat_id: i64, notification: &NotificationType) -> Result<()>;
}

fn payout_card(payout: &Payout) -> String {
    let customer = payout.customer();
    format!(
        "*UUID:* `{}`\n*Клиент:* {}\n*Сумма:* {}\n*Время создания:* {}",
        escape_markdownv2(&payout.uuid),
        escape_markdownv2(if customer.is_empty() { "N/A" } else { &customer }),
        escape_markdownv2(&format_amount(payout)),
        escape_markdownv2(&format_creation_time(&payout.creation_time)),
    )
}

fn candidate_list(candidates: &[Payout]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, p)| {
            escape_markdownv2(&format!(
                "{}. {} | {} | {}",
                i + 1,
                format_amount(p),
                p.customer(),
                p.uuid
            ))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn prompt_footer(prompt: &Prompt) -> String {
    match prompt {
        Prompt::Offer { .. } => escape_markdownv2("В очереди есть место."),
        Prompt::MustEvict { candidates, .. } => format!(
            "{}\n{}",
            escape_markdownv2(&format!(
                "Очередь заполнена ({} в обработке). Выберите выплату для отмены:",
                candidates.len()
            )),
            candidate_list(candidates)
        ),
    }
}

pub fn render(notification: &NotificationType) -> String {
    match notification {
        NotificationType::HighValuePayout { payout, prompt } => format!(
            "*🔔 Выплата больше текущих в обработке\\!*\n\n{}\n\n{}",
            payout_card(payout),
            prompt_footer(prompt)
        ),
        NotificationType::AutoAccepted { payout } => format!(
            "*🤖 Выплата принята автоматически*\n\n{}",
            payout_card(payout)
        ),
        NotificationType::AutoEvicted { payout, victim } => format!(
            "*🤖 Выплата принята автоматически*\n\n{}\n\n*Отменена, чтобы освободить место:*\n{}",
            payout_card(payout),
            payout_card(victim)
        ),
    }
}

pub fn render_resolution(resolution: &Resolution) -> String {
    let evicted_line = |evicted: &Option<Payout>| match evicted {
        Some(victim) => escape_markdownv2(&format!(
            "Отменена {} ({}).\n",
            victim.uuid,
            format_amount(victim)
        )),
        None => String::new(),
    };

    match resolution {
        Resolution::Accepted { payout_id, evicted } => format!(
            "{}✅ *Принята* `{}`",
            evicted_line(evicted),
            escape_markdownv2(payout_id)
        ),
        Resolution::StillFull { evicted, prompt } => format!(
            "{}Выплата `{}` всё ещё не помещается\\.\n{}",
            evicted_line(evicted),
            escape_markdownv2(prompt.payout_id()),
            prompt_footer(prompt)
        ),
    }
}

/// Inline keyboard for a prompt: one accept button, or one evict button per candidate.
pub fn keyboard(prompt: &Prompt) -> InlineKeyboardMarkup {
    let rows = prompt
        .buttons()
        .into_iter()
        .map(|button| {
            let label = match button.action {
                ButtonAction::Accept => "✅ Принять".to_string(),
                ButtonAction::Evict => format!("❌ Отменить #{}", button.index + 1),
            };
            vec![InlineKeyboardButton::callback(label, button.encode())]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

pub struct NotificationHandler {
    bot: Throttle<Bot>,
}

impl NotificationHandler {
    pub fn new(bot: Throttle<Bot>) -> Self {
        Self { bot }
    }
}

#[async_trait::async_trait]
impl Notifier for NotificationHandler {
    async fn notify(&self, chat_id: i64, notification: &NotificationType) -> Result<()> {
        let text = render(notification);
        let request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::MarkdownV2);
        let result = match notification {
            NotificationType::HighValuePayout { prompt, .. } => {
                request.reply_markup(keyboard(prompt)).send().await
            }
            _ => request.send().await,
        };

        if let Err(e) = result {
            error!("Failed to send notification to {}: {}", chat_id, e);
            return Err(e.into());
        }
        info!("Notification sent to {}", chat_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AutoModeConfig;
    use teloxide::types::InlineKeyboardButtonKind;

    fn sample() -> Payout {
        let mut payout = Payout::new("abc-1", 120.0, "2025-10-18 18:56:16.050351+03");
        payout.customer_name = "Ivan".to_string();
        payout.customer_surname = "Petrov".to_string();
        payout
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_markdownv2("1.5 (x)"), "1\\.5 \\(x\\)");
        assert_eq!(escape_markdownv2("a-b_c*d"), "a\\-b\\_c\\*d");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(&sample()), "120.0 KGS");
        let mut raw = sample();
        raw.amount = serde_json::json!("n/a");
        assert_eq!(format_amount(&raw), "n/a KGS");
    }

    #[test]
    fn test_format_creation_time() {
        assert_eq!(
            format_creation_time("2025-10-18 18:56:16.050351+03"),
            "2025-10-18 18:56:16"
        );
        assert_eq!(
            format_creation_time("2025-10-18T15:56:16Z"),
            "2025-10-18 15:56:16"
        );
        assert_eq!(format_creation_time(""), "N/A");
    }

    #[test]
    fn test_render_offer() {
        let text = render(&NotificationType::HighValuePayout {
            payout: sample(),
            prompt: Prompt::Offer {
                payout_id: "abc-1".to_string(),
            },
        });
        assert!(text.contains("`abc\\-1`"));
        assert!(text.contains("Ivan Petrov"));
        assert!(text.contains("120\\.0 KGS"));
        assert!(text.contains("2025\\-10\\-18 18:56:16"));
    }

    #[test]
    fn test_must_evict_keyboard_numbers_candidates() {
        let candidates = vec![Payout::new("P1", 10.0, ""), Payout::new("P0", 50.0, "")];
        let prompt = Prompt::MustEvict {
            payout_id: "abc-1".to_string(),
            candidates,
        };
        let markup = keyboard(&prompt);
        assert_eq!(markup.inline_keyboard.len(), 2);

        let second = &markup.inline_keyboard[1][0];
        assert_eq!(second.text, "❌ Отменить #2");
        match &second.kind {
            InlineKeyboardButtonKind::CallbackData(data) => {
                let decoded = crate::services::interaction::ButtonPayload::decode(data).unwrap();
                assert_eq!(decoded.index, 1);
                assert_eq!(decoded.payout_id, "abc-1");
            }
            other => panic!("unexpected button kind {:?}", other),
        }

        let text = render(&NotificationType::HighValuePayout {
            payout: sample(),
            prompt,
        });
        assert!(text.contains("1\\. 10\\.0 KGS"));
        assert!(text.contains("2\\. 50\\.0 KGS"));
    }

    #[test]
    fn test_operator_texts_are_russian() {
        let evicted = render(&NotificationType::AutoEvicted {
            payout: sample(),
            victim: Payout::new("P1", 10.0, ""),
        });
        assert!(evicted.starts_with("*🤖 Выплата принята автоматически*"));
        assert!(evicted.contains("*Отменена, чтобы освободить место:*"));

        let still_full = render_resolution(&Resolution::StillFull {
            evicted: None,
            prompt: Prompt::MustEvict {
                payout_id: "abc-1".to_string(),
                candidates: vec![Payout::new("P1", 10.0, "")],
            },
        });
        assert!(still_full.contains("всё ещё не помещается"));
        assert!(still_full.contains("Очередь заполнена \\(1 в обработке\\)"));

        let offer = keyboard(&Prompt::Offer {
            payout_id: "abc-1".to_string(),
        });
        assert_eq!(offer.inline_keyboard[0][0].text, "✅ Принять");
        assert_eq!(AutoModeConfig::Unbounded.to_string(), "включен (любая сумма)");
    }

    #[test]
    fn test_render_resolution() {
        let accepted = render_resolution(&Resolution::Accepted {
            payout_id: "abc-1".to_string(),
            evicted: Some(Payout::new("P1", 10.0, "")),
        });
        assert!(accepted.starts_with("Отменена P1 \\(10\\.0 KGS\\)\\."));
        assert!(accepted.contains("*Принята* `abc\\-1`"));
    }
}
