use log::{info, warn};
use std::sync::Arc;
use teloxide::{prelude::*, types::ParseMode};

use super::{BotClient, HandlerResult};
use crate::context::AppContext;
use crate::errors::InteractionError;
use crate::services::interaction::{resolve_click, ButtonPayload, Resolution};
use crate::services::notification_handler::{escape_markdownv2, keyboard, render_resolution};

/// Decode and resolve a button press.
pub async fn process_click(ctx: &AppContext, data: &str) -> Result<Resolution, InteractionError> {
    let payload = ButtonPayload::decode(data)?;
    info!(
        "Button {:?} #{} for payout {}",
        payload.action, payload.index, payload.payout_id
    );
    resolve_click(ctx.backend.as_ref(), ctx.capacity(), &payload).await
}

pub async fn handle_callback(bot: BotClient, q: CallbackQuery, ctx: Arc<AppContext>) -> HandlerResult {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!("Failed to answer callback query: {}", e);
    }

    let chat_id = q
        .regular_message()
        .map(|m| m.chat.id)
        .unwrap_or_else(|| q.from.id.into());

    // Take the buttons away before touching the backend to limit double clicks.
    if let Some(message) = q.regular_message() {
        if let Err(e) = bot.edit_message_reply_markup(chat_id, message.id).await {
            warn!("Failed to disable buttons on message {}: {}", message.id.0, e);
        }
    }

    let data = q.data.as_deref().unwrap_or_default();
    match process_click(&ctx, data).await {
        Ok(resolution) => {
            let request = bot
                .send_message(chat_id, render_resolution(&resolution))
                .parse_mode(ParseMode::MarkdownV2);
            match &resolution {
                Resolution::StillFull { prompt, .. } => {
                    request.reply_markup(keyboard(prompt)).await?;
                }
                Resolution::Accepted { .. } => {
                    request.await?;
                }
            }
        }
        Err(e) => {
            warn!("Button press from {} failed: {}", chat_id, e);
            bot.send_message(chat_id, escape_markdownv2(&format!("⚠️ {}", e)))
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test::{FakeBackend, RecordingNotifier};

    fn context(backend: Arc<FakeBackend>, dir: &tempfile::TempDir) -> AppContext {
        let mut config = Config::default();
        config.storage.data_dir = dir.path().to_string_lossy().to_string();
        AppContext::from_config(&config, backend, Arc::new(RecordingNotifier::default()))
    }

    #[tokio::test]
    async fn test_malformed_payload_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::with_pending(&[1.0]));
        let ctx = context(backend.clone(), &dir);

        let err = process_click(&ctx, "not-a-payload").await.unwrap_err();
        assert!(matches!(err, InteractionError::MalformedPayload(_)));
        assert!(backend.accepted().is_empty());
    }

    #[tokio::test]
    async fn test_accept_click_uses_embedded_id() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::with_pending(&[1.0]));
        let ctx = context(backend.clone(), &dir);

        let data = ButtonPayload::accept("A").encode();
        let resolution = process_click(&ctx, &data).await.unwrap();
        assert!(matches!(resolution, Resolution::Accepted { .. }));
        assert_eq!(backend.accepted(), vec!["A".to_string()]);
    }
}
