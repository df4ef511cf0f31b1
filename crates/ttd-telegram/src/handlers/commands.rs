//! Slash commands: /start, /help, /runtime and the admin trio.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::{info, warn};

use ttd_core::{
    domain::{ChatId, UserId},
    messaging::types::{InlineButton, InlineKeyboard},
    texts::{runtime_text, text, Lang, TextKey},
};

use crate::router::AppState;

pub async fn handle_command(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(body) = msg.text() else {
        return Ok(());
    };
    let chat = ChatId(msg.chat.id.0);
    let lang = state.store.language(chat);
    let user_id = msg.from().map(|u| u.id.0 as i64).unwrap_or_default();

    let mut parts = body.split_whitespace();
    let raw_cmd = parts.next().unwrap_or("");
    // Group chats address commands as /cmd@botname.
    let cmd = raw_cmd.split('@').next().unwrap_or(raw_cmd);

    info!(chat_id = chat.0, command = cmd, "command received");

    match cmd {
        "/start" => send_start(chat, lang, &state).await,
        "/help" => send_help(chat, lang, &state).await,
        "/runtime" => send_runtime(chat, lang, &state).await,
        "/stats" => {
            if require_admin(chat, user_id, &state).await {
                send_stats(chat, &state).await;
            }
        }
        "/ban" => {
            if require_admin(chat, user_id, &state).await {
                moderate(chat, parts.next(), &state, true).await;
            }
        }
        "/unban" => {
            if require_admin(chat, user_id, &state).await {
                moderate(chat, parts.next(), &state, false).await;
            }
        }
        other => {
            warn!(chat_id = chat.0, command = other, "unknown command ignored");
        }
    }

    Ok(())
}

pub(super) async fn send_start(chat: ChatId, lang: Lang, state: &Arc<AppState>) {
    let keyboard = InlineKeyboard::new(vec![
        vec![
            InlineButton::callback("🇬🇧 English", "lang:en"),
            InlineButton::callback("🇮🇩 Indonesia", "lang:id"),
        ],
        vec![
            InlineButton::callback("📚 Help", "help"),
            InlineButton::callback("🕒 Runtime", "runtime"),
        ],
    ]);
    if let Err(e) = state
        .messenger
        .send_inline_keyboard(chat, text(lang, TextKey::Start), keyboard)
        .await
    {
        warn!(chat_id = chat.0, error = %e, "failed to send start message");
    }
}

pub(super) async fn send_help(chat: ChatId, lang: Lang, state: &Arc<AppState>) {
    if let Err(e) = state
        .messenger
        .send_text(chat, text(lang, TextKey::Help))
        .await
    {
        warn!(chat_id = chat.0, error = %e, "failed to send help message");
    }
}

pub(super) async fn send_runtime(chat: ChatId, lang: Lang, state: &Arc<AppState>) {
    let body = runtime_text(lang, state.started_at.elapsed());
    if let Err(e) = state.messenger.send_text(chat, &body).await {
        warn!(chat_id = chat.0, error = %e, "failed to send runtime message");
    }
}

async fn require_admin(chat: ChatId, user_id: i64, state: &Arc<AppState>) -> bool {
    if state.cfg.is_admin(user_id) {
        return true;
    }
    warn!(chat_id = chat.0, user_id, "admin command denied");
    let _ = state
        .messenger
        .send_text(chat, "❌ Access denied. Admin only feature.")
        .await;
    false
}

async fn send_stats(chat: ChatId, state: &Arc<AppState>) {
    let downloads = state.store.download_stats();
    let body = format!(
        "📊 <b>Bot statistics</b>\n\n\
         👥 Users: <b>{}</b>\n\n\
         🎥 Videos: {} ok / {} failed\n\
         📷 Photos: {} ok / {} failed\n\
         🎧 Audio: {} ok / {} failed\n\n\
         ✅ Total ok: <b>{}</b>\n\
         💔 Total failed: <b>{}</b>\n\
         🔗 Cached links: <b>{}</b>",
        state.store.user_count(),
        downloads.videos_ok,
        downloads.videos_failed,
        downloads.photos_ok,
        downloads.photos_failed,
        downloads.audio_ok,
        downloads.audio_failed,
        downloads.total_ok(),
        downloads.total_failed(),
        state.links.len(),
    );
    if let Err(e) = state.messenger.send_text(chat, &body).await {
        warn!(chat_id = chat.0, error = %e, "failed to send stats");
    }
}

async fn moderate(chat: ChatId, arg: Option<&str>, state: &Arc<AppState>, ban: bool) {
    let Some(target) = arg.and_then(|s| s.parse::<i64>().ok()) else {
        let usage = if ban {
            "Usage: /ban <userID>"
        } else {
            "Usage: /unban <userID>"
        };
        let _ = state.messenger.send_text(chat, usage).await;
        return;
    };

    let target = UserId(target);
    let body = if ban {
        state.store.ban(target);
        info!(user_id = target.0, "user banned");
        format!("🚫 User <code>{}</code> banned.", target.0)
    } else {
        state.store.unban(target);
        info!(user_id = target.0, "user unbanned");
        format!("✅ User <code>{}</code> unbanned.", target.0)
    };
    let _ = state.messenger.send_text(chat, &body).await;
}
