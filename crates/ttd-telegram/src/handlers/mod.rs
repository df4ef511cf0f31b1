//! Telegram update handlers.
//!
//! Each handler validates the sender, loads their language, then drives the
//! flow through the core ports; nothing below this layer touches teloxide
//! types directly.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use tracing::warn;

use ttd_core::domain::UserId;

use crate::router::AppState;

mod callback;
mod commands;
mod text;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    if from.is_bot {
        return Ok(());
    }

    let user_id = UserId(from.id.0 as i64);
    if state.store.is_banned(user_id) {
        warn!(user_id = user_id.0, "banned user ignored");
        return Ok(());
    }

    state.store.touch_user(
        user_id,
        from.username.as_deref(),
        Some(from.first_name.as_str()),
    );

    if let Some(body) = msg.text() {
        if body.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
        return text::handle_text(bot, msg, state).await;
    }

    // Non-text updates (stickers, voice, ...) are ignored.
    Ok(())
}
