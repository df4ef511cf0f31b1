//! Callback-button presses: language switches and deferred audio downloads.

use std::sync::Arc;

use teloxide::{prelude::*, types::CallbackQuery};
use tracing::{error, info, warn};

use ttd_core::{
    domain::{ChatId, MediaKind, UserId},
    fetch::{self, UpstreamError},
    formatting::escape_html,
    texts::{render, text, Lang, TextKey},
};

use super::{commands, text::StatusObserver};
use crate::router::AppState;

/// Audio-title characters that are unsafe in a filename.
fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' => '-',
            other => other,
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "tiktok_audio".to_string()
    } else {
        trimmed.to_string()
    }
}

pub async fn handle_callback(
    _bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let data = q.data.clone().unwrap_or_default();
    let chat = q.message.as_ref().map(|m| ChatId(m.chat.id.0));

    // Always acknowledge the press so the button stops spinning.
    if let Err(e) = state.messenger.answer_callback_query(&q.id, None).await {
        warn!(error = %e, "failed to answer callback query");
    }

    let Some(chat) = chat else {
        return Ok(());
    };

    let user_id = UserId(q.from.id.0 as i64);
    if state.store.is_banned(user_id) {
        warn!(user_id = user_id.0, "banned user callback ignored");
        return Ok(());
    }
    state.store.touch_user(
        user_id,
        q.from.username.as_deref(),
        Some(q.from.first_name.as_str()),
    );

    let lang = state.store.language(chat);
    info!(chat_id = chat.0, data = %data, "callback received");

    if let Some(code) = data.strip_prefix("lang:") {
        change_language(chat, code, &state).await;
        return Ok(());
    }

    if let Some(token) = data.strip_prefix("audio:") {
        audio_flow(chat, token, lang, &state).await;
        return Ok(());
    }

    match data.as_str() {
        "start" => commands::send_start(chat, lang, &state).await,
        "help" => commands::send_help(chat, lang, &state).await,
        "runtime" => commands::send_runtime(chat, lang, &state).await,
        other => warn!(chat_id = chat.0, data = other, "unknown callback data"),
    }

    Ok(())
}

async fn change_language(chat: ChatId, code: &str, state: &Arc<AppState>) {
    let Some(lang) = Lang::from_code(code) else {
        warn!(chat_id = chat.0, code, "unknown language code");
        return;
    };
    state.store.set_language(chat, lang);

    let confirmation = render(
        text(lang, TextKey::LanguageChanged),
        &[("language", lang.display_name())],
    );
    let _ = state.messenger.send_text(chat, &confirmation).await;
    commands::send_start(chat, lang, state).await;
}

/// Re-fetch the post referenced by a link-cache token and upload its audio
/// track. The resolved media URLs from the first fetch are long gone by now,
/// so the whole resolve runs again under the same retry policy.
async fn audio_flow(chat: ChatId, token: &str, lang: Lang, state: &Arc<AppState>) {
    let Some(source_url) = state.links.get(token) else {
        warn!(chat_id = chat.0, token, "audio token expired");
        let _ = state
            .messenger
            .send_text(chat, text(lang, TextKey::LinkExpired))
            .await;
        return;
    };

    let processing = match state
        .messenger
        .send_text(chat, text(lang, TextKey::AudioProcessing))
        .await
    {
        Ok(m) => m,
        Err(e) => {
            warn!(chat_id = chat.0, error = %e, "failed to send audio processing message");
            return;
        }
    };

    let policy = state.cfg.download_policy("tiktok audio download");
    let observer = StatusObserver {
        messenger: state.messenger.clone(),
        target: processing,
        lang,
        max_attempts: policy.max_attempts,
    };

    let resolver = state.resolver.clone();
    let url = source_url.clone();
    let outcome = fetch::run(
        &policy,
        || {
            let resolver = resolver.clone();
            let url = url.clone();
            async move {
                let res = resolver.resolve(&url).await?;
                let audio_url = res.audio_url.clone().ok_or_else(|| {
                    UpstreamError::Message("audio url not found on re-fetch".to_string())
                })?;
                let bytes = resolver.fetch_bytes(&audio_url).await?;
                Ok((res, bytes))
            }
        },
        Some(&observer),
    )
    .await;

    if let Err(e) = state.messenger.delete_message(processing).await {
        warn!(chat_id = chat.0, error = %e, "failed to delete audio processing message");
    }

    match outcome {
        Ok((res, bytes)) => {
            let file_name = format!(
                "{}.mp3",
                sanitize_filename(res.audio_title.as_deref().unwrap_or("tiktok_audio"))
            );
            let caption = res
                .title
                .as_deref()
                .map(|t| format!("Audio: {}", escape_html(t)));

            match state
                .messenger
                .send_audio_bytes(chat, &file_name, bytes, caption.as_deref())
                .await
            {
                Ok(_) => {
                    info!(chat_id = chat.0, file_name, "audio sent");
                    state.store.track_download(MediaKind::Audio, true);
                }
                Err(e) => {
                    error!(chat_id = chat.0, error = %e, "failed to send audio");
                    state.store.track_download(MediaKind::Audio, false);
                    let _ = state
                        .messenger
                        .send_text(chat, text(lang, TextKey::AudioFailed))
                        .await;
                }
            }
        }
        Err(err) => {
            error!(chat_id = chat.0, error = %err, "audio download failed");
            state.store.track_download(MediaKind::Audio, false);
            let _ = state
                .messenger
                .send_text(chat, text(lang, TextKey::AudioFailed))
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("my song"), "my song");
        assert_eq!(sanitize_filename("a/b:c*d"), "a-b-c-d");
        assert_eq!(sanitize_filename("  "), "tiktok_audio");
        assert_eq!(sanitize_filename("///"), "---");
    }

    #[test]
    fn callback_prefixes_parse() {
        assert_eq!("audio:k3x9q".strip_prefix("audio:"), Some("k3x9q"));
        assert_eq!("lang:id".strip_prefix("lang:"), Some("id"));
        assert_eq!("help".strip_prefix("audio:"), None);
    }
}
