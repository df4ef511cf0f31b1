//! Plain-text messages: TikTok link downloads and strictness nudges.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use teloxide::{prelude::*, types::Message};
use tracing::{error, info, warn};

use ttd_core::{
    domain::{ChatId, MediaKind, MessageId, MessageRef},
    fetch::{self, RetryNotice, RetryObserver, UpstreamError},
    formatting::{escape_html, truncate_title},
    messaging::{port::MessagingPort, types::{ChatAction, InlineButton, InlineKeyboard}},
    ports::MediaResolution,
    texts::{render, text, Lang, TextKey},
};

use crate::router::AppState;

fn tiktok_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https://(www\.)?(vt\.)?tiktok\.com/\S*$").expect("valid regex")
    })
}

fn is_strict_tiktok_link(body: &str) -> bool {
    tiktok_link_re().is_match(body.trim())
}

fn mentions_tiktok(body: &str) -> bool {
    body.contains("tiktok.com/")
}

/// Emoji reaction acknowledging a received link, varied per message.
fn pick_reaction() -> &'static str {
    const REACTIONS: [&str; 8] = ["👍", "❤️", "🔥", "🥰", "👏", "🎉", "⚡", "💯"];
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as usize;
    REACTIONS[nanos % REACTIONS.len()]
}

/// Edits the processing message before every backoff sleep so the user can
/// see the attempt counter move.
pub(super) struct StatusObserver {
    pub(super) messenger: Arc<dyn MessagingPort>,
    pub(super) target: MessageRef,
    pub(super) lang: Lang,
    pub(super) max_attempts: u32,
}

#[async_trait::async_trait]
impl RetryObserver for StatusObserver {
    async fn on_retry(&self, notice: RetryNotice) -> ttd_core::Result<()> {
        let body = render(
            text(self.lang, TextKey::RetryingDownload),
            &[
                ("attempt", &notice.next_attempt.to_string()),
                ("max", &self.max_attempts.to_string()),
            ],
        );
        self.messenger.edit_text(self.target, &body).await
    }
}

pub async fn handle_text(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(body) = msg.text() else {
        return Ok(());
    };
    let chat = ChatId(msg.chat.id.0);
    let lang = state.store.language(chat);

    if is_strict_tiktok_link(body) {
        let incoming = MessageRef {
            chat_id: chat,
            message_id: MessageId(msg.id.0),
        };
        let _ = state
            .messenger
            .set_reaction(incoming, pick_reaction())
            .await;
        download_flow(chat, body.trim(), lang, &state).await;
        return Ok(());
    }

    // Everything else only gets a reply in private chats; groups stay quiet.
    if !msg.chat.is_private() {
        return Ok(());
    }

    let key = if mentions_tiktok(body) {
        warn!(chat_id = chat.0, "tiktok link with extra text rejected");
        TextKey::StrictLinkOnly
    } else {
        TextKey::InvalidUrl
    };
    if let Err(e) = state.messenger.send_text(chat, text(lang, key)).await {
        warn!(chat_id = chat.0, error = %e, "failed to send rejection");
    }
    Ok(())
}

async fn download_flow(chat: ChatId, source_url: &str, lang: Lang, state: &Arc<AppState>) {
    info!(chat_id = chat.0, url = source_url, "tiktok link received");

    let _ = state.messenger.send_chat_action(chat, ChatAction::Typing).await;
    let processing = match state
        .messenger
        .send_text(chat, text(lang, TextKey::Processing))
        .await
    {
        Ok(m) => m,
        Err(e) => {
            warn!(chat_id = chat.0, error = %e, "failed to send processing message");
            return;
        }
    };

    let policy = state.cfg.download_policy("tiktok download");
    let observer = StatusObserver {
        messenger: state.messenger.clone(),
        target: processing,
        lang,
        max_attempts: policy.max_attempts,
    };

    let resolver = state.resolver.clone();
    let url = source_url.to_string();
    let outcome = fetch::run(
        &policy,
        || {
            let resolver = resolver.clone();
            let url = url.clone();
            async move {
                let res = resolver.resolve(&url).await?;
                if !res.has_media() {
                    return Err(UpstreamError::Message("content not found".to_string()));
                }
                Ok(res)
            }
        },
        Some(&observer),
    )
    .await;

    if let Err(e) = state.messenger.delete_message(processing).await {
        warn!(chat_id = chat.0, error = %e, "failed to delete processing message");
    }

    match outcome {
        Ok(res) if res.is_photo_set() => {
            let ok = send_photo_set(chat, source_url, &res, lang, state).await;
            state.store.track_download(MediaKind::Photos, ok);
        }
        Ok(res) => {
            let ok = send_video(chat, source_url, &res, lang, state).await;
            state.store.track_download(MediaKind::Video, ok);
        }
        Err(err) => {
            error!(chat_id = chat.0, url = source_url, error = %err, "download failed");
            state.store.track_download(MediaKind::Video, false);
            let key = if err.is_content_not_found() {
                TextKey::ContentNotFound
            } else {
                TextKey::DownloadFailed
            };
            let _ = state.messenger.send_text(chat, text(lang, key)).await;
        }
    }
}

fn caption_for(res: &MediaResolution, lang: Lang, status: TextKey, max_title: usize) -> String {
    let title = truncate_title(res.title.as_deref().unwrap_or("Not available"), max_title);
    let audio_title = truncate_title(
        res.audio_title.as_deref().unwrap_or("Not available"),
        max_title,
    );
    format!(
        "<b>Title</b> : {}\n<b>Audio</b> : {}\n\n{}",
        escape_html(&title),
        escape_html(&audio_title),
        text(lang, status),
    )
}

/// Button rows under a delivered post. The audio button carries only a cache
/// token; the original source URL stays server-side in the link cache.
fn media_keyboard(state: &AppState, link_label: &str, link_url: &str, source_url: &str, has_audio: bool) -> InlineKeyboard {
    let mut row = vec![InlineButton::url(link_label, link_url)];
    if has_audio {
        let token = state.links.put(source_url);
        row.push(InlineButton::callback(
            "🎧 Download Audio",
            format!("audio:{token}"),
        ));
    }
    InlineKeyboard::new(vec![
        row,
        vec![InlineButton::url("❤️ Support iuno.in", state.cfg.support_url.clone())],
    ])
}

async fn send_video(
    chat: ChatId,
    source_url: &str,
    res: &MediaResolution,
    lang: Lang,
    state: &Arc<AppState>,
) -> bool {
    let Some(video_url) = res.primary_video() else {
        let _ = state
            .messenger
            .send_text(chat, text(lang, TextKey::NoVideoUrl))
            .await;
        return false;
    };

    let caption = caption_for(res, lang, TextKey::VideoDownloaded, state.cfg.max_title_length);
    let keyboard = media_keyboard(
        state,
        "🔗 Video URL",
        video_url,
        source_url,
        res.audio_url.is_some(),
    );

    match state
        .messenger
        .send_video_url(chat, video_url, &caption, Some(keyboard))
        .await
    {
        Ok(_) => {
            info!(chat_id = chat.0, "video sent");
            true
        }
        Err(e) => {
            error!(chat_id = chat.0, error = %e, "failed to send video");
            let _ = state
                .messenger
                .send_text(chat, text(lang, TextKey::DownloadFailed))
                .await;
            false
        }
    }
}

async fn send_photo_set(
    chat: ChatId,
    source_url: &str,
    res: &MediaResolution,
    lang: Lang,
    state: &Arc<AppState>,
) -> bool {
    let status = if res.video_urls.len() > 1 {
        TextKey::SlideshowDownloaded
    } else {
        TextKey::PhotoDownloaded
    };
    let caption = render(
        &caption_for(res, lang, status, state.cfg.max_title_length),
        &[("count", &res.video_urls.len().to_string())],
    );

    let _ = state
        .messenger
        .send_chat_action(chat, ChatAction::UploadPhoto)
        .await;
    if let Err(e) = state
        .messenger
        .send_photo_album(chat, &res.video_urls, Some(&caption))
        .await
    {
        error!(chat_id = chat.0, error = %e, "failed to send photo album");
        let _ = state
            .messenger
            .send_text(chat, text(lang, TextKey::DownloadFailed))
            .await;
        return false;
    }

    // Album captions cannot carry buttons, so the links go in a follow-up.
    let keyboard = media_keyboard(
        state,
        "🔗 URL Source",
        source_url,
        source_url,
        res.audio_url.is_some(),
    );
    if let Err(e) = state
        .messenger
        .send_inline_keyboard(chat, text(lang, TextKey::ExtraLinks), keyboard)
        .await
    {
        warn!(chat_id = chat.0, error = %e, "failed to send album links");
    }

    info!(chat_id = chat.0, photos = res.video_urls.len(), "photo set sent");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_link_matching() {
        assert!(is_strict_tiktok_link("https://vt.tiktok.com/ZS2qsMU1W/"));
        assert!(is_strict_tiktok_link("https://www.tiktok.com/@user/video/123"));
        assert!(is_strict_tiktok_link("  https://tiktok.com/@user/video/1  "));
        assert!(!is_strict_tiktok_link("check this https://vt.tiktok.com/x/"));
        assert!(!is_strict_tiktok_link("https://vt.tiktok.com/x/ please"));
        assert!(!is_strict_tiktok_link("http://vt.tiktok.com/x/"));
        assert!(!is_strict_tiktok_link("hello"));
    }

    #[test]
    fn loose_mention_detection() {
        assert!(mentions_tiktok("grab https://www.tiktok.com/@u/video/9 for me"));
        assert!(!mentions_tiktok("what is the weather"));
    }
}
