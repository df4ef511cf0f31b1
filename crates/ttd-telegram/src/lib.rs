//! Telegram adapter (teloxide).
//!
//! This crate implements the `ttd-core` MessagingPort over the Telegram Bot
//! API and hosts the update router plus per-update handlers.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{
        InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia, InputMediaPhoto,
        ParseMode,
    },
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use ttd_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, InlineButton, InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    fn parse_media_url(raw: &str) -> Result<url::Url> {
        url::Url::parse(raw).map_err(|e| Error::External(format!("bad media url {raw:?}: {e}")))
    }

    fn build_markup(keyboard: InlineKeyboard) -> Result<InlineKeyboardMarkup> {
        let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::with_capacity(keyboard.rows.len());
        for row in keyboard.rows {
            let mut out = Vec::with_capacity(row.len());
            for button in row {
                out.push(match button {
                    InlineButton::Url { label, url } => {
                        InlineKeyboardButton::url(label, Self::parse_media_url(&url)?)
                    }
                    InlineButton::Callback { label, data } => {
                        InlineKeyboardButton::callback(label, data)
                    }
                });
            }
            rows.push(out);
        }
        Ok(InlineKeyboardMarkup::new(rows))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_html: true,
            supports_edit: true,
            supports_reactions: true,
            supports_inline_keyboards: true,
            max_message_len: 4096,
            max_callback_data_len: 64,
        }
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat), text.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef {
            chat_id: chat,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .edit_message_text(
                    Self::tg_chat(message.chat_id),
                    Self::tg_msg_id(message.message_id),
                    text.to_string(),
                )
                .parse_mode(ParseMode::Html)
        })
        .await?;
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<()> {
        self.with_retry(|| {
            self.bot.delete_message(
                Self::tg_chat(message.chat_id),
                Self::tg_msg_id(message.message_id),
            )
        })
        .await?;
        Ok(())
    }

    async fn send_chat_action(&self, chat: ChatId, action: ChatAction) -> Result<()> {
        let tg_action = match action {
            ChatAction::Typing => teloxide::types::ChatAction::Typing,
            ChatAction::UploadPhoto => teloxide::types::ChatAction::UploadPhoto,
            ChatAction::UploadVideo => teloxide::types::ChatAction::UploadVideo,
        };
        self.with_retry(|| self.bot.send_chat_action(Self::tg_chat(chat), tg_action))
            .await?;
        Ok(())
    }

    async fn set_reaction(&self, _message: MessageRef, _emoji: &str) -> Result<()> {
        // Teloxide supports reactions via specific payloads; keep this best-effort and optional.
        Ok(())
    }

    async fn send_video_url(
        &self,
        chat: ChatId,
        video_url: &str,
        caption: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        let video = InputFile::url(Self::parse_media_url(video_url)?);
        let markup = keyboard.map(Self::build_markup).transpose()?;

        let msg = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_video(Self::tg_chat(chat), video.clone())
                    .caption(caption.to_string())
                    .parse_mode(ParseMode::Html);
                if let Some(m) = markup.clone() {
                    req = req.reply_markup(m);
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id: chat,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_audio_bytes(
        &self,
        chat: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let audio = InputFile::memory(bytes).file_name(file_name.to_string());

        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_audio(Self::tg_chat(chat), audio.clone());
                if let Some(c) = caption {
                    req = req.caption(c.to_string()).parse_mode(ParseMode::Html);
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id: chat,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_photo_album(
        &self,
        chat: ChatId,
        photo_urls: &[String],
        caption: Option<&str>,
    ) -> Result<()> {
        let mut album: Vec<InputMedia> = Vec::with_capacity(photo_urls.len());
        for (idx, raw) in photo_urls.iter().enumerate() {
            let mut photo = InputMediaPhoto::new(InputFile::url(Self::parse_media_url(raw)?));
            // Telegram shows only the first caption of an album.
            if idx == 0 {
                if let Some(c) = caption {
                    photo = photo.caption(c.to_string()).parse_mode(ParseMode::Html);
                }
            }
            album.push(InputMedia::Photo(photo));
        }

        self.with_retry(|| {
            self.bot
                .send_media_group(Self::tg_chat(chat), album.clone())
        })
        .await?;
        Ok(())
    }

    async fn send_inline_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let markup = Self::build_markup(keyboard)?;

        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat), text.to_string())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup.clone())
            })
            .await?;

        Ok(MessageRef {
            chat_id: chat,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}
