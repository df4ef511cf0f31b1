use async_trait::async_trait;

use crate::domain::{ChatId, MessageRef};
use crate::messaging::types::{ChatAction, InlineKeyboard, MessagingCapabilities};
use crate::Result;

/// Outbound messaging port. Implemented by the concrete chat-platform
/// adapter; core logic only ever talks through this trait.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef>;

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<()>;

    async fn delete_message(&self, message: MessageRef) -> Result<()>;

    async fn send_chat_action(&self, chat: ChatId, action: ChatAction) -> Result<()>;

    /// Best-effort emoji reaction on a message. Implementations that cannot
    /// react simply return Ok.
    async fn set_reaction(&self, message: MessageRef, emoji: &str) -> Result<()>;

    /// Send a video by remote URL so the platform fetches it server-side.
    async fn send_video_url(
        &self,
        chat: ChatId,
        video_url: &str,
        caption: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef>;

    /// Upload audio from an in-memory buffer.
    async fn send_audio_bytes(
        &self,
        chat: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<MessageRef>;

    /// Send a set of photos as one album, all by remote URL.
    async fn send_photo_album(
        &self,
        chat: ChatId,
        photo_urls: &[String],
        caption: Option<&str>,
    ) -> Result<()>;

    async fn send_inline_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    /// Acknowledge a callback-button press, optionally with a toast text.
    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
