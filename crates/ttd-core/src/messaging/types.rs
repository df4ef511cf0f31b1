/// Outgoing "chat action" (typing indicator, etc).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadPhoto,
    UploadVideo,
}

/// Inline keyboard attached to an outgoing message. Buttons either open a
/// URL directly or post a short callback payload back to the bot; resolved
/// media URLs must never travel through the callback variant; callback
/// payloads are size-limited, so a link-cache token goes there instead.
#[derive(Clone, Debug)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug)]
pub enum InlineButton {
    Url { label: String, url: String },
    Callback { label: String, data: String },
}

impl InlineButton {
    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Url {
            label: label.into(),
            url: url.into(),
        }
    }

    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Callback {
            label: label.into(),
            data: data.into(),
        }
    }
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_html: bool,
    pub supports_edit: bool,
    pub supports_reactions: bool,
    pub supports_inline_keyboards: bool,
    pub max_message_len: usize,
    /// Upper bound on a callback button payload, in bytes.
    pub max_callback_data_len: usize,
}
