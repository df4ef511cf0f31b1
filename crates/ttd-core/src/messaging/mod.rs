pub mod port;
pub mod types;

pub use port::MessagingPort;
pub use types::{ChatAction, InlineButton, InlineKeyboard, MessagingCapabilities};
