//! Core domain + application logic for the TikTok downloader bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the upstream
//! media API live behind ports (traits) implemented in adapter crates. The
//! interesting machinery lives in [`fetch`]: the retry orchestrator, the
//! error classifier and the ephemeral link cache.

pub mod config;
pub mod connectivity;
pub mod domain;
pub mod errors;
pub mod fetch;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod store;
pub mod texts;

pub use errors::{Error, Result};
