//! Resilient fetch pipeline.
//!
//! This module encapsulates error classification (transport failures,
//! throttling, timeouts), the retry/backoff orchestrator that wraps flaky
//! upstream calls, and the ephemeral link cache that lets a resolved media
//! URL be referenced later by a short opaque token. Higher layers (Telegram
//! handlers) share a single consistent policy through these pieces.

pub mod cache;
pub mod classify;
pub mod error;
pub mod policy;
pub mod run;

pub use cache::{LinkCache, LinkCacheConfig};
pub use classify::{classify, Retryability};
pub use error::{FetchError, TransportCode, UpstreamError};
pub use policy::RetryPolicy;
pub use run::{run, RetryNotice, RetryObserver};
