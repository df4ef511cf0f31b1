//! Error shapes for the fetch pipeline.
//!
//! Upstream failures arrive through heterogeneous shapes (raw transport
//! errors vs. structured API error payloads). Adapters translate them ONCE
//! at the system boundary into [`UpstreamError`], a closed tagged union the
//! classifier can pattern-match instead of probing unknown fields.

use std::fmt;
use std::time::Duration;

/// Known transient transport-level failure codes.
///
/// An adapter only constructs one of these when the underlying error is a
/// recognized network condition; everything else must go through
/// [`UpstreamError::Status`] or [`UpstreamError::Message`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportCode {
    ConnectionReset,
    ConnectionRefused,
    TimedOut,
    DnsFailure,
    BrokenPipe,
    Aborted,
    Unreachable,
}

impl fmt::Display for TransportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportCode::ConnectionReset => "connection reset",
            TransportCode::ConnectionRefused => "connection refused",
            TransportCode::TimedOut => "timed out",
            TransportCode::DnsFailure => "dns failure",
            TransportCode::BrokenPipe => "broken pipe",
            TransportCode::Aborted => "aborted",
            TransportCode::Unreachable => "network unreachable",
        };
        f.write_str(s)
    }
}

/// Error produced by one upstream call, as seen by the classifier.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Transport-level failure mapped from the HTTP client.
    #[error("transport error: {0}")]
    Transport(TransportCode),

    /// HTTP-like status code from a structured error response.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// Free-text failure description of unknown shape.
    #[error("{0}")]
    Message(String),
}

/// Classified terminal outcome of an orchestrated fetch.
///
/// `Transient` only surfaces wrapped inside `RetryExhausted`; a retryable
/// failure with attempts left is consumed by the next attempt.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transient failure: {cause}")]
    Transient { cause: UpstreamError },

    #[error("fatal failure: {cause}")]
    Fatal { cause: UpstreamError },

    #[error("{label} timed out after {limit:?}")]
    Timeout { label: String, limit: Duration },

    #[error("gave up after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    /// True when the upstream reported the content itself is gone or missing,
    /// so the caller can show a dedicated message instead of a generic one.
    pub fn is_content_not_found(&self) -> bool {
        match self {
            FetchError::Fatal {
                cause: UpstreamError::Message(text),
            } => text.to_lowercase().contains("content not found"),
            FetchError::Fatal {
                cause: UpstreamError::Status(404),
            } => true,
            _ => false,
        }
    }
}
