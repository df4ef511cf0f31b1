//! Classify upstream errors into retryable vs. fatal.

use super::error::UpstreamError;

/// Whether an error is worth retrying at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retryability {
    Retryable,
    Fatal,
}

/// HTTP-like status codes that indicate a time-bound upstream problem.
/// 520/521/522/524 are Cloudflare-specific "origin unhappy" statuses.
const RETRYABLE_STATUSES: [u16; 10] = [408, 429, 500, 502, 503, 504, 520, 521, 522, 524];

/// Free-text fallback for error payload shapes the primary checks miss.
const NETWORK_KEYWORDS: [&str; 6] = [
    "network",
    "timeout",
    "socket hang up",
    "getaddrinfo",
    "request failed",
    "connection refused",
];

/// Decide whether `err` is worth another attempt. First match wins:
/// known transient transport codes, then the retryable status list, then a
/// case-insensitive keyword scan of the message; anything else is fatal.
///
/// Pure function, no side effects. The decision is final: the orchestrator
/// never re-classifies an error between attempts.
pub fn classify(err: &UpstreamError) -> Retryability {
    match err {
        // The transport code set is transient by construction (adapters only
        // build one for recognized network conditions).
        UpstreamError::Transport(_) => Retryability::Retryable,

        UpstreamError::Status(code) if RETRYABLE_STATUSES.contains(code) => {
            Retryability::Retryable
        }
        UpstreamError::Status(_) => Retryability::Fatal,

        UpstreamError::Message(text) => {
            let lower = text.to_lowercase();
            if NETWORK_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                Retryability::Retryable
            } else {
                Retryability::Fatal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::error::TransportCode;

    #[test]
    fn transport_codes_are_retryable() {
        for code in [
            TransportCode::ConnectionReset,
            TransportCode::ConnectionRefused,
            TransportCode::TimedOut,
            TransportCode::DnsFailure,
            TransportCode::BrokenPipe,
            TransportCode::Aborted,
            TransportCode::Unreachable,
        ] {
            assert_eq!(
                classify(&UpstreamError::Transport(code)),
                Retryability::Retryable,
                "{code} should be retryable"
            );
        }
    }

    #[test]
    fn retryable_status_list() {
        for code in [408u16, 429, 500, 502, 503, 504, 520, 521, 522, 524] {
            assert_eq!(
                classify(&UpstreamError::Status(code)),
                Retryability::Retryable,
                "status {code}"
            );
        }
    }

    #[test]
    fn client_errors_are_fatal() {
        for code in [400u16, 401, 403, 404, 410, 451] {
            assert_eq!(classify(&UpstreamError::Status(code)), Retryability::Fatal);
        }
    }

    #[test]
    fn message_keywords_are_retryable_case_insensitive() {
        for msg in [
            "Network Error",
            "request TIMEOUT while reading body",
            "socket hang up",
            "getaddrinfo ENOTFOUND api.example.com",
            "Request failed with an unknown error",
            "Connection Refused by peer",
        ] {
            assert_eq!(
                classify(&UpstreamError::Message(msg.to_string())),
                Retryability::Retryable,
                "{msg}"
            );
        }
    }

    #[test]
    fn unknown_messages_are_fatal() {
        for msg in ["content not found", "malformed response body", "forbidden"] {
            assert_eq!(
                classify(&UpstreamError::Message(msg.to_string())),
                Retryability::Fatal,
                "{msg}"
            );
        }
    }
}
