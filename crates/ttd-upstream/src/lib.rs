//! Upstream media-resolver adapter (HTTP).
//!
//! Talks to the TikTok resolver API over reqwest and converts every failure
//! into [`UpstreamError`] at this boundary. The payload shape it tolerates is
//! deliberately loose: the upstream has shipped `video` as both a string and
//! an array of strings, and `audio` as both a string and an array.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use ttd_core::fetch::{TransportCode, UpstreamError};
use ttd_core::ports::{MediaResolution, MediaResolver};

const USER_AGENT: &str = "TikTok-Downloader-Bot/1.0";

#[derive(Clone, Debug)]
pub struct UpstreamClient {
    base_url: String,
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("reqwest client build");
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    fn resolve_endpoint(&self, source_url: &str) -> Result<url::Url, UpstreamError> {
        let mut endpoint = url::Url::parse(&self.base_url)
            .and_then(|u| u.join("/api/"))
            .map_err(|e| UpstreamError::Message(format!("bad upstream url: {e}")))?;
        endpoint.query_pairs_mut().append_pair("url", source_url);
        Ok(endpoint)
    }
}

#[async_trait]
impl MediaResolver for UpstreamClient {
    async fn resolve(&self, source_url: &str) -> Result<MediaResolution, UpstreamError> {
        let endpoint = self.resolve_endpoint(source_url)?;
        debug!(%endpoint, "resolving media");

        let resp = self
            .http
            .get(endpoint)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body: Value = resp.json().await.map_err(map_reqwest_error)?;
        Ok(parse_resolution(&body))
    }

    async fn fetch_bytes(&self, media_url: &str) -> Result<Vec<u8>, UpstreamError> {
        let resp = self
            .http
            .get(media_url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let bytes = resp.bytes().await.map_err(map_reqwest_error)?;
        Ok(bytes.to_vec())
    }
}

/// Translate a reqwest failure into the closed upstream error union.
fn map_reqwest_error(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        return UpstreamError::Transport(TransportCode::TimedOut);
    }
    if e.is_connect() {
        return UpstreamError::Transport(TransportCode::ConnectionRefused);
    }
    if let Some(status) = e.status() {
        return UpstreamError::Status(status.as_u16());
    }
    UpstreamError::Message(e.to_string())
}

/// Extract media locators from the resolver payload.
///
/// Some deployments wrap the interesting fields in a `data` envelope, some
/// return them at the top level. Missing fields degrade to an empty
/// resolution rather than an error; the caller decides whether "no media"
/// is fatal.
fn parse_resolution(body: &Value) -> MediaResolution {
    let data = body.get("data").filter(|d| d.is_object()).unwrap_or(body);

    let video_urls = match data.get("video") {
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    let audio_url = match data.get("audio") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .find(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    };

    let title = data
        .get("title")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let audio_title = data
        .get("title_audio")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    MediaResolution {
        title,
        audio_title,
        video_urls,
        audio_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_video_array_payload() {
        let body = json!({
            "title": "dance clip",
            "title_audio": "original sound",
            "video": ["https://cdn.example/v.mp4"],
            "audio": "https://cdn.example/a.mp3",
        });
        let res = parse_resolution(&body);
        assert_eq!(res.title.as_deref(), Some("dance clip"));
        assert_eq!(res.audio_title.as_deref(), Some("original sound"));
        assert_eq!(res.primary_video(), Some("https://cdn.example/v.mp4"));
        assert_eq!(res.audio_url.as_deref(), Some("https://cdn.example/a.mp3"));
        assert!(!res.is_photo_set());
    }

    #[test]
    fn parses_scalar_video_and_audio_array() {
        let body = json!({
            "video": "https://cdn.example/solo.mp4",
            "audio": ["https://cdn.example/a.mp3", "https://cdn.example/b.mp3"],
        });
        let res = parse_resolution(&body);
        assert_eq!(res.video_urls, vec!["https://cdn.example/solo.mp4"]);
        assert_eq!(res.audio_url.as_deref(), Some("https://cdn.example/a.mp3"));
    }

    #[test]
    fn parses_data_envelope() {
        let body = json!({
            "code": 0,
            "data": {
                "video": ["https://cdn.example/1.jpeg", "https://cdn.example/2.jpeg"],
                "title": "slideshow",
            },
        });
        let res = parse_resolution(&body);
        assert_eq!(res.video_urls.len(), 2);
        assert!(res.is_photo_set());
        assert_eq!(res.title.as_deref(), Some("slideshow"));
    }

    #[test]
    fn empty_payload_has_no_media() {
        let res = parse_resolution(&json!({}));
        assert!(!res.has_media());
        assert!(res.title.is_none());

        let blank = parse_resolution(&json!({ "video": [], "audio": "" }));
        assert!(!blank.has_media());
    }

    #[test]
    fn resolve_endpoint_encodes_query() {
        let client = UpstreamClient::new("https://www.tikwm.com", Duration::from_secs(5));
        let endpoint = client
            .resolve_endpoint("https://vt.tiktok.com/ZS1234/?k=v")
            .unwrap();
        assert_eq!(endpoint.host_str(), Some("www.tikwm.com"));
        assert_eq!(endpoint.path(), "/api/");
        let q = endpoint.query().unwrap();
        assert!(q.contains("url=https%3A%2F%2Fvt.tiktok.com"));
    }
}
