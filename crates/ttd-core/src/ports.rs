use async_trait::async_trait;

use crate::fetch::UpstreamError;

/// Result of resolving one TikTok post through the upstream API.
///
/// The upstream reports photo posts through the same `video` field as real
/// videos, so the distinction is derived here rather than trusted from the
/// payload shape.
#[derive(Clone, Debug, Default)]
pub struct MediaResolution {
    pub title: Option<String>,
    pub audio_title: Option<String>,
    pub video_urls: Vec<String>,
    pub audio_url: Option<String>,
}

impl MediaResolution {
    pub fn has_media(&self) -> bool {
        !self.video_urls.is_empty() || self.audio_url.is_some()
    }

    /// Photo posts arrive either as multiple "video" URLs or as a single
    /// photo-mode/JPEG URL.
    pub fn is_photo_set(&self) -> bool {
        if self.video_urls.len() > 1 {
            return true;
        }
        match self.video_urls.first() {
            Some(url) => url.contains("photomode") || url.ends_with(".jpeg"),
            None => false,
        }
    }

    pub fn primary_video(&self) -> Option<&str> {
        self.video_urls.first().map(String::as_str)
    }
}

/// Port for the unreliable third-party media resolution service.
///
/// Implementations translate their failures into [`UpstreamError`] at this
/// boundary; nothing past it inspects transport-specific error types.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Resolve a TikTok post URL into its downloadable media locators.
    async fn resolve(&self, source_url: &str) -> Result<MediaResolution, UpstreamError>;

    /// Download raw bytes from a previously resolved media locator.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_detection() {
        let none = MediaResolution::default();
        assert!(!none.is_photo_set());
        assert!(!none.has_media());

        let video = MediaResolution {
            video_urls: vec!["https://cdn.example/video.mp4".to_string()],
            ..Default::default()
        };
        assert!(!video.is_photo_set());

        let slideshow = MediaResolution {
            video_urls: vec!["a.jpeg".to_string(), "b.jpeg".to_string()],
            ..Default::default()
        };
        assert!(slideshow.is_photo_set());

        let single_photo = MediaResolution {
            video_urls: vec!["https://cdn.example/photomode/1".to_string()],
            ..Default::default()
        };
        assert!(single_photo.is_photo_set());
    }
}
