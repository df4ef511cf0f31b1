//! Localized user-facing text templates (English and Indonesian).
//!
//! The core never builds user-facing strings from error values directly; the
//! handler layer picks a key from the classified outcome and renders the
//! matching template here.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lang {
    En,
    Id,
}

impl Lang {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" => Some(Lang::En),
            "id" => Some(Lang::Id),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Id => "id",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Lang::En => "English",
            Lang::Id => "Indonesia",
        }
    }
}

impl Default for Lang {
    fn default() -> Self {
        Lang::En
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextKey {
    Start,
    Help,
    Runtime,
    Processing,
    RetryingDownload,
    AudioProcessing,
    InvalidUrl,
    StrictLinkOnly,
    DownloadFailed,
    ContentNotFound,
    LinkExpired,
    NoVideoUrl,
    VideoDownloaded,
    PhotoDownloaded,
    SlideshowDownloaded,
    ExtraLinks,
    AudioFailed,
    LanguageChanged,
}

/// Look up a template. Every key is defined for every language, so there is
/// no fallback path to get wrong.
pub fn text(lang: Lang, key: TextKey) -> &'static str {
    match (lang, key) {
        (Lang::En, TextKey::Start) => {
            "👋 Hi! Send me a TikTok link and I will fetch the video, photos or audio without a watermark.\n\n\
             Send <b>only</b> the link, with no extra text. Example:\n\
             <code>https://vt.tiktok.com/ZS2qsMU1W/</code>\n\n\
             Type /help for the full guide, or pick a language below."
        }
        (Lang::Id, TextKey::Start) => {
            "👋 Halo! Kirim tautan TikTok dan saya akan ambil video, foto, atau audionya tanpa watermark.\n\n\
             Kirim <b>hanya</b> tautannya saja, tanpa teks lain. Contoh:\n\
             <code>https://vt.tiktok.com/ZS2qsMU1W/</code>\n\n\
             Ketik /help untuk panduan lengkap, atau pilih bahasa di bawah."
        }
        (Lang::En, TextKey::Help) => {
            "📚 <b>How to use this bot</b>\n\n\
             1. Open TikTok and pick a video or photo post.\n\
             2. Tap <b>Share</b> → <b>Copy Link</b>.\n\
             3. Paste <b>only</b> the link here.\n\n\
             I will reply with the media and a button to grab the audio separately.\n\
             Curious how long I have been running? Try /runtime."
        }
        (Lang::Id, TextKey::Help) => {
            "📚 <b>Cara pakai bot ini</b>\n\n\
             1. Buka TikTok dan pilih video atau foto.\n\
             2. Ketuk <b>Bagikan</b> → <b>Salin Tautan</b>.\n\
             3. Tempel <b>hanya</b> tautannya di sini.\n\n\
             Saya akan balas dengan medianya plus tombol untuk ambil audionya saja.\n\
             Penasaran saya sudah aktif berapa lama? Coba /runtime."
        }
        (Lang::En, TextKey::Runtime) => {
            "🕒 This bot has been running for {days} days, {hours} hours, {minutes} minutes, {seconds} seconds."
        }
        (Lang::Id, TextKey::Runtime) => {
            "🕒 Bot ini sudah aktif selama {days} hari, {hours} jam, {minutes} menit, {seconds} detik."
        }
        (Lang::En, TextKey::Processing) => "⏳ Processing your TikTok link, hang tight...",
        (Lang::Id, TextKey::Processing) => "⏳ Sedang memproses tautan TikTok kamu, sabar sebentar ya...",
        (Lang::En, TextKey::RetryingDownload) => "Retrying... (attempt {attempt}/{max})",
        (Lang::Id, TextKey::RetryingDownload) => "Mencoba lagi... (percobaan {attempt}/{max})",
        (Lang::En, TextKey::AudioProcessing) => "⏳ Re-fetching for audio, please wait...",
        (Lang::Id, TextKey::AudioProcessing) => "⏳ Memproses ulang untuk audio, mohon tunggu...",
        (Lang::En, TextKey::InvalidUrl) => {
            "❌ That does not look like a valid TikTok link. It should start like:\n\
             <code>https://vt.tiktok.com/</code>\n\
             Send only the link, nothing else."
        }
        (Lang::Id, TextKey::InvalidUrl) => {
            "❌ Itu bukan tautan TikTok yang valid. Tautan harus diawali seperti:\n\
             <code>https://vt.tiktok.com/</code>\n\
             Kirim hanya tautannya saja, tanpa yang lain."
        }
        (Lang::En, TextKey::StrictLinkOnly) => {
            "🚨 Please send <b>only</b> the TikTok link, with no words before or after it."
        }
        (Lang::Id, TextKey::StrictLinkOnly) => {
            "🚨 Tolong kirim <b>hanya</b> tautan TikTok-nya saja, tanpa kata-kata sebelum atau sesudahnya."
        }
        (Lang::En, TextKey::DownloadFailed) => {
            "💔 Download failed. The upstream service is having a bad moment; please try again in a bit."
        }
        (Lang::Id, TextKey::DownloadFailed) => {
            "💔 Unduhan gagal. Layanan sedang bermasalah; silakan coba lagi sebentar lagi."
        }
        (Lang::En, TextKey::ContentNotFound) => {
            "🔍 Content not found. The post may be private or deleted."
        }
        (Lang::Id, TextKey::ContentNotFound) => {
            "🔍 Konten tidak ditemukan. Mungkin postingannya privat atau sudah dihapus."
        }
        (Lang::En, TextKey::LinkExpired) => {
            "❌ That link has expired. Please resend the original TikTok link."
        }
        (Lang::Id, TextKey::LinkExpired) => {
            "❌ Link sudah kadaluarsa. Silakan kirim ulang link TikTok-nya."
        }
        (Lang::En, TextKey::NoVideoUrl) => "😕 No downloadable video was found for that link.",
        (Lang::Id, TextKey::NoVideoUrl) => "😕 Tidak ada video yang bisa diunduh dari tautan itu.",
        (Lang::En, TextKey::VideoDownloaded) => "✅ <b>Video downloaded successfully!</b>",
        (Lang::Id, TextKey::VideoDownloaded) => "✅ <b>Video berhasil diunduh!</b>",
        (Lang::En, TextKey::PhotoDownloaded) => "✅ <b>Photo downloaded successfully!</b>",
        (Lang::Id, TextKey::PhotoDownloaded) => "✅ <b>Foto berhasil diunduh!</b>",
        (Lang::En, TextKey::SlideshowDownloaded) => {
            "✅ <b>Slideshow downloaded successfully!</b> ({count} photos)"
        }
        (Lang::Id, TextKey::SlideshowDownloaded) => {
            "✅ <b>Slideshow berhasil diunduh!</b> ({count} foto)"
        }
        (Lang::En, TextKey::ExtraLinks) => "<b>Use the buttons below for extra links:</b>",
        (Lang::Id, TextKey::ExtraLinks) => "<b>Gunakan tombol di bawah untuk tautan tambahan:</b>",
        (Lang::En, TextKey::AudioFailed) => {
            "💔 Could not fetch the audio. Please try again from a fresh link."
        }
        (Lang::Id, TextKey::AudioFailed) => {
            "💔 Gagal mengambil audionya. Silakan coba lagi dari tautan yang baru."
        }
        (Lang::En, TextKey::LanguageChanged) => "Language switched to {language}.",
        (Lang::Id, TextKey::LanguageChanged) => "Bahasa telah diubah ke {language}.",
    }
}

/// Substitute `{name}` placeholders. Unknown placeholders are left intact.
pub fn render(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in pairs {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

/// Render the /runtime message from a process uptime.
pub fn runtime_text(lang: Lang, uptime: Duration) -> String {
    let total_secs = uptime.as_secs();
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    render(
        text(lang, TextKey::Runtime),
        &[
            ("days", &days.to_string()),
            ("hours", &hours.to_string()),
            ("minutes", &minutes.to_string()),
            ("seconds", &seconds.to_string()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_codes_round_trip() {
        assert_eq!(Lang::from_code("en"), Some(Lang::En));
        assert_eq!(Lang::from_code("ID"), Some(Lang::Id));
        assert_eq!(Lang::from_code("fr"), None);
        assert_eq!(Lang::Id.code(), "id");
    }

    #[test]
    fn render_substitutes_placeholders() {
        let s = render(
            text(Lang::En, TextKey::RetryingDownload),
            &[("attempt", "2"), ("max", "5")],
        );
        assert_eq!(s, "Retrying... (attempt 2/5)");
    }

    #[test]
    fn render_leaves_unknown_placeholders() {
        assert_eq!(render("{a} {b}", &[("a", "x")]), "x {b}");
    }

    #[test]
    fn runtime_breaks_uptime_into_units() {
        let uptime = Duration::from_secs(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5);
        let s = runtime_text(Lang::En, uptime);
        assert!(s.contains("2 days"));
        assert!(s.contains("3 hours"));
        assert!(s.contains("4 minutes"));
        assert!(s.contains("5 seconds"));
    }
}
