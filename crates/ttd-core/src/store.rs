//! JSON-file persistence of user records, language choices, bans and
//! download counters. Loaded once at startup, saved after every mutation;
//! a missing or corrupt file is tolerated and replaced with empty data.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{ChatId, MediaKind, UserId};
use crate::texts::Lang;
use crate::Result;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    pub joined_at: String,
    pub last_activity: String,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct DownloadStats {
    pub videos_ok: u64,
    pub videos_failed: u64,
    pub photos_ok: u64,
    pub photos_failed: u64,
    pub audio_ok: u64,
    pub audio_failed: u64,
}

impl DownloadStats {
    pub fn total_ok(&self) -> u64 {
        self.videos_ok + self.photos_ok + self.audio_ok
    }

    pub fn total_failed(&self) -> u64 {
        self.videos_failed + self.photos_failed + self.audio_failed
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Data {
    #[serde(default)]
    users: HashMap<String, UserRecord>,
    #[serde(default)]
    user_language: HashMap<String, String>,
    #[serde(default)]
    banned: HashSet<i64>,
    #[serde(default)]
    downloads: DownloadStats,
}

/// File-backed user store. All mutations persist immediately; persistence
/// failures are logged and otherwise ignored so a full disk never takes the
/// bot down.
pub struct UserStore {
    path: PathBuf,
    data: Mutex<Data>,
}

impl UserStore {
    /// Load the store from `path`, starting empty when the file is missing
    /// or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(raw) if !raw.trim().is_empty() => match serde_json::from_str::<Data>(&raw) {
                Ok(d) => {
                    info!(path = %path.display(), users = d.users.len(), "user store loaded");
                    d
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "user store corrupt, starting empty");
                    Data::default()
                }
            },
            _ => {
                info!(path = %path.display(), "no user store file, starting empty");
                Data::default()
            }
        };

        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn data(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a user sighting: inserts a new record or refreshes activity.
    pub fn touch_user(&self, user_id: UserId, username: Option<&str>, first_name: Option<&str>) {
        let now = Utc::now().to_rfc3339();
        {
            let mut data = self.data();
            let entry = data
                .users
                .entry(user_id.0.to_string())
                .or_insert_with(|| UserRecord {
                    id: user_id.0,
                    username: username.map(str::to_string),
                    first_name: first_name.map(str::to_string),
                    joined_at: now.clone(),
                    last_activity: now.clone(),
                });
            entry.last_activity = now;
            if let Some(u) = username {
                entry.username = Some(u.to_string());
            }
            if let Some(f) = first_name {
                entry.first_name = Some(f.to_string());
            }
        }
        self.save_best_effort();
    }

    pub fn user_count(&self) -> usize {
        self.data().users.len()
    }

    pub fn set_language(&self, chat_id: ChatId, lang: Lang) {
        self.data()
            .user_language
            .insert(chat_id.0.to_string(), lang.code().to_string());
        self.save_best_effort();
    }

    /// Chat language, defaulting to English.
    pub fn language(&self, chat_id: ChatId) -> Lang {
        self.data()
            .user_language
            .get(&chat_id.0.to_string())
            .and_then(|code| Lang::from_code(code))
            .unwrap_or_default()
    }

    pub fn ban(&self, user_id: UserId) {
        self.data().banned.insert(user_id.0);
        self.save_best_effort();
    }

    pub fn unban(&self, user_id: UserId) {
        self.data().banned.remove(&user_id.0);
        self.save_best_effort();
    }

    pub fn is_banned(&self, user_id: UserId) -> bool {
        self.data().banned.contains(&user_id.0)
    }

    pub fn track_download(&self, kind: MediaKind, ok: bool) {
        {
            let mut data = self.data();
            let stats = &mut data.downloads;
            match (kind, ok) {
                (MediaKind::Video, true) => stats.videos_ok += 1,
                (MediaKind::Video, false) => stats.videos_failed += 1,
                (MediaKind::Photos, true) => stats.photos_ok += 1,
                (MediaKind::Photos, false) => stats.photos_failed += 1,
                (MediaKind::Audio, true) => stats.audio_ok += 1,
                (MediaKind::Audio, false) => stats.audio_failed += 1,
            }
        }
        self.save_best_effort();
    }

    pub fn download_stats(&self) -> DownloadStats {
        self.data().downloads
    }

    fn save_best_effort(&self) {
        if let Err(e) = self.save() {
            warn!(path = %self.path.display(), error = %e, "failed to save user store");
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = {
            let data = self.data();
            serde_json::to_string_pretty(&*data)?
        };
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_store(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        PathBuf::from(format!("/tmp/{prefix}-{}-{ts}.json", std::process::id()))
    }

    #[test]
    fn store_round_trips_through_the_file() {
        let path = tmp_store("ttd-store");

        {
            let store = UserStore::load(&path);
            store.touch_user(UserId(42), Some("alice"), Some("Alice"));
            store.set_language(ChatId(42), Lang::Id);
            store.ban(UserId(666));
            store.track_download(MediaKind::Video, true);
            store.track_download(MediaKind::Audio, false);
        }

        let reloaded = UserStore::load(&path);
        assert_eq!(reloaded.user_count(), 1);
        assert_eq!(reloaded.language(ChatId(42)), Lang::Id);
        assert!(reloaded.is_banned(UserId(666)));
        assert!(!reloaded.is_banned(UserId(42)));
        let stats = reloaded.download_stats();
        assert_eq!(stats.videos_ok, 1);
        assert_eq!(stats.audio_failed, 1);
        assert_eq!(stats.total_ok(), 1);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = tmp_store("ttd-store-corrupt");
        fs::write(&path, "{not json at all").unwrap();

        let store = UserStore::load(&path);
        assert_eq!(store.user_count(), 0);
        assert_eq!(store.language(ChatId(1)), Lang::En);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unban_reverses_ban() {
        let path = tmp_store("ttd-store-ban");
        let store = UserStore::load(&path);

        store.ban(UserId(7));
        assert!(store.is_banned(UserId(7)));
        store.unban(UserId(7));
        assert!(!store.is_banned(UserId(7)));

        let _ = fs::remove_file(&path);
    }
}
