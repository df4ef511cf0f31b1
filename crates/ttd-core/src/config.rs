use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::fetch::{LinkCacheConfig, RetryPolicy};
use crate::{errors::Error, Result};

/// Typed configuration for the bot, loaded from environment variables with
/// optional `.env` file support.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub bot_token: String,
    pub admin_chat_id: Option<i64>,

    // Upstream media API
    pub upstream_api_url: String,
    pub request_timeout: Duration,

    // Download retry policy
    pub max_download_retries: u32,
    pub retry_base_delay: Duration,
    pub download_timeout: Duration,

    // Link cache
    pub max_url_mappings: usize,
    pub url_mapping_ttl: Duration,
    pub url_mapping_cleanup_interval: Duration,

    // Startup connectivity checks
    pub connection_check_timeout: Duration,
    pub connection_check_retries: u32,
    pub connection_check_delay: Duration,

    // Presentation
    pub max_title_length: usize,
    pub support_url: String,

    // Persistence
    pub data_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admin_chat_id = env_str("ADMIN_CHAT_ID").and_then(|s| s.trim().parse::<i64>().ok());

        let upstream_api_url = env_str("UPSTREAM_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://www.tikwm.com".to_string());
        let request_timeout = Duration::from_millis(env_u64("DEFAULT_TIMEOUT_MS").unwrap_or(30_000));

        let max_download_retries = env_u32("MAX_DOWNLOAD_RETRIES").unwrap_or(5).max(1);
        let retry_base_delay = Duration::from_millis(env_u64("RETRY_DELAY_MS").unwrap_or(2_000));
        let download_timeout = Duration::from_millis(env_u64("DOWNLOAD_TIMEOUT_MS").unwrap_or(60_000));

        let max_url_mappings = env_usize("MAX_URL_MAPPINGS").unwrap_or(100).max(1);
        let url_mapping_ttl = Duration::from_millis(env_u64("URL_MAPPING_TTL_MS").unwrap_or(30 * 60 * 1000));
        let url_mapping_cleanup_interval =
            Duration::from_millis(env_u64("URL_MAPPING_CLEANUP_INTERVAL_MS").unwrap_or(5 * 60 * 1000));

        let connection_check_timeout =
            Duration::from_millis(env_u64("CONNECTION_CHECK_TIMEOUT_MS").unwrap_or(5_000));
        let connection_check_retries = env_u32("CONNECTION_CHECK_RETRIES").unwrap_or(5).max(1);
        let connection_check_delay =
            Duration::from_millis(env_u64("CONNECTION_CHECK_DELAY_MS").unwrap_or(3_000));

        let max_title_length = env_usize("MAX_TITLE_LENGTH").unwrap_or(400);
        let support_url = env_str("SUPPORT_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://t.me/ssyahbandi".to_string());

        let data_file = env_str("DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/data.json"));

        Ok(Self {
            bot_token,
            admin_chat_id,
            upstream_api_url,
            request_timeout,
            max_download_retries,
            retry_base_delay,
            download_timeout,
            max_url_mappings,
            url_mapping_ttl,
            url_mapping_cleanup_interval,
            connection_check_timeout,
            connection_check_retries,
            connection_check_delay,
            max_title_length,
            support_url,
            data_file,
        })
    }

    /// Retry policy for orchestrated media downloads.
    pub fn download_policy(&self, label: impl Into<String>) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_download_retries,
            base_delay: self.retry_base_delay,
            timeout: self.download_timeout,
            label: label.into(),
        }
    }

    pub fn link_cache_config(&self) -> LinkCacheConfig {
        LinkCacheConfig {
            max_entries: self.max_url_mappings,
            ttl: self.url_mapping_ttl,
            cleanup_interval: self.url_mapping_cleanup_interval,
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_chat_id == Some(user_id)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
