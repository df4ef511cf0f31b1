//! Startup connectivity checks: generic internet reachability plus a
//! Telegram API probe, retried with a fixed delay before the bot gives up.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;

const CHECK_ENDPOINTS: [&str; 4] = [
    "https://www.google.com",
    "https://www.cloudflare.com",
    "https://1.1.1.1",
    "https://api.telegram.org",
];

const CHECK_USER_AGENT: &str = "ttd-connection-check/1.0";

fn probe_client(timeout: Duration) -> Option<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(CHECK_USER_AGENT)
        .build()
        .map_err(|e| warn!(error = %e, "failed to build probe client"))
        .ok()
}

/// True when at least one well-known endpoint answers within the timeout.
pub async fn check_internet(timeout: Duration) -> bool {
    let Some(client) = probe_client(timeout) else {
        return false;
    };

    for endpoint in CHECK_ENDPOINTS {
        if client.get(endpoint).send().await.is_ok() {
            info!(endpoint, "internet connection verified");
            return true;
        }
    }

    warn!("all connection check endpoints failed");
    false
}

/// True when the Telegram Bot API answers `getMe` with `ok: true`.
pub async fn check_telegram_api(token: &str, timeout: Duration) -> bool {
    let Some(client) = probe_client(timeout) else {
        return false;
    };

    let url = format!("https://api.telegram.org/bot{token}/getMe");
    match client.get(&url).send().await {
        Ok(resp) => match resp.json::<serde_json::Value>().await {
            Ok(body) => {
                let ok = body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
                if ok {
                    let username = body
                        .pointer("/result/username")
                        .and_then(|v| v.as_str())
                        .unwrap_or("?");
                    info!(bot = username, "telegram api is reachable");
                } else {
                    warn!("telegram api response not ok");
                }
                ok
            }
            Err(e) => {
                warn!(error = %e, "telegram api returned unparseable body");
                false
            }
        },
        Err(e) => {
            warn!(error = %e, "failed to reach telegram api");
            false
        }
    }
}

async fn wait_for<F, Fut>(what: &str, retries: u32, delay: Duration, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for attempt in 1..=retries.max(1) {
        if probe().await {
            if attempt > 1 {
                info!(what, attempts = attempt, "became available after retries");
            }
            return true;
        }
        if attempt < retries {
            warn!(
                what,
                attempt,
                retries,
                delay_ms = delay.as_millis() as u64,
                "not available, retrying"
            );
            sleep(delay).await;
        }
    }
    warn!(what, retries, "still unavailable, giving up");
    false
}

/// Comprehensive startup gate: basic connectivity first, then the Telegram
/// API specifically. Returns false when the bot should refuse to start.
pub async fn startup_check(cfg: &Config) -> bool {
    info!("starting connection checks");

    let timeout = cfg.connection_check_timeout;
    let retries = cfg.connection_check_retries;
    let delay = cfg.connection_check_delay;

    if !wait_for("internet", retries, delay, || check_internet(timeout)).await {
        return false;
    }

    let token = cfg.bot_token.clone();
    if !wait_for("telegram api", retries, delay, || {
        check_telegram_api(&token, timeout)
    })
    .await
    {
        return false;
    }

    info!("all connection checks passed");
    true
}
