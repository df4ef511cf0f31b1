use std::sync::Arc;

use tracing::info;

use ttd_core::{config::Config, connectivity, fetch::LinkCache, store::UserStore, Error};
use ttd_upstream::UpstreamClient;

#[tokio::main]
async fn main() -> Result<(), Error> {
    ttd_core::logging::init("ttd")?;

    let cfg = Arc::new(Config::load()?);

    if !connectivity::startup_check(&cfg).await {
        return Err(Error::External(
            "startup connectivity checks failed".to_string(),
        ));
    }

    let resolver = Arc::new(UpstreamClient::new(
        cfg.upstream_api_url.clone(),
        cfg.request_timeout,
    ));
    let store = Arc::new(UserStore::load(cfg.data_file.clone()));
    let links = LinkCache::new(cfg.link_cache_config());

    ttd_telegram::router::run_polling(cfg, resolver, store, links)
        .await
        .map_err(|e| Error::External(format!("telegram bot failed: {e}")))?;

    info!("shutdown complete");
    Ok(())
}
