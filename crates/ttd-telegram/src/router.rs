use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use ttd_core::{
    config::Config, fetch::LinkCache, messaging::port::MessagingPort, ports::MediaResolver,
    store::UserStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub resolver: Arc<dyn MediaResolver>,
    pub messenger: Arc<dyn MessagingPort>,
    pub links: LinkCache,
    pub store: Arc<UserStore>,
    pub started_at: std::time::Instant,
}

/// Long-polling entry point. Returns when the dispatcher stops (Ctrl-C).
pub async fn run_polling(
    cfg: Arc<Config>,
    resolver: Arc<dyn MediaResolver>,
    store: Arc<UserStore>,
    links: LinkCache,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        info!(username = %me.username(), "bot started");
    }
    info!(users = store.user_count(), "user store loaded");

    links.start_sweeper();

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        cfg,
        resolver,
        messenger,
        links: links.clone(),
        store,
        started_at: std::time::Instant::now(),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    links.shutdown();
    Ok(())
}
