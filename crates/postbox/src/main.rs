use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use postbox_core::{config::Config, logging};
use postbox_http::AppState;
use postbox_store::Store;
use postbox_telegram::TelegramRelay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("postbox")?;

    let cfg = Arc::new(Config::load().context("loading configuration")?);
    let store = Arc::new(Store::open(&cfg.db_path).context("opening database")?);
    let relay = Arc::new(TelegramRelay::new(&cfg.bot_token));

    info!(
        admin_chat = cfg.admin_chat_id,
        db = %cfg.db_path.display(),
        "starting relay bot"
    );

    let state = AppState::new(cfg, store, relay);
    postbox_http::serve(state).await.context("http server")?;
    Ok(())
}
