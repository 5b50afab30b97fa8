//! HTTP surface of the relay bot: the Telegram webhook, webhook
//! registration, the password-gated admin console and its JSON API, and a
//! handful of unauthenticated debug probes.

mod admin_api;
mod auth;
mod debug;
mod error;
mod pages;
mod webhook;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use postbox_core::{
    config::Config, moderation::Moderation, relay::port::RelayPort, router::Router as Dispatch,
    Error, Result,
};
use postbox_store::Store;

/// Shared handler state. Everything is reference-counted; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: Arc<Store>,
    pub relay: Arc<dyn RelayPort>,
    pub dispatch: Arc<Dispatch>,
    pub moderation: Moderation,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, store: Arc<Store>, relay: Arc<dyn RelayPort>) -> Self {
        let dispatch = Arc::new(Dispatch::new(cfg.clone(), store.clone(), relay.clone()));
        let moderation = Moderation::new(store.clone(), cfg.admin_key());
        Self {
            cfg,
            store,
            relay,
            dispatch,
            moderation,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/endpoint", post(webhook::telegram_webhook))
        .route("/registerWebhook", get(webhook::register_webhook))
        .route("/admin", get(pages::admin_page))
        .route("/admin-api/fraud-users", get(admin_api::fraud_users))
        .route("/admin-api/add-user", post(admin_api::add_user))
        .route("/admin-api/add-users-batch", post(admin_api::add_users_batch))
        .route("/admin-api/delete-user", post(admin_api::delete_user))
        .route("/admin-api/toggle-block", post(admin_api::toggle_block))
        .route("/admin-api/cleanup", post(admin_api::cleanup))
        .route("/admin-api/export-ids", get(admin_api::export_ids))
        .route("/health", get(debug::health))
        .route("/init-db", get(debug::init_db))
        .route("/db-stats", get(debug::db_stats))
        .route("/test-delete", get(debug::test_delete))
        .route("/force-delete-user", get(debug::force_delete_user))
        .route("/cleanup", get(debug::cleanup))
        .fallback(|| async { "Relay bot is running." })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.cfg.bind_addr;
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::Io)?;
    info!(%addr, "http server listening");
    axum::serve(listener, app).await.map_err(Error::Io)
}
