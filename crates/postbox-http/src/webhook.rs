use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use teloxide::types::Update;
use tracing::{debug, warn};

use postbox_core::{sweep, utils::unix_ms_now};
use postbox_telegram::convert;

use crate::{error::ApiError, AppState};

const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Webhook receiver. The secret header is checked before anything else;
/// once past it, the handler always acknowledges with 200 so the platform
/// does not redeliver — routing failures are logged, not returned.
pub async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<&'static str, ApiError> {
    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if presented != Some(state.cfg.webhook_secret.as_str()) {
        return Err(ApiError::Forbidden);
    }

    let update: Update = match serde_json::from_str(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "malformed webhook body");
            return Err(ApiError::BadRequest("malformed update".to_string()));
        }
    };

    if let Some(report) =
        sweep::maybe_run(&state.cfg, state.store.as_ref(), unix_ms_now())
    {
        debug!(?report, "amortized sweep ran");
    }

    match convert::inbound_from_update(&update) {
        Some(inbound) => {
            if let Err(e) = state.dispatch.handle(&inbound).await {
                warn!(error = %e, "update handling failed");
            }
        }
        None => debug!(update_id = update.id, "ignoring non-message update"),
    }

    Ok("Ok")
}

/// Registers the webhook with the platform using the configured public URL.
pub async fn register_webhook(State(state): State<AppState>) -> impl IntoResponse {
    let Some(public_url) = state.cfg.public_url.clone() else {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(serde_json::json!({ "ok": false, "error": "PUBLIC_URL is not configured" })),
        );
    };

    let endpoint = format!("{}/endpoint", public_url.trim_end_matches('/'));
    match state
        .relay
        .register_webhook(&endpoint, &state.cfg.webhook_secret)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            axum::Json(serde_json::json!({ "ok": true, "url": endpoint })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        ),
    }
}
