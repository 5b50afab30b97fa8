//! Unauthenticated operational probes, mirroring what an operator pokes at
//! when the bot misbehaves. They expose counters and maintenance actions,
//! never message content or credentials.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use postbox_core::{
    store::RelayStore,
    sweep,
    utils::{format_unix_ms, time_ago_text, unix_ms_now},
};

use crate::{error::ApiError, AppState};

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "time_ms": unix_ms_now() }))
}

/// Re-applies the schema; safe when the tables already exist.
pub async fn init_db(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.init_schema()?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn db_stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let now = unix_ms_now();
    let stats = state.store.stats(now)?;
    let oldest = stats
        .oldest_route_ms
        .map(|ms| json!({ "at": format_unix_ms(ms), "age": time_ago_text(ms, now) }));
    let newest = stats
        .newest_route_ms
        .map(|ms| json!({ "at": format_unix_ms(ms), "age": time_ago_text(ms, now) }));
    Ok(Json(json!({
        "ok": true,
        "stats": stats,
        "oldest_route": oldest,
        "newest_route": newest,
    })))
}

/// Inserts and removes a sentinel fraud row to prove deletes reach disk.
pub async fn test_delete(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    const SENTINEL: &str = "__delete_probe__";

    let inserted = state.store.add_fraud(SENTINEL, unix_ms_now())?;
    let deleted = state.store.delete_fraud(SENTINEL)?;
    Ok(Json(json!({
        "ok": deleted,
        "inserted": inserted,
        "deleted": deleted,
    })))
}

#[derive(Deserialize)]
pub struct ForceDeleteQuery {
    pub user_id: Option<String>,
}

pub async fn force_delete_user(
    State(state): State<AppState>,
    Query(query): Query<ForceDeleteQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(user_id) = query
        .user_id
        .as_deref()
        .and_then(postbox_core::moderation::normalize_id)
    else {
        return Err(ApiError::BadRequest("user_id query is required".to_string()));
    };

    let clean = state.store.purge_subject(&user_id)?;
    Ok(Json(json!({ "ok": clean, "user_id": user_id })))
}

#[derive(Deserialize)]
pub struct CleanupQuery {
    pub password: Option<String>,
}

/// Manual full sweep. Unlike the other probes this one is password-gated.
pub async fn cleanup(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !crate::auth::password_ok(&state.cfg, &headers, query.password.as_deref()) {
        return Err(ApiError::Unauthorized);
    }

    let report = sweep::run(&state.cfg, state.store.as_ref(), unix_ms_now());
    Ok(Json(json!({ "ok": report.error.is_none(), "report": report })))
}
