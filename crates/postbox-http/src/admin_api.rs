use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use postbox_core::{
    moderation::normalize_id,
    store::RelayStore,
    sweep::DAY_MS,
    utils::unix_ms_now,
};

use crate::{auth::password_ok, error::ApiError, AppState};

const LIST_LIMIT: u32 = 1000;

#[derive(Deserialize)]
pub struct AdminQuery {
    pub password: Option<String>,
    pub search: Option<String>,
}

fn authorize(state: &AppState, headers: &HeaderMap, query: &AdminQuery) -> Result<(), ApiError> {
    if password_ok(&state.cfg, headers, query.password.as_deref()) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

pub async fn fraud_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers, &query)?;

    let users = state.store.list_fraud(query.search.as_deref(), LIST_LIMIT)?;
    Ok(Json(json!({ "ok": true, "users": users })))
}

#[derive(Deserialize)]
pub struct AddUserBody {
    pub user_id: String,
    #[allow(dead_code)]
    pub reason: Option<String>,
}

pub async fn add_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    Json(body): Json<AddUserBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers, &query)?;

    let Some(user_id) = normalize_id(&body.user_id) else {
        return Err(ApiError::BadRequest("user_id must not be empty".to_string()));
    };

    let report = state.moderation.add_fraud_batch(&[user_id.clone()]);
    let entry = report
        .details
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal("empty batch report".to_string()))?;

    info!(user_id = %user_id, "fraud id added via console");
    Ok(Json(json!({ "ok": report.failed == 0, "result": entry })))
}

#[derive(Deserialize)]
pub struct AddUsersBatchBody {
    pub user_ids: Vec<String>,
    #[allow(dead_code)]
    pub reason: Option<String>,
}

pub async fn add_users_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    Json(body): Json<AddUsersBatchBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers, &query)?;

    if body.user_ids.is_empty() {
        return Err(ApiError::BadRequest("user_ids must not be empty".to_string()));
    }
    if body.user_ids.len() > state.cfg.batch_limit {
        return Err(ApiError::BadRequest(format!(
            "at most {} ids per batch",
            state.cfg.batch_limit
        )));
    }

    let report = state.moderation.add_fraud_batch(&body.user_ids);
    info!(
        total = report.total,
        succeeded = report.succeeded,
        failed = report.failed,
        "fraud batch processed"
    );
    Ok(Json(json!({ "ok": report.failed == 0, "report": report })))
}

#[derive(Deserialize)]
pub struct DeleteUserBody {
    pub user_id: String,
}

pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    Json(body): Json<DeleteUserBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers, &query)?;

    let Some(user_id) = normalize_id(&body.user_id) else {
        return Err(ApiError::BadRequest("user_id must not be empty".to_string()));
    };

    if !state.store.in_fraud_table(&user_id)? && !state.store.in_block_table(&user_id)? {
        return Err(ApiError::NotFound(format!("unknown user id {user_id}")));
    }

    let report = state.moderation.unblock(&user_id);
    info!(user_id = %user_id, clean = report.clean, "user deleted via console");
    Ok(Json(json!({ "ok": report.clean, "report": report })))
}

#[derive(Deserialize)]
pub struct ToggleBlockBody {
    pub user_id: String,
    pub block: bool,
}

pub async fn toggle_block(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    Json(body): Json<ToggleBlockBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers, &query)?;

    let Some(user_id) = normalize_id(&body.user_id) else {
        return Err(ApiError::BadRequest("user_id must not be empty".to_string()));
    };

    state
        .store
        .set_blocked(&user_id, body.block, unix_ms_now())?;
    Ok(Json(json!({ "ok": true, "user_id": user_id, "blocked": body.block })))
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupType {
    Messages,
    UnblockedUsers,
    All,
}

#[derive(Deserialize)]
pub struct CleanupBody {
    pub cleanup_type: CleanupType,
    pub days: i64,
}

pub async fn cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    Json(body): Json<CleanupBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers, &query)?;

    if body.days < 0 {
        return Err(ApiError::BadRequest("days must be non-negative".to_string()));
    }
    let window_ms = body
        .days
        .checked_mul(DAY_MS)
        .ok_or_else(|| ApiError::BadRequest("days is out of range".to_string()))?;
    let cutoff = unix_ms_now().saturating_sub(window_ms);

    let mut routes_deleted = 0u64;
    let mut unblocked_deleted = 0u64;
    match body.cleanup_type {
        CleanupType::Messages => {
            routes_deleted = state.store.prune_routes_before(cutoff)?;
        }
        CleanupType::UnblockedUsers => {
            unblocked_deleted = state.store.prune_unblocked_before(cutoff)?;
        }
        CleanupType::All => {
            routes_deleted = state.store.prune_routes_before(cutoff)?;
            unblocked_deleted = state.store.prune_unblocked_before(cutoff)?;
        }
    }

    info!(routes_deleted, unblocked_deleted, "targeted cleanup ran");
    Ok(Json(json!({
        "ok": true,
        "routes_deleted": routes_deleted,
        "unblocked_deleted": unblocked_deleted,
    })))
}

pub async fn export_ids(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
) -> Result<Response, ApiError> {
    authorize(&state, &headers, &query)?;

    let ids = state.store.fraud_ids()?;
    let body = ids.join("\n");
    let filename = format!(
        "fraud-ids-{}.txt",
        chrono::Utc::now().format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::test_fixtures;

    fn no_auth_query() -> AdminQuery {
        AdminQuery {
            password: None,
            search: None,
        }
    }

    fn auth_query(state: &AppState) -> AdminQuery {
        AdminQuery {
            password: Some(state.cfg.admin_password.clone()),
            search: None,
        }
    }

    #[tokio::test]
    async fn endpoints_require_the_password() {
        let (state, _relay) = test_fixtures::state();

        let result = fraud_users(State(state), HeaderMap::new(), Query(no_auth_query())).await;
        match result {
            Err(ApiError::Unauthorized) => {}
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn add_then_list_then_delete() {
        let (state, _relay) = test_fixtures::state();

        add_user(
            State(state.clone()),
            HeaderMap::new(),
            Query(auth_query(&state)),
            Json(AddUserBody {
                user_id: " 777 ".to_string(),
                reason: None,
            }),
        )
        .await
        .unwrap();
        assert!(state.store.is_blocked("777").unwrap());

        let Json(listed) = fraud_users(
            State(state.clone()),
            HeaderMap::new(),
            Query(auth_query(&state)),
        )
        .await
        .unwrap();
        assert_eq!(listed["users"].as_array().unwrap().len(), 1);
        assert_eq!(listed["users"][0]["user_id"], "777");

        let Json(deleted) = delete_user(
            State(state.clone()),
            HeaderMap::new(),
            Query(auth_query(&state)),
            Json(DeleteUserBody {
                user_id: "777".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(deleted["ok"], true);
        assert!(!state.store.in_fraud_table("777").unwrap());
        assert!(!state.store.in_block_table("777").unwrap());
    }

    #[tokio::test]
    async fn deleting_an_unknown_id_is_a_not_found() {
        let (state, _relay) = test_fixtures::state();

        let result = delete_user(
            State(state.clone()),
            HeaderMap::new(),
            Query(auth_query(&state)),
            Json(DeleteUserBody {
                user_id: "nobody".to_string(),
            }),
        )
        .await;
        match result {
            Err(ApiError::NotFound(_)) => {}
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected() {
        let (state, _relay) = test_fixtures::state();
        let ids: Vec<String> = (0..state.cfg.batch_limit + 1)
            .map(|i| i.to_string())
            .collect();

        let result = add_users_batch(
            State(state.clone()),
            HeaderMap::new(),
            Query(auth_query(&state)),
            Json(AddUsersBatchBody {
                user_ids: ids,
                reason: None,
            }),
        )
        .await;
        match result {
            Err(ApiError::BadRequest(_)) => {}
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn absurd_cleanup_window_is_rejected() {
        let (state, _relay) = test_fixtures::state();

        let result = cleanup(
            State(state.clone()),
            HeaderMap::new(),
            Query(auth_query(&state)),
            Json(CleanupBody {
                cleanup_type: CleanupType::All,
                days: i64::MAX,
            }),
        )
        .await;
        match result {
            Err(ApiError::BadRequest(_)) => {}
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn toggle_block_flips_only_the_flag() {
        let (state, _relay) = test_fixtures::state();
        state.store.add_fraud("777", 0).unwrap();

        toggle_block(
            State(state.clone()),
            HeaderMap::new(),
            Query(auth_query(&state)),
            Json(ToggleBlockBody {
                user_id: "777".to_string(),
                block: true,
            }),
        )
        .await
        .unwrap();
        assert!(state.store.is_blocked("777").unwrap());
        assert!(state.store.in_fraud_table("777").unwrap());

        toggle_block(
            State(state.clone()),
            HeaderMap::new(),
            Query(auth_query(&state)),
            Json(ToggleBlockBody {
                user_id: "777".to_string(),
                block: false,
            }),
        )
        .await
        .unwrap();
        assert!(!state.store.is_blocked("777").unwrap());
        assert!(state.store.in_fraud_table("777").unwrap());
    }

    #[tokio::test]
    async fn export_is_a_plain_text_attachment() {
        let (state, _relay) = test_fixtures::state();
        state.store.add_fraud("1", 10).unwrap();
        state.store.add_fraud("2", 20).unwrap();

        let response = export_ids(
            State(state.clone()),
            HeaderMap::new(),
            Query(auth_query(&state)),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(disposition.starts_with("attachment; filename=\"fraud-ids-"));
    }
}
