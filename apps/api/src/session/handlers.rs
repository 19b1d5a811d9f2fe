use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::session::ApplicationSessionRow;
use crate::session::lifecycle::{open_session, AgreementSet};
use crate::session::store;
use crate::state::AppState;

/// Client-facing session projection; field names match the front-end
/// contract.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: i64,
    pub token: Uuid,
    pub data: Value,
    pub step_completed: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<ApplicationSessionRow> for SessionView {
    fn from(row: ApplicationSessionRow) -> Self {
        SessionView {
            id: row.id,
            token: row.session_token,
            data: row.extracted_data,
            step_completed: row.step_completed,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub success: bool,
    pub message: String,
    pub session_token: Uuid,
    pub session_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// POST /api/pre-application/start
pub async fn handle_start(
    State(state): State<AppState>,
    Json(req): Json<AgreementSet>,
) -> Result<Json<StartResponse>, AppError> {
    let new = open_session(&req)?;
    let id = store::insert(&state.db, new.token, &new.seed, new.expires_at).await?;

    tracing::info!("Created application session {id}, expires {}", new.expires_at);

    Ok(Json(StartResponse {
        success: true,
        message: "Application session created successfully".to_string(),
        session_token: new.token,
        session_id: id,
        expires_at: new.expires_at,
    }))
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: SessionView,
}

/// GET /api/pre-application/session/:token
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let row = store::get(&state.db, token).await?;
    Ok(Json(SessionResponse {
        success: true,
        session: row.into(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    pub data: Value,
    pub step_completed: i32,
}

#[derive(Serialize)]
pub struct UpdateSessionResponse {
    pub success: bool,
    pub message: String,
    pub session: SessionView,
}

/// PUT /api/pre-application/session/:token
pub async fn handle_update_session(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<Json<UpdateSessionResponse>, AppError> {
    let row = store::update(&state.db, token, &req.data, req.step_completed).await?;
    Ok(Json(UpdateSessionResponse {
        success: true,
        message: "Session updated successfully".to_string(),
        session: row.into(),
    }))
}

/// DELETE /api/pre-application/session/:token
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    store::delete(&state.db, token).await?;
    Ok(Json(StatusResponse {
        success: true,
        message: "Session deleted successfully".to_string(),
    }))
}

/// GET /api/pre-application/cleanup
///
/// Internal-only: callers must present the cleanup service credential, so
/// the route can be driven by a scheduled job without being open to the
/// public internet.
pub async fn handle_cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AppError> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token == state.config.cleanup_token)
        .unwrap_or(false);

    if !authorized {
        return Err(AppError::Unauthorized);
    }

    let deleted = store::cleanup_expired(&state.db).await?;
    tracing::info!("Cleaned up {deleted} expired sessions");

    Ok(Json(StatusResponse {
        success: true,
        message: format!("Cleaned up {deleted} expired sessions"),
    }))
}
