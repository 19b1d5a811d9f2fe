//! Store adapter for application session rows.
//!
//! Expiry is a view filter, not a deletion trigger: every read and
//! conditional write carries `expires_at > now()`, so an expired row behaves
//! as "not found" until `cleanup_expired` removes it. Each write is a single
//! statement, which is what lets concurrent calls against the same token
//! serialize at the store.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::session::ApplicationSessionRow;
use crate::session::lifecycle::validate_step;

const SESSION_GONE: &str = "Session not found or expired";

/// Inserts a new session row and returns the store-assigned id.
pub async fn insert(
    pool: &PgPool,
    token: Uuid,
    seed: &Value,
    expires_at: DateTime<Utc>,
) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO application_sessions (session_token, extracted_data, step_completed, expires_at)
        VALUES ($1, $2, 0, $3)
        RETURNING id
        "#,
    )
    .bind(token)
    .bind(seed)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Fetches a live session by token. Expired and unknown tokens are
/// indistinguishable to the caller.
pub async fn get(pool: &PgPool, token: Uuid) -> Result<ApplicationSessionRow, AppError> {
    sqlx::query_as::<_, ApplicationSessionRow>(
        "SELECT * FROM application_sessions WHERE session_token = $1 AND expires_at > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(SESSION_GONE.to_string()))
}

/// Merges a step payload into a live session and advances its step marker.
///
/// The UPDATE carries the whole contract in its WHERE clause: the token must
/// match, the session must be unexpired, and `step_completed` may never move
/// backwards. The payload is a shallow JSONB merge so earlier step data (the
/// agreement record, extracted identity fields) survives later steps.
pub async fn update(
    pool: &PgPool,
    token: Uuid,
    data: &Value,
    step_completed: i32,
) -> Result<ApplicationSessionRow, AppError> {
    validate_step(step_completed)?;
    if !data.is_object() {
        return Err(AppError::Validation(
            "data must be a JSON object".to_string(),
        ));
    }

    let updated = sqlx::query_as::<_, ApplicationSessionRow>(
        r#"
        UPDATE application_sessions
        SET extracted_data = extracted_data || $2, step_completed = $3
        WHERE session_token = $1 AND expires_at > now() AND step_completed <= $3
        RETURNING *
        "#,
    )
    .bind(token)
    .bind(data)
    .bind(step_completed)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(row) => Ok(row),
        // Zero rows means either the session is gone/expired or the caller
        // tried to move the step backwards. A second read disambiguates.
        None => match get(pool, token).await {
            Ok(live) => Err(AppError::Validation(format!(
                "stepCompleted {step_completed} is behind the session's recorded step {}",
                live.step_completed
            ))),
            Err(_) => Err(AppError::NotFound(SESSION_GONE.to_string())),
        },
    }
}

/// Deletes a session row regardless of expiry.
pub async fn delete(pool: &PgPool, token: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM application_sessions WHERE session_token = $1")
        .bind(token)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Session not found".to_string()));
    }
    Ok(())
}

/// Deletes every expired session row and reports how many went. Safe to run
/// repeatedly or concurrently; a second pass simply deletes nothing.
pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM application_sessions WHERE expires_at <= now()")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
