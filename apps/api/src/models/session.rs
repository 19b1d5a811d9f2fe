use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One in-progress application, keyed by its bearer token.
///
/// `extracted_data` is an opaque per-step payload merged as the applicant
/// advances; the row is readable only while `expires_at` lies in the future.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationSessionRow {
    pub id: i64,
    pub session_token: Uuid,
    pub extracted_data: Value,
    pub step_completed: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
