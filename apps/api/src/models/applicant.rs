use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A promoted applicant account.
///
/// `session_token` records which application session produced the account and
/// carries a unique constraint, so a session can be promoted at most once.
/// `verification_token` is cleared the moment it is consumed.
///
/// Deliberately not `Serialize`: the password hash never leaves this process.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicantRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub id_number: Option<String>,
    pub session_token: Uuid,
    pub verification_token: Option<Uuid>,
    pub is_verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub completion_percentage: i32,
    pub created_at: DateTime<Utc>,
}
