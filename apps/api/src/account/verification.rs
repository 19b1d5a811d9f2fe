//! Email verification closer.
//!
//! A verification token works exactly once. The closing UPDATE filters on
//! the token and clears it in the same statement, so a replay (or a second
//! concurrent attempt) matches zero rows and is rejected.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::applicant::ApplicantRow;

/// Projection returned once an account is verified.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
}

/// Consumes a verification token: marks the account verified, records the
/// timestamp, and clears the token atomically.
pub async fn verify_email(pool: &PgPool, token: Uuid) -> Result<VerifiedAccount, AppError> {
    sqlx::query_as::<_, VerifiedAccount>(
        r#"
        UPDATE applicants
        SET is_verified = TRUE, email_verified_at = now(), verification_token = NULL
        WHERE verification_token = $1
        RETURNING id, username, email, is_verified
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        AppError::InvalidToken("Invalid or expired verification token".to_string())
    })
}

/// Looks up an account that still has a pending verification token, for
/// re-sending the verification email.
pub async fn pending_verification(pool: &PgPool, email: &str) -> Result<ApplicantRow, AppError> {
    sqlx::query_as::<_, ApplicantRow>(
        "SELECT * FROM applicants WHERE email = $1 AND verification_token IS NOT NULL",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No pending verification for this email".to_string()))
}
