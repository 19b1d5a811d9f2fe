//! Session-to-account promotion.
//!
//! The one write in the system that must happen exactly once: the applicant
//! insert carries the session token under a unique constraint, so even two
//! concurrent promotions of the same session produce one row. The loser
//! sees a conflict, never a duplicate.

use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::account::credentials::{derive_username, generate_password, hash_password};
use crate::errors::AppError;
use crate::extraction::identity::ExtractedIdentity;
use crate::notify::MailerClient;
use crate::session::store;

/// Completion percentage recorded once the identity step is done.
const IDENTITY_STEP_COMPLETION: i32 = 20;

/// Username suffix regenerations before giving up with a conflict.
const MAX_USERNAME_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct ContactDetails {
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
}

/// The result of a successful promotion. The plaintext password exists only
/// here and in the welcome email; it is never persisted or logged.
pub struct PromotedAccount {
    pub account_id: i64,
    pub username: String,
    pub password: String,
    pub verification_token: Uuid,
}

pub(crate) fn has_required_fields(identity: &ExtractedIdentity, contact: &ContactDetails) -> bool {
    !identity.first_name.trim().is_empty()
        && !identity.last_name.trim().is_empty()
        && !contact.email.trim().is_empty()
}

/// Converts a completed application session into an applicant account.
///
/// The session is re-read through the expiry-filtered store before the
/// insert, closing the window where it expires between the caller's read and
/// this call. The welcome email is dispatched after the insert succeeds and
/// its failure never reaches the caller: the account is the source of
/// truth.
pub async fn promote(
    pool: &PgPool,
    mailer: &MailerClient,
    session_token: Uuid,
    identity: &ExtractedIdentity,
    contact: &ContactDetails,
) -> Result<PromotedAccount, AppError> {
    if !has_required_fields(identity, contact) {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }

    let session = store::get(pool, session_token).await?;

    let password = generate_password();
    let password_hash = hash_password(&password)?;
    let verification_token = Uuid::new_v4();

    let mut attempts = 0u32;
    let (account_id, username) = loop {
        attempts += 1;
        let username = derive_username(&identity.first_name, &identity.last_name);

        match insert_applicant(
            pool,
            &username,
            &password_hash,
            identity,
            contact,
            session_token,
            verification_token,
        )
        .await
        {
            Ok(id) => break (id, username),
            Err(InsertError::UsernameTaken) if attempts < MAX_USERNAME_ATTEMPTS => {
                warn!("Username {username} already taken, regenerating suffix");
            }
            Err(InsertError::UsernameTaken) => {
                return Err(AppError::Conflict(format!(
                    "Could not derive a unique username after {MAX_USERNAME_ATTEMPTS} attempts"
                )));
            }
            Err(InsertError::SessionPromoted) => {
                return Err(AppError::Conflict(
                    "An account was already created from this session".to_string(),
                ));
            }
            Err(InsertError::VerificationTokenTaken) => {
                return Err(AppError::Conflict(
                    "Verification token collision".to_string(),
                ));
            }
            Err(InsertError::Database(e)) => return Err(e.into()),
        }
    };

    info!(
        "Created applicant account {account_id} ({username}) from session {}",
        session.id
    );

    // Fire-and-forget: a failed email is logged and resent out of band.
    let mailer = mailer.clone();
    let email = contact.email.clone();
    let mail_username = username.clone();
    let mail_password = password.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer
            .send_welcome(&email, &mail_username, &mail_password, verification_token)
            .await
        {
            error!("Failed to send welcome email: {e}");
        }
    });

    Ok(PromotedAccount {
        account_id,
        username,
        password,
        verification_token,
    })
}

enum InsertError {
    UsernameTaken,
    SessionPromoted,
    VerificationTokenTaken,
    Database(sqlx::Error),
}

async fn insert_applicant(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
    identity: &ExtractedIdentity,
    contact: &ContactDetails,
    session_token: Uuid,
    verification_token: Uuid,
) -> Result<i64, InsertError> {
    let id_number = Some(identity.id_number.trim()).filter(|s| !s.is_empty());

    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO applicants
            (username, password_hash, first_name, surname, email, phone, country,
             id_number, session_token, verification_token, completion_percentage)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(&identity.first_name)
    .bind(&identity.last_name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.country)
    .bind(id_number)
    .bind(session_token)
    .bind(verification_token)
    .bind(IDENTITY_STEP_COMPLETION)
    .fetch_one(pool)
    .await
    .map_err(|e| match unique_violation(&e) {
        Some("applicants_username_key") => InsertError::UsernameTaken,
        Some("applicants_session_token_key") => InsertError::SessionPromoted,
        Some("applicants_verification_token_key") => InsertError::VerificationTokenTaken,
        _ => InsertError::Database(e),
    })
}

/// Returns the violated constraint's name when the error is a unique
/// violation, so the caller can tell a username collision from a
/// twice-promoted session.
fn unique_violation(error: &sqlx::Error) -> Option<&str> {
    match error {
        sqlx::Error::Database(db) if db.is_unique_violation() => db.constraint(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::identity::{ExtractionSource, MANUAL_CONFIDENCE};

    fn identity() -> ExtractedIdentity {
        ExtractedIdentity {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            id_number: "9001015009087".to_string(),
            date_of_birth: None,
            nationality: None,
            document_type: None,
            source: ExtractionSource::Manual,
            confidence: MANUAL_CONFIDENCE,
        }
    }

    fn contact() -> ContactDetails {
        ContactDetails {
            email: "jane@example.com".to_string(),
            phone: None,
            country: Some("ZA".to_string()),
        }
    }

    #[test]
    fn required_fields_present() {
        assert!(has_required_fields(&identity(), &contact()));
    }

    #[test]
    fn blank_surname_fails_requirements() {
        let mut id = identity();
        id.last_name = "  ".to_string();
        assert!(!has_required_fields(&id, &contact()));
    }

    #[test]
    fn missing_email_fails_requirements() {
        let mut c = contact();
        c.email = String::new();
        assert!(!has_required_fields(&identity(), &c));
    }
}
