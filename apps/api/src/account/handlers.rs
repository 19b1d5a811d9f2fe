use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::promotion::{self, ContactDetails};
use crate::account::verification::{self, VerifiedAccount};
use crate::errors::AppError;
use crate::extraction::identity::{ExtractedIdentity, ExtractionSource, MANUAL_CONFIDENCE};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFromSessionRequest {
    #[serde(default)]
    pub session_token: Option<Uuid>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub id_number: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFromSessionResponse {
    pub success: bool,
    pub message: String,
    pub user: CreatedUser,
    pub login_credentials: LoginCredentials,
    pub verification_token: Uuid,
}

/// POST /api/account/create-from-session
pub async fn handle_create_from_session(
    State(state): State<AppState>,
    Json(req): Json<CreateFromSessionRequest>,
) -> Result<Json<CreateFromSessionResponse>, AppError> {
    let session_token = req
        .session_token
        .ok_or_else(|| AppError::Validation("Missing required fields".to_string()))?;

    let identity = ExtractedIdentity {
        first_name: req.first_name,
        last_name: req.surname,
        id_number: req.id_number.unwrap_or_default(),
        date_of_birth: None,
        nationality: None,
        document_type: None,
        source: ExtractionSource::Manual,
        confidence: MANUAL_CONFIDENCE,
    };
    let contact = ContactDetails {
        email: req.email,
        phone: req.phone,
        country: req.country,
    };

    let promoted =
        promotion::promote(&state.db, &state.mailer, session_token, &identity, &contact).await?;

    Ok(Json(CreateFromSessionResponse {
        success: true,
        message: "Account created successfully".to_string(),
        user: CreatedUser {
            id: promoted.account_id,
            username: promoted.username.clone(),
            email: contact.email,
            created_at: Utc::now(),
        },
        login_credentials: LoginCredentials {
            username: promoted.username,
            password: promoted.password,
        },
        verification_token: promoted.verification_token,
    }))
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyEmailResponse {
    pub success: bool,
    pub message: String,
    pub user: VerifiedAccount,
}

/// POST /api/account/verify-email
pub async fn handle_verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<Json<VerifyEmailResponse>, AppError> {
    let token = req
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Verification token is required".to_string()))?;

    // A malformed token behaves exactly like an unknown one.
    let token = Uuid::parse_str(token).map_err(|_| {
        AppError::InvalidToken("Invalid or expired verification token".to_string())
    })?;

    let user = verification::verify_email(&state.db, token).await?;

    Ok(Json(VerifyEmailResponse {
        success: true,
        message: "Email verified successfully".to_string(),
        user,
    }))
}

#[derive(Deserialize)]
pub struct ResendVerificationRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct ResendVerificationResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/account/resend-verification
pub async fn handle_resend_verification(
    State(state): State<AppState>,
    Json(req): Json<ResendVerificationRequest>,
) -> Result<Json<ResendVerificationResponse>, AppError> {
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Email address is required".to_string()))?;

    let applicant = verification::pending_verification(&state.db, email).await?;

    if let Some(token) = applicant.verification_token {
        let mailer = state.mailer.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_verification(&applicant.email, token).await {
                tracing::error!("Failed to send verification email: {e}");
            }
        });
    }

    Ok(Json(ResendVerificationResponse {
        success: true,
        message: "Verification email sent".to_string(),
    }))
}
