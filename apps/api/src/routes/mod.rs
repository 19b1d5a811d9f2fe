pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::account::handlers as account;
use crate::errors::AppError;
use crate::extraction::handlers as documents;
use crate::session::handlers as pre_application;
use crate::state::AppState;

async fn not_implemented() -> Result<(), AppError> {
    Err(AppError::NotImplemented)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Pre-application session lifecycle
        .route(
            "/api/pre-application/start",
            post(pre_application::handle_start),
        )
        .route(
            "/api/pre-application/session/:token",
            get(pre_application::handle_get_session)
                .put(pre_application::handle_update_session)
                .delete(pre_application::handle_delete_session),
        )
        .route(
            "/api/pre-application/cleanup",
            get(pre_application::handle_cleanup),
        )
        // Identity document extraction
        .route(
            "/api/documents/process-id",
            post(documents::handle_process_id),
        )
        .route(
            "/api/documents/manual-entry",
            post(documents::handle_manual_entry),
        )
        // Account promotion and verification
        .route(
            "/api/account/create-from-session",
            post(account::handle_create_from_session),
        )
        .route(
            "/api/account/verify-email",
            post(account::handle_verify_email),
        )
        .route(
            "/api/account/resend-verification",
            post(account::handle_resend_verification),
        )
        // Post-verification application flow (separate phase)
        .route("/api/auth/login", post(not_implemented))
        .route("/api/application/:id/current-step", get(not_implemented))
        .route("/api/certificates/upload", post(not_implemented))
        .route("/api/profile/:username", get(not_implemented))
        .route("/api/public/applicants", get(not_implemented))
        .with_state(state)
}
