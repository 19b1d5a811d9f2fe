//! Mailer Client — the single point of entry for outbound applicant email.
//!
//! Notification is fire-and-forget from the pipeline's point of view:
//! failures are logged at the call site and never propagate into request
//! handling. Account creation is the source of truth, not email delivery.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mailer error (status {status}): {message}")]
    Mailer { status: u16, message: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WelcomeEmail<'a> {
    template: &'static str,
    to: &'a str,
    username: &'a str,
    password: &'a str,
    verification_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerificationEmail<'a> {
    template: &'static str,
    to: &'a str,
    verification_url: String,
}

/// HTTP client for the transactional mail service.
#[derive(Clone)]
pub struct MailerClient {
    client: Client,
    endpoint: String,
    api_key: String,
    verify_url_base: String,
}

impl MailerClient {
    pub fn new(endpoint: String, api_key: String, public_base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint,
            api_key,
            verify_url_base: public_base_url,
        }
    }

    fn verification_url(&self, token: Uuid) -> String {
        format!(
            "{}/verify-email?token={token}",
            self.verify_url_base.trim_end_matches('/')
        )
    }

    /// Sends login credentials and the verification link to a new applicant.
    /// This is the only egress of the plaintext password besides the
    /// promotion response itself.
    pub async fn send_welcome(
        &self,
        to: &str,
        username: &str,
        password: &str,
        verification_token: Uuid,
    ) -> Result<(), NotifyError> {
        self.dispatch(&WelcomeEmail {
            template: "welcome",
            to,
            username,
            password,
            verification_url: self.verification_url(verification_token),
        })
        .await
    }

    /// Re-sends just the verification link.
    pub async fn send_verification(
        &self,
        to: &str,
        verification_token: Uuid,
    ) -> Result<(), NotifyError> {
        self.dispatch(&VerificationEmail {
            template: "verify-email",
            to,
            verification_url: self.verification_url(verification_token),
        })
        .await
    }

    async fn dispatch<T: Serialize>(&self, payload: &T) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Mailer {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Dispatched notification email");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_url_embeds_token() {
        let mailer = MailerClient::new(
            "http://mailer.local/send".to_string(),
            "key".to_string(),
            "https://apply.example.com/".to_string(),
        );
        let token = Uuid::new_v4();
        let url = mailer.verification_url(token);
        assert_eq!(
            url,
            format!("https://apply.example.com/verify-email?token={token}")
        );
    }
}
