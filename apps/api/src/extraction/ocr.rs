//! OCR Client — the single point of entry for the document extraction
//! provider.
//!
//! ARCHITECTURAL RULE: no other module talks to the provider directly. The
//! handlers see only the `DocumentExtractor` trait, so the provider can be
//! swapped without touching them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::extraction::identity::{ExtractedIdentity, ExtractionSource};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Provider returned incomplete identity fields")]
    IncompleteFields,

    #[error("Provider unavailable after {retries} retries")]
    Unavailable { retries: u32 },
}

/// Identity fields and confidence as returned by the provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OcrResponse {
    first_name: Option<String>,
    last_name: Option<String>,
    id_number: Option<String>,
    date_of_birth: Option<String>,
    nationality: Option<String>,
    document_type: Option<String>,
    confidence: u8,
}

impl TryFrom<OcrResponse> for ExtractedIdentity {
    type Error = OcrError;

    fn try_from(response: OcrResponse) -> Result<Self, OcrError> {
        let (Some(first_name), Some(last_name), Some(id_number)) = (
            response.first_name,
            response.last_name,
            response.id_number,
        ) else {
            return Err(OcrError::IncompleteFields);
        };

        Ok(ExtractedIdentity {
            first_name,
            last_name,
            id_number,
            date_of_birth: response.date_of_birth,
            nationality: response.nationality,
            document_type: response.document_type,
            source: ExtractionSource::Automated,
            confidence: response.confidence.min(100),
        })
    }
}

/// The pluggable automated-extraction seam.
///
/// Carried in `AppState` as `Arc<dyn DocumentExtractor>`.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(
        &self,
        document: &[u8],
        content_type: &str,
    ) -> Result<ExtractedIdentity, OcrError>;
}

/// HTTP client for the OCR provider.
#[derive(Clone)]
pub struct OcrClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OcrClient {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl DocumentExtractor for OcrClient {
    /// Sends raw document bytes to the provider.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    async fn extract(
        &self,
        document: &[u8],
        content_type: &str,
    ) -> Result<ExtractedIdentity, OcrError> {
        let mut last_error: Option<OcrError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "OCR call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("content-type", content_type)
                .body(document.to_vec())
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(OcrError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("OCR provider returned {}: {}", status, body);
                last_error = Some(OcrError::Provider {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(OcrError::Provider {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: OcrResponse = response.json().await?;
            debug!("OCR extraction succeeded, confidence {}", parsed.confidence);

            return parsed.try_into();
        }

        Err(last_error.unwrap_or(OcrError::Unavailable {
            retries: MAX_RETRIES,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_response() -> OcrResponse {
        OcrResponse {
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            id_number: Some("9001015009087".to_string()),
            date_of_birth: Some("1990-01-01".to_string()),
            nationality: Some("Example Republic".to_string()),
            document_type: Some("ID Card".to_string()),
            confidence: 95,
        }
    }

    #[test]
    fn complete_response_converts() {
        let identity = ExtractedIdentity::try_from(complete_response()).unwrap();
        assert_eq!(identity.first_name, "Jane");
        assert_eq!(identity.source, ExtractionSource::Automated);
        assert_eq!(identity.confidence, 95);
    }

    #[test]
    fn missing_id_number_is_rejected() {
        let mut response = complete_response();
        response.id_number = None;
        assert!(matches!(
            ExtractedIdentity::try_from(response),
            Err(OcrError::IncompleteFields)
        ));
    }

    #[test]
    fn confidence_is_clamped_to_100() {
        let mut response = complete_response();
        response.confidence = 250;
        let identity = ExtractedIdentity::try_from(response).unwrap();
        assert_eq!(identity.confidence, 100);
    }
}
