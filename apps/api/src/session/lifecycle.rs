//! Session lifecycle rules: what it takes to open a session and which step
//! transitions are legal. The store adapter applies these against the row.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;

/// Sessions live for a fixed 24 hours from creation; the deadline is never
/// extended.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Highest step number in the application flow (0 = just created).
pub const MAX_STEP: i32 = 5;

/// Agreement record submitted when an applicant starts the flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementSet {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub agreed_to_terms: bool,
    #[serde(default)]
    pub agreed_to_data_protection: bool,
    #[serde(default)]
    pub agreed_to_privacy: bool,
}

impl AgreementSet {
    pub fn all_accepted(&self) -> bool {
        self.agreed_to_terms && self.agreed_to_data_protection && self.agreed_to_privacy
    }
}

/// A session ready to be persisted: fresh token, fixed expiry, seeded payload.
pub struct NewSession {
    pub token: Uuid,
    pub expires_at: DateTime<Utc>,
    pub seed: serde_json::Value,
}

/// Builds a new session from an accepted agreement set.
///
/// All three agreements are mandatory. The token is a 128-bit random bearer
/// capability; the payload starts with the agreement record so it survives
/// later step merges.
pub fn open_session(agreements: &AgreementSet) -> Result<NewSession, AppError> {
    if !agreements.all_accepted() {
        return Err(AppError::Validation(
            "All agreements must be accepted to proceed".to_string(),
        ));
    }

    let now = Utc::now();
    let seed = json!({
        "agreements": {
            "terms": true,
            "dataProtection": true,
            "privacy": true,
            "timestamp": agreements.timestamp,
        },
        "started_at": now.to_rfc3339(),
    });

    Ok(NewSession {
        token: Uuid::new_v4(),
        expires_at: now + Duration::hours(SESSION_TTL_HOURS),
        seed,
    })
}

/// Rejects step numbers outside the flow. Monotonicity against the stored
/// step is enforced inside the store's conditional UPDATE.
pub fn validate_step(step_completed: i32) -> Result<(), AppError> {
    if !(0..=MAX_STEP).contains(&step_completed) {
        return Err(AppError::Validation(format!(
            "stepCompleted must be between 0 and {MAX_STEP}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted() -> AgreementSet {
        AgreementSet {
            timestamp: Some("2026-08-06T10:00:00Z".to_string()),
            agreed_to_terms: true,
            agreed_to_data_protection: true,
            agreed_to_privacy: true,
        }
    }

    #[test]
    fn opens_session_when_all_agreements_accepted() {
        let session = open_session(&accepted()).unwrap();
        assert!(!session.token.is_nil());
        assert_eq!(session.seed["agreements"]["terms"], true);
        assert_eq!(
            session.seed["agreements"]["timestamp"],
            "2026-08-06T10:00:00Z"
        );
    }

    #[test]
    fn expiry_is_24_hours_out() {
        let session = open_session(&accepted()).unwrap();
        let ttl = session.expires_at - Utc::now();
        assert!(ttl <= Duration::hours(24));
        assert!(ttl > Duration::hours(24) - Duration::seconds(5));
    }

    #[test]
    fn tokens_are_unique_per_session() {
        let a = open_session(&accepted()).unwrap();
        let b = open_session(&accepted()).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn rejects_missing_terms() {
        let mut agreements = accepted();
        agreements.agreed_to_terms = false;
        assert!(matches!(
            open_session(&agreements),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_missing_data_protection() {
        let mut agreements = accepted();
        agreements.agreed_to_data_protection = false;
        assert!(open_session(&agreements).is_err());
    }

    #[test]
    fn rejects_missing_privacy() {
        let mut agreements = accepted();
        agreements.agreed_to_privacy = false;
        assert!(open_session(&agreements).is_err());
    }

    #[test]
    fn timestamp_is_optional() {
        let mut agreements = accepted();
        agreements.timestamp = None;
        assert!(open_session(&agreements).is_ok());
    }

    #[test]
    fn step_range_is_enforced() {
        assert!(validate_step(0).is_ok());
        assert!(validate_step(MAX_STEP).is_ok());
        assert!(validate_step(-1).is_err());
        assert!(validate_step(MAX_STEP + 1).is_err());
    }
}
