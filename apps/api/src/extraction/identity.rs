//! The uniform identity shape produced by every extraction path.
//!
//! Whether the fields came from the OCR provider, a PDF text layer, or a
//! manual form submission, downstream code (session merge, account
//! promotion) sees the same `ExtractedIdentity`.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// How an identity reached the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    Automated,
    Manual,
}

/// Confidence assigned to manual entries by convention: a human typed it.
pub const MANUAL_CONFIDENCE: u8 = 100;

/// Identity fields extracted from a document or entered by hand.
///
/// `first_name`, `last_name` and `id_number` are mandatory regardless of
/// source. Confidence is informational: nothing in the pipeline rejects a
/// low-confidence extraction; the caller decides whether to ask the
/// applicant to confirm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedIdentity {
    pub first_name: String,
    pub last_name: String,
    pub id_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    pub source: ExtractionSource,
    pub confidence: u8,
}

/// Manual-entry fallback form, as submitted by the client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
}

/// Trims a field and drops it entirely if nothing is left.
fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

impl ExtractedIdentity {
    /// Normalizes a manual form submission.
    ///
    /// Mandatory fields that are missing or blank fail validation before
    /// anything else sees the entry; nothing is persisted on failure.
    pub fn from_manual(entry: &ManualEntry) -> Result<Self, AppError> {
        let missing = || {
            AppError::Validation(
                "First name, last name, and ID number are required".to_string(),
            )
        };

        Ok(ExtractedIdentity {
            first_name: clean(entry.first_name.as_deref()).ok_or_else(missing)?,
            last_name: clean(entry.last_name.as_deref()).ok_or_else(missing)?,
            id_number: clean(entry.id_number.as_deref()).ok_or_else(missing)?,
            date_of_birth: clean(entry.date_of_birth.as_deref()),
            nationality: clean(entry.nationality.as_deref()),
            document_type: None,
            source: ExtractionSource::Manual,
            confidence: MANUAL_CONFIDENCE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_entry() -> ManualEntry {
        ManualEntry {
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            id_number: Some("9001015009087".to_string()),
            date_of_birth: Some("1990-01-01".to_string()),
            nationality: Some("South African".to_string()),
        }
    }

    #[test]
    fn normalizes_full_manual_entry() {
        let identity = ExtractedIdentity::from_manual(&full_entry()).unwrap();
        assert_eq!(identity.first_name, "Jane");
        assert_eq!(identity.source, ExtractionSource::Manual);
        assert_eq!(identity.confidence, MANUAL_CONFIDENCE);
    }

    #[test]
    fn trims_whitespace_from_fields() {
        let mut entry = full_entry();
        entry.first_name = Some("  Jane ".to_string());
        entry.nationality = Some(" South African ".to_string());
        let identity = ExtractedIdentity::from_manual(&entry).unwrap();
        assert_eq!(identity.first_name, "Jane");
        assert_eq!(identity.nationality.as_deref(), Some("South African"));
    }

    #[test]
    fn rejects_missing_id_number() {
        let mut entry = full_entry();
        entry.id_number = None;
        assert!(matches!(
            ExtractedIdentity::from_manual(&entry),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_blank_first_name() {
        let mut entry = full_entry();
        entry.first_name = Some("   ".to_string());
        assert!(ExtractedIdentity::from_manual(&entry).is_err());
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let mut entry = full_entry();
        entry.date_of_birth = None;
        entry.nationality = Some(String::new());
        let identity = ExtractedIdentity::from_manual(&entry).unwrap();
        assert!(identity.date_of_birth.is_none());
        assert!(identity.nationality.is_none());
    }
}
