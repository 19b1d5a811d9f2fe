//! Upload validation and the PDF text-layer fast path.
//!
//! Validation happens before any storage or provider work: a rejected file
//! costs nothing downstream.

use crate::errors::AppError;
use crate::extraction::identity::{ExtractedIdentity, ExtractionSource};

/// Extensions accepted for identity documents.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf", "doc", "docx"];

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// An upload that passed the size and type checks.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub extension: String,
    pub content_type: String,
}

pub fn validate_upload(
    filename: &str,
    content_type: &str,
    size: usize,
    max_bytes: usize,
) -> Result<ValidatedUpload, AppError> {
    if size == 0 {
        return Err(AppError::Validation("No ID document uploaded".to_string()));
    }
    if size > max_bytes {
        return Err(AppError::UnsupportedMedia(format!(
            "File exceeds the {max_bytes} byte upload limit"
        )));
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            AppError::UnsupportedMedia("Only image and document files are allowed".to_string())
        })?;

    if !ALLOWED_MIME_TYPES.contains(&content_type) {
        return Err(AppError::UnsupportedMedia(
            "Only image and document files are allowed".to_string(),
        ));
    }

    Ok(ValidatedUpload {
        extension,
        content_type: content_type.to_string(),
    })
}

// Weight of each identity field in the text-layer confidence score.
const WEIGHT_FIRST_NAME: u8 = 25;
const WEIGHT_LAST_NAME: u8 = 25;
const WEIGHT_ID_NUMBER: u8 = 30;
const WEIGHT_DATE_OF_BIRTH: u8 = 10;
const WEIGHT_NATIONALITY: u8 = 10;

/// Attempts to read identity fields from a PDF's embedded text layer.
///
/// Returns `None` when the document has no usable text layer or a mandatory
/// field is missing; the caller then falls back to the extraction provider.
pub fn extract_pdf_text_identity(bytes: &[u8]) -> Option<ExtractedIdentity> {
    let text = pdf_extract::extract_text_from_mem(bytes).ok()?;
    parse_labeled_fields(&text)
}

/// Parses `Label: value` lines as found in machine-readable identity
/// documents. Confidence is the sum of the weights of the fields found.
pub fn parse_labeled_fields(text: &str) -> Option<ExtractedIdentity> {
    let mut first_name = None;
    let mut last_name = None;
    let mut id_number = None;
    let mut date_of_birth = None;
    let mut nationality = None;

    for line in text.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match label.trim().to_lowercase().as_str() {
            "surname" | "last name" => last_name = Some(value.to_string()),
            "names" | "first names" | "first name" | "given names" => {
                first_name = Some(value.to_string())
            }
            "identity number" | "id number" => id_number = Some(value.to_string()),
            "date of birth" | "birth date" => date_of_birth = Some(value.to_string()),
            "nationality" => nationality = Some(value.to_string()),
            _ => {}
        }
    }

    let mut confidence = 0u8;
    if first_name.is_some() {
        confidence += WEIGHT_FIRST_NAME;
    }
    if last_name.is_some() {
        confidence += WEIGHT_LAST_NAME;
    }
    if id_number.is_some() {
        confidence += WEIGHT_ID_NUMBER;
    }
    if date_of_birth.is_some() {
        confidence += WEIGHT_DATE_OF_BIRTH;
    }
    if nationality.is_some() {
        confidence += WEIGHT_NATIONALITY;
    }

    Some(ExtractedIdentity {
        first_name: first_name?,
        last_name: last_name?,
        id_number: id_number?,
        date_of_birth,
        nationality,
        document_type: Some("ID Document".to_string()),
        source: ExtractionSource::Automated,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 10 * 1024 * 1024;

    #[test]
    fn accepts_jpeg_within_limit() {
        let upload = validate_upload("id-front.jpg", "image/jpeg", 1024, MAX).unwrap();
        assert_eq!(upload.extension, "jpg");
    }

    #[test]
    fn extension_is_case_insensitive() {
        let upload = validate_upload("scan.PDF", "application/pdf", 1024, MAX).unwrap();
        assert_eq!(upload.extension, "pdf");
    }

    #[test]
    fn rejects_oversized_file() {
        let err = validate_upload("id.png", "image/png", MAX + 1, MAX);
        assert!(matches!(err, Err(AppError::UnsupportedMedia(_))));
    }

    #[test]
    fn rejects_empty_file() {
        assert!(matches!(
            validate_upload("id.png", "image/png", 0, MAX),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_disallowed_extension() {
        let err = validate_upload("script.exe", "image/png", 1024, MAX);
        assert!(matches!(err, Err(AppError::UnsupportedMedia(_))));
    }

    #[test]
    fn rejects_missing_extension() {
        assert!(validate_upload("idcard", "image/png", 1024, MAX).is_err());
    }

    #[test]
    fn rejects_disallowed_mime_type() {
        let err = validate_upload("id.png", "text/html", 1024, MAX);
        assert!(matches!(err, Err(AppError::UnsupportedMedia(_))));
    }

    const ID_TEXT: &str = "\
REPUBLIC OF EXAMPLE
Surname: Doe
Names: Jane Ann
Identity Number: 9001015009087
Date of Birth: 1990-01-01
Nationality: Example Republic
";

    #[test]
    fn parses_labeled_id_text() {
        let identity = parse_labeled_fields(ID_TEXT).unwrap();
        assert_eq!(identity.first_name, "Jane Ann");
        assert_eq!(identity.last_name, "Doe");
        assert_eq!(identity.id_number, "9001015009087");
        assert_eq!(identity.source, ExtractionSource::Automated);
        assert_eq!(identity.confidence, 100);
    }

    #[test]
    fn confidence_drops_with_missing_optional_fields() {
        let text = "Surname: Doe\nFirst Names: Jane\nID Number: 123\n";
        let identity = parse_labeled_fields(text).unwrap();
        assert_eq!(identity.confidence, 80);
        assert!(identity.date_of_birth.is_none());
    }

    #[test]
    fn missing_mandatory_field_yields_none() {
        let text = "Surname: Doe\nNames: Jane\nNationality: Example\n";
        assert!(parse_labeled_fields(text).is_none());
    }

    #[test]
    fn unlabeled_text_yields_none() {
        assert!(parse_labeled_fields("just a scanned image with no text").is_none());
    }

    #[test]
    fn blank_values_are_ignored() {
        let text = "Surname: \nNames: Jane\nIdentity Number: 123\n";
        assert!(parse_labeled_fields(text).is_none());
    }
}
