use std::time::Instant;

use aws_sdk_s3::primitives::ByteStream;
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::identity::{ExtractedIdentity, ManualEntry};
use crate::extraction::upload::{extract_pdf_text_identity, validate_upload};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessIdResponse {
    pub success: bool,
    pub message: String,
    pub extracted_data: ExtractedIdentity,
    pub confidence: u8,
    pub processing_time: String,
    pub document_url: String,
}

/// POST /api/documents/process-id
///
/// Multipart upload of the identity document under the `idDocument` field.
/// The original file is archived to S3 before extraction so a failed
/// provider call can be retried without a re-upload.
pub async fn handle_process_id(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessIdResponse>, AppError> {
    let started = Instant::now();

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("idDocument") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
            upload = Some((filename, content_type, data));
            break;
        }
    }

    let (filename, content_type, data) =
        upload.ok_or_else(|| AppError::Validation("No ID document uploaded".to_string()))?;

    let validated = validate_upload(
        &filename,
        &content_type,
        data.len(),
        state.config.max_upload_bytes,
    )?;

    let document_key = format!("documents/{}.{}", Uuid::new_v4(), validated.extension);
    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&document_key)
        .body(ByteStream::from(data.to_vec()))
        .content_type(&validated.content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Document archive failed: {e}")))?;

    // PDF text layer first; everything else goes to the extraction provider.
    let text_layer = if validated.extension == "pdf" {
        extract_pdf_text_identity(&data)
    } else {
        None
    };

    let identity = match text_layer {
        Some(identity) => {
            tracing::debug!("Extracted identity from PDF text layer");
            identity
        }
        None => state
            .extractor
            .extract(&data, &validated.content_type)
            .await
            .map_err(|e| AppError::Extraction(e.to_string()))?,
    };

    let confidence = identity.confidence;
    tracing::info!("Processed ID document {document_key} (confidence {confidence})");

    Ok(Json(ProcessIdResponse {
        success: true,
        message: "ID document processed successfully".to_string(),
        extracted_data: identity,
        confidence,
        processing_time: format!("{:.1}s", started.elapsed().as_secs_f64()),
        document_url: format!("s3://{}/{}", state.config.s3_bucket, document_key),
    }))
}

#[derive(Serialize)]
pub struct ManualEntryResponse {
    pub success: bool,
    pub message: String,
    pub data: ExtractedIdentity,
}

/// POST /api/documents/manual-entry
///
/// Fallback for applicants whose document could not be processed. Echoes the
/// normalized identity; merging it into the session is the caller's next
/// request.
pub async fn handle_manual_entry(
    Json(req): Json<ManualEntry>,
) -> Result<Json<ManualEntryResponse>, AppError> {
    let identity = ExtractedIdentity::from_manual(&req)?;

    Ok(Json(ManualEntryResponse {
        success: true,
        message: "Personal data saved successfully".to_string(),
        data: identity,
    }))
}
