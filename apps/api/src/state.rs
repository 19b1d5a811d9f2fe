use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::extraction::ocr::DocumentExtractor;
use crate::notify::MailerClient;

/// Shared application state injected into all route handlers via Axum
/// extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    /// Pluggable automated-extraction provider. Default: `OcrClient`.
    pub extractor: Arc<dyn DocumentExtractor>,
    pub mailer: MailerClient,
    pub config: Config,
}
