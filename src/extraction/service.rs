//! Extraction service wiring the quota gate, decoder and OCR engine

use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use super::error::{ExtractError, ValidationError};
use crate::domain::OcrLanguage;
use crate::engine::{ImageDecoder, OcrEngine};
use crate::quota::QuotaGate;

/// The `image` part of an extraction request
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Bytes,
}

/// Runs extraction requests against three injected capabilities
#[derive(Clone)]
pub struct Extractor {
    gate: Arc<dyn QuotaGate>,
    decoder: Arc<dyn ImageDecoder>,
    engine: Arc<dyn OcrEngine>,
    default_language: String,
    quota_disabled: bool,
}

impl Extractor {
    pub fn new(
        gate: Arc<dyn QuotaGate>,
        decoder: Arc<dyn ImageDecoder>,
        engine: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            gate,
            decoder,
            engine,
            default_language: OcrLanguage::Tel.code().to_string(),
            quota_disabled: false,
        }
    }

    /// Language used when a request does not select one
    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    /// Skip the quota gate entirely
    pub fn with_quota_disabled(mut self, disabled: bool) -> Self {
        self.quota_disabled = disabled;
        self
    }

    /// Consume one unit of today's quota, unless the gate is bypassed
    pub async fn admit(&self) -> Result<(), ExtractError> {
        if self.quota_disabled {
            return Ok(());
        }

        match self.gate.try_consume().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ExtractError::QuotaExceeded),
            Err(e) => {
                error!(error = %e, "Quota check failed, rejecting request");
                Err(ExtractError::StoreUnavailable(e))
            }
        }
    }

    /// Pick the language for a request: a valid override or the configured default
    pub fn resolve_language(&self, requested: Option<&str>) -> Result<String, ExtractError> {
        Ok(match OcrLanguage::parse_override(requested)? {
            Some(lang) => lang.code().to_string(),
            None => self.default_language.clone(),
        })
    }

    /// Validate the upload, decode it and run recognition
    ///
    /// Call after `admit`. Returns the recognized text trimmed at both ends.
    pub async fn extract(
        &self,
        upload: Option<ImageUpload>,
        requested_language: Option<&str>,
    ) -> Result<String, ExtractError> {
        let upload = upload.ok_or(ValidationError::MissingImage)?;
        if upload.filename.is_empty() {
            return Err(ValidationError::EmptyFilename.into());
        }
        let language = self.resolve_language(requested_language)?;

        let start = Instant::now();
        let size = upload.data.len();

        let decoder = self.decoder.clone();
        let image = tokio::task::spawn_blocking(move || decoder.decode(&upload.data))
            .await
            .map_err(|e| ExtractError::Internal(e.to_string()))??;

        let text = self.engine.recognize(&image, &language).await?;
        let text = text.trim().to_string();

        info!(
            language = %language,
            bytes = size,
            chars = text.chars().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Text extracted"
        );

        Ok(text)
    }
}
