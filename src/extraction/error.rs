//! Extraction errors and their HTTP mapping

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::UnsupportedLanguage;
use crate::engine::{DecodeError, OcrError};
use crate::quota::QuotaError;

pub const QUOTA_EXCEEDED_MESSAGE: &str = "Daily quota exceeded. Please try again tomorrow.";
pub const STORE_UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable";

/// User-correctable request problems
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No image file provided")]
    MissingImage,
    #[error("No selected file")]
    EmptyFilename,
    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),
    #[error("Image exceeds the maximum upload size of {0} bytes")]
    TooLarge(usize),
    #[error("Malformed multipart body: {0}")]
    Malformed(String),
}

/// Every way an extraction request can end short of success
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{}", QUOTA_EXCEEDED_MESSAGE)]
    QuotaExceeded,
    #[error(transparent)]
    StoreUnavailable(#[from] QuotaError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error("Processing failed: {0}")]
    Internal(String),
}

/// Error body, `{"error": "..."}`
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ExtractError {
    /// Message sent to the caller
    ///
    /// Store failures get a generic text; processing failures pass the
    /// underlying message through.
    pub fn public_message(&self) -> String {
        match self {
            ExtractError::StoreUnavailable(_) => STORE_UNAVAILABLE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<UnsupportedLanguage> for ExtractError {
    fn from(err: UnsupportedLanguage) -> Self {
        ExtractError::Validation(err.into())
    }
}

impl ResponseError for ExtractError {
    fn status_code(&self) -> StatusCode {
        match self {
            ExtractError::Validation(_) => StatusCode::BAD_REQUEST,
            ExtractError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            ExtractError::StoreUnavailable(_)
            | ExtractError::Decode(_)
            | ExtractError::Ocr(_)
            | ExtractError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.public_message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ExtractError::from(ValidationError::MissingImage).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ExtractError::QuotaExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
        let store = ExtractError::from(QuotaError::from(DbError::Config("down".into())));
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_cause_is_not_exposed() {
        let err = ExtractError::from(QuotaError::from(DbError::Config("password rejected".into())));
        assert_eq!(err.public_message(), "Service temporarily unavailable");
        assert!(err.to_string().contains("password rejected"));
    }

    #[test]
    fn test_processing_message_passes_through() {
        let err = ExtractError::Ocr(OcrError::Timeout(60));
        assert_eq!(err.public_message(), "tesseract timed out after 60 seconds");
    }

    #[test]
    fn test_language_message() {
        let err = ExtractError::from(UnsupportedLanguage("zzz".into()));
        assert_eq!(err.public_message(), "Unsupported OCR language. Allowed: tel, kan, hin, eng.");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
