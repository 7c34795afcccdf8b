//! OCR languages a request may select
//!
//! The list stays short on purpose: every language pack adds CPU cost per call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Tesseract language packs accepted as a per-request override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OcrLanguage {
    /// Telugu
    Tel,
    /// Kannada
    Kan,
    /// Hindi (Devanagari script)
    Hin,
    /// English
    Eng,
}

/// Raised when an override is not in the allow-list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported OCR language. Allowed: {}.", OcrLanguage::allowed_list())]
pub struct UnsupportedLanguage(pub String);

impl OcrLanguage {
    /// All accepted languages, in the order they are advertised
    pub const ALL: [OcrLanguage; 4] = [
        OcrLanguage::Tel,
        OcrLanguage::Kan,
        OcrLanguage::Hin,
        OcrLanguage::Eng,
    ];

    /// Tesseract language code
    pub fn code(&self) -> &'static str {
        match self {
            OcrLanguage::Tel => "tel",
            OcrLanguage::Kan => "kan",
            OcrLanguage::Hin => "hin",
            OcrLanguage::Eng => "eng",
        }
    }

    /// Comma separated codes, e.g. `tel, kan, hin, eng`
    pub fn allowed_list() -> String {
        Self::ALL.iter().map(|l| l.code()).collect::<Vec<_>>().join(", ")
    }

    /// Normalize a raw override (trim, lower-case)
    ///
    /// Returns `Ok(None)` when the value is blank so the caller can fall back
    /// to its configured default.
    pub fn parse_override(raw: Option<&str>) -> Result<Option<Self>, UnsupportedLanguage> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(value) => value.parse().map(Some),
        }
    }
}

impl FromStr for OcrLanguage {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code() == normalized)
            .ok_or(UnsupportedLanguage(normalized))
    }
}

impl fmt::Display for OcrLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
