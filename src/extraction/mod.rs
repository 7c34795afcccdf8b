//! Extraction pipeline
//!
//! Admission through the quota gate, language resolution, then decode and
//! recognition through the injected collaborators.

mod error;
mod service;

pub use error::{ErrorResponse, ExtractError, ValidationError};
pub use service::{Extractor, ImageUpload};
