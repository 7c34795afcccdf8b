//! Domain types and models

mod language;
mod usage;

pub use language::{OcrLanguage, UnsupportedLanguage};
pub use usage::UsageCounter;
