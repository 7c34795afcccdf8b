//! Recognition collaborators
//!
//! This module contains the two external capabilities an extraction needs:
//! - Image decoding (bytes to a decoded image)
//! - Text recognition (decoded image plus language code to raw text)

mod decoder;
mod tesseract;

pub use decoder::{DecodeError, ImageCrateDecoder, ImageDecoder};
pub use tesseract::{OcrEngine, OcrError, TesseractEngine};
