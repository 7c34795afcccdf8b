//! Image decoding

use image::DynamicImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot identify image file: {0}")]
    Unrecognized(#[from] image::ImageError),
}

/// Turns uploaded bytes into a decoded image
///
/// Decoding is CPU bound; callers run it off the async workers.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError>;
}

/// Decoder backed by the `image` crate, format guessed from the content
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        Ok(image::load_from_memory(bytes)?)
    }
}
