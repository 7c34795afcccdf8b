//! Tesseract OCR engine driven as a subprocess

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat};
use std::io::Cursor;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// OCR engine errors
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Failed to encode image for OCR: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Failed to run tesseract: {0}")]
    Io(#[from] std::io::Error),
    #[error("tesseract timed out after {0} seconds")]
    Timeout(u64),
    #[error("tesseract failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },
}

/// Converts a decoded image into raw text in the given language
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError>;
}

/// Runs `tesseract stdin stdout -l <lang>` with the image piped in as PNG
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    timeout: Duration,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Language packs installed for this tesseract binary
    pub async fn installed_languages(&self) -> Result<Vec<String>, OcrError> {
        let output = Command::new(&self.binary)
            .arg("--list-langs")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // First line is a header ("List of available languages ...")
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .skip(1)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageOutputFormat::Png)?;
    Ok(buf.into_inner())
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError> {
        let start = Instant::now();
        let png = encode_png(image)?;

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Feed stdin from its own task so a chatty child cannot block on a full stdout pipe
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                let result = stdin.write_all(&png).await;
                drop(stdin);
                result
            })
        });

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(language, timeout_secs = self.timeout.as_secs(), "tesseract timed out");
                return Err(OcrError::Timeout(self.timeout.as_secs()));
            }
        };

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(OcrError::Io(e)),
                Err(e) => return Err(OcrError::Io(std::io::Error::other(e))),
            }
        }

        debug!(
            language,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "tesseract finished"
        );

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
