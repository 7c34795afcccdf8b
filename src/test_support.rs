//! Fake collaborators and app builders shared by handler tests

use actix_web::{web, App};
use async_trait::async_trait;
use image::DynamicImage;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::{QuotaStoreKind, Settings};
use crate::db::DbError;
use crate::engine::{DecodeError, ImageDecoder, OcrEngine, OcrError};
use crate::extraction::Extractor;
use crate::quota::{QuotaError, QuotaGate};
use crate::AppState;

/// Gate answering with a fixed outcome
pub enum FakeGate {
    Allow,
    Deny,
    Down,
}

#[async_trait]
impl QuotaGate for FakeGate {
    async fn try_consume(&self) -> Result<bool, QuotaError> {
        match self {
            FakeGate::Allow => Ok(true),
            FakeGate::Deny => Ok(false),
            FakeGate::Down => Err(QuotaError::StoreUnavailable(DbError::Config("boom".into()))),
        }
    }
}

/// Decoder that accepts any bytes
pub struct AnyDecoder;

impl ImageDecoder for AnyDecoder {
    fn decode(&self, _bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        Ok(DynamicImage::new_luma8(1, 1))
    }
}

/// Engine returning a canned text and recording the languages it was asked for
pub struct ScriptedEngine {
    text: String,
    pub languages: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            languages: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl OcrEngine for ScriptedEngine {
    async fn recognize(&self, _image: &DynamicImage, language: &str) -> Result<String, OcrError> {
        self.languages.lock().push(language.to_string());
        Ok(self.text.clone())
    }
}

/// Settings usable without any external service
pub fn local_settings() -> Settings {
    let mut settings = Settings::default();
    settings.quota.store = QuotaStoreKind::Memory;
    settings
}

/// Shared state around the given collaborators
pub fn state(
    settings: Settings,
    gate: Arc<dyn QuotaGate>,
    decoder: Arc<dyn ImageDecoder>,
    engine: Arc<dyn OcrEngine>,
) -> web::Data<AppState> {
    let extractor = Extractor::new(gate, decoder, engine)
        .with_default_language(settings.ocr.language.clone())
        .with_quota_disabled(settings.quota.disabled);
    web::Data::new(AppState { settings, extractor })
}

/// App with every route mounted, as `main` builds it
pub fn app(
    state: web::Data<AppState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let frontend = state.settings.frontend.clone();
    App::new()
        .app_data(state)
        .configure(|cfg| crate::api::configure_routes(cfg, &frontend))
}

/// Multipart body with one `image` part; `None` omits the filename attribute
pub fn multipart_image(filename: Option<&str>, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----lipi-test-boundary";
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"image\"; filename=\"{}\"", name),
        None => "form-data; name=\"image\"".to_string(),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}

/// Multipart body with a single plain form field
pub fn multipart_field(name: &str, value: &str) -> (String, Vec<u8>) {
    let boundary = "----lipi-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{n}\"\r\n\r\n{v}\r\n--{b}--\r\n",
        b = boundary,
        n = name,
        v = value
    );
    (format!("multipart/form-data; boundary={}", boundary), body.into_bytes())
}
