//! OpenAPI 3.0 specification definition

use utoipa::OpenApi;

use crate::api::handlers::{
    health::HealthResponse,
    extract::{ExtractForm, ExtractResponse},
};
use crate::domain::OcrLanguage;
use crate::extraction::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lipi OCR API",
        version = "1.0.0",
        description = "Text extraction from images in Telugu, Kannada, Hindi and English, under a daily request quota",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "system", description = "System health endpoints"),
        (name = "ocr", description = "Text extraction endpoints")
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::extract::extract_text,
    ),
    components(
        schemas(
            HealthResponse,
            ExtractForm,
            ExtractResponse,
            ErrorResponse,
            OcrLanguage,
        )
    )
)]
pub struct ApiDoc;
