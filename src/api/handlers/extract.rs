//! Text extraction endpoint

use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use bytes::BytesMut;
use futures::StreamExt;
use serde::Serialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::extraction::{ErrorResponse, ExtractError, ImageUpload, ValidationError};
use crate::AppState;

/// Query parameters for extraction
#[derive(Debug, IntoParams)]
#[allow(dead_code)]
#[into_params(parameter_in = Query)]
pub struct ExtractQuery {
    /// OCR language override: tel, kan, hin or eng (case-insensitive)
    pub lang: Option<String>,
}

/// Multipart form accepted by POST /extract
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ExtractForm {
    /// Image to recognize
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// Successful extraction
#[derive(Debug, Serialize, ToSchema)]
pub struct ExtractResponse {
    pub status: &'static str,
    pub text: String,
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// First `lang` value in the query string; repeats are ignored
fn lang_param(req: &HttpRequest) -> Option<String> {
    url::form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == "lang")
        .map(|(_, value)| value.into_owned())
}

/// Pull the first `image` file part out of the body
///
/// Parts without a filename attribute are plain form fields, not files, and
/// do not count as an image. Other parts are drained and ignored.
async fn read_image_part(
    req: &HttpRequest,
    payload: web::Payload,
    max_bytes: usize,
) -> Result<Option<ImageUpload>, ValidationError> {
    if !is_multipart(req) {
        return Ok(None);
    }

    let mut multipart = Multipart::new(req.headers(), payload.into_inner());
    let mut upload = None;

    while let Some(field) = multipart.next().await {
        let mut field = field.map_err(|e| ValidationError::Malformed(e.to_string()))?;

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let wanted = upload.is_none() && field.name() == Some("image") && filename.is_some();

        let mut data = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ValidationError::Malformed(e.to_string()))?;
            if !wanted {
                continue;
            }
            if data.len() + chunk.len() > max_bytes {
                return Err(ValidationError::TooLarge(max_bytes));
            }
            data.extend_from_slice(&chunk);
        }

        if wanted {
            upload = filename.map(|filename| ImageUpload {
                filename,
                data: data.freeze(),
            });
        }
    }

    Ok(upload)
}

/// POST /extract - Recognize text in an uploaded image
#[utoipa::path(
    post,
    path = "/extract",
    tag = "ocr",
    params(ExtractQuery),
    request_body(content = ExtractForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Text extracted", body = ExtractResponse),
        (status = 400, description = "Missing image, empty filename or unsupported language", body = ErrorResponse),
        (status = 429, description = "Daily quota exceeded", body = ErrorResponse),
        (status = 500, description = "Quota store unavailable or recognition failed", body = ErrorResponse)
    )
)]
pub async fn extract_text(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, ExtractError> {
    state.extractor.admit().await?;

    let lang = lang_param(&req);
    let upload = read_image_part(&req, payload, state.settings.ocr.max_upload_bytes).await?;

    info!(
        filename = upload.as_ref().map(|u| u.filename.as_str()).unwrap_or(""),
        lang = lang.as_deref().unwrap_or(""),
        "Processing extraction request"
    );

    let text = state.extractor.extract(upload, lang.as_deref()).await?;

    Ok(HttpResponse::Ok().json(ExtractResponse {
        status: "success",
        text,
    }))
}

/// Any other method on /extract
pub async fn extract_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Not found" }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use actix_web::test;
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn post(
        gate: FakeGate,
        engine: Arc<ScriptedEngine>,
        uri: &str,
        body: Option<(String, Vec<u8>)>,
    ) -> (u16, Value) {
        let state = state(local_settings(), Arc::new(gate), Arc::new(AnyDecoder), engine);
        let app = test::init_service(app(state)).await;

        let mut req = test::TestRequest::post().uri(uri);
        if let Some((content_type, payload)) = body {
            req = req.insert_header(("content-type", content_type)).set_payload(payload);
        }
        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status().as_u16();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    fn engine() -> Arc<ScriptedEngine> {
        Arc::new(ScriptedEngine::new(""))
    }

    #[actix_web::test]
    async fn test_missing_image_returns_400() {
        let (status, body) = post(FakeGate::Allow, engine(), "/extract", None).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({"error": "No image file provided"}));
    }

    #[actix_web::test]
    async fn test_plain_form_field_is_not_an_image() {
        let (status, body) =
            post(FakeGate::Allow, engine(), "/extract", Some(multipart_field("image", "text"))).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({"error": "No image file provided"}));
    }

    #[actix_web::test]
    async fn test_empty_filename_returns_400() {
        let form = multipart_image(Some(""), b"fake-image-bytes");
        let (status, body) = post(FakeGate::Allow, engine(), "/extract", Some(form)).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({"error": "No selected file"}));
    }

    #[actix_web::test]
    async fn test_unsupported_language_returns_400() {
        let form = multipart_image(Some("img.png"), b"fake-image-bytes");
        let (status, body) = post(FakeGate::Allow, engine(), "/extract?lang=zzz", Some(form)).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({"error": "Unsupported OCR language. Allowed: tel, kan, hin, eng."}));
    }

    #[actix_web::test]
    async fn test_success_uses_selected_language() {
        let engine = Arc::new(ScriptedEngine::new(" hello "));
        let form = multipart_image(Some("img.png"), b"fake-image-bytes");
        let (status, body) = post(FakeGate::Allow, engine.clone(), "/extract?lang=kan", Some(form)).await;

        assert_eq!(status, 200);
        assert_eq!(body, json!({"status": "success", "text": "hello"}));
        assert_eq!(engine.languages.lock().as_slice(), ["kan"]);
    }

    #[actix_web::test]
    async fn test_default_language_when_not_selected() {
        let engine = Arc::new(ScriptedEngine::new("x"));
        let form = multipart_image(Some("img.png"), b"fake-image-bytes");
        let (status, _) = post(FakeGate::Allow, engine.clone(), "/extract?lang=", Some(form)).await;

        assert_eq!(status, 200);
        assert_eq!(engine.languages.lock().as_slice(), ["tel"]);
    }

    #[actix_web::test]
    async fn test_repeated_lang_checks_quota_first() {
        let form = multipart_image(Some("img.png"), b"fake-image-bytes");
        let (status, body) =
            post(FakeGate::Deny, engine(), "/extract?lang=kan&lang=hin", Some(form)).await;
        assert_eq!(status, 429);
        assert_eq!(body, json!({"error": "Daily quota exceeded. Please try again tomorrow."}));
    }

    #[actix_web::test]
    async fn test_repeated_lang_uses_first_value() {
        let engine = Arc::new(ScriptedEngine::new("ok"));
        let form = multipart_image(Some("img.png"), b"fake-image-bytes");
        let (status, _) =
            post(FakeGate::Allow, engine.clone(), "/extract?lang=KAN&lang=zzz", Some(form)).await;

        assert_eq!(status, 200);
        assert_eq!(engine.languages.lock().as_slice(), ["kan"]);
    }

    #[actix_web::test]
    async fn test_quota_exceeded_returns_429() {
        let form = multipart_image(Some("img.png"), b"fake-image-bytes");
        let (status, body) = post(FakeGate::Deny, engine(), "/extract", Some(form)).await;
        assert_eq!(status, 429);
        assert_eq!(body, json!({"error": "Daily quota exceeded. Please try again tomorrow."}));
    }

    #[actix_web::test]
    async fn test_store_failure_returns_500() {
        let form = multipart_image(Some("img.png"), b"fake-image-bytes");
        let (status, body) = post(FakeGate::Down, engine(), "/extract", Some(form)).await;
        assert_eq!(status, 500);
        assert_eq!(body, json!({"error": "Service temporarily unavailable"}));
    }

    #[actix_web::test]
    async fn test_quota_checked_before_validation() {
        let (status, _) = post(FakeGate::Deny, engine(), "/extract", None).await;
        assert_eq!(status, 429);
    }

    #[actix_web::test]
    async fn test_disabled_quota_skips_gate() {
        let mut settings = local_settings();
        settings.quota.disabled = true;
        let state = state(settings, Arc::new(FakeGate::Down), Arc::new(AnyDecoder), engine());
        let app = test::init_service(app(state)).await;

        let (content_type, payload) = multipart_image(Some("img.png"), b"fake-image-bytes");
        let req = test::TestRequest::post()
            .uri("/extract")
            .insert_header(("content-type", content_type))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    #[actix_web::test]
    async fn test_decode_failure_passes_message_through() {
        let state = state(
            local_settings(),
            Arc::new(FakeGate::Allow),
            Arc::new(crate::engine::ImageCrateDecoder),
            engine(),
        );
        let app = test::init_service(app(state)).await;

        let (content_type, payload) = multipart_image(Some("img.png"), b"fake-image-bytes");
        let req = test::TestRequest::post()
            .uri("/extract")
            .insert_header(("content-type", content_type))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);
        let body: Value = test::read_body_json(resp).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("cannot identify image file"), "{}", message);
    }

    #[actix_web::test]
    async fn test_oversized_upload_returns_400() {
        let mut settings = local_settings();
        settings.ocr.max_upload_bytes = 8;
        let state = state(settings, Arc::new(FakeGate::Allow), Arc::new(AnyDecoder), engine());
        let app = test::init_service(app(state)).await;

        let (content_type, payload) = multipart_image(Some("img.png"), b"0123456789abcdef");
        let req = test::TestRequest::post()
            .uri("/extract")
            .insert_header(("content-type", content_type))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_get_on_extract_is_not_found() {
        let state = state(local_settings(), Arc::new(FakeGate::Allow), Arc::new(AnyDecoder), engine());
        let app = test::init_service(app(state)).await;

        let req = test::TestRequest::get().uri("/extract").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "Not found"}));
    }
}
