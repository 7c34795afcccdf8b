//! API module - HTTP routes and handlers

pub mod handlers;
pub mod openapi;

use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::openapi::ApiDoc;
use crate::config::FrontendSettings;

/// Configure all routes
///
/// The frontend bundle goes last; it claims every path not routed above it.
pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend: &FrontendSettings) {
    cfg.service(
        web::resource("/extract")
            .route(web::post().to(handlers::extract::extract_text))
            .default_service(web::to(handlers::extract::extract_not_found))
    )
    .route("/extract/{tail:.*}", web::route().to(handlers::extract::extract_not_found))
    .route("/healthz", web::get().to(handlers::health::health_check))
    .route("/health", web::get().to(handlers::health::health_check))
    // Swagger UI and OpenAPI spec
    .service(
        SwaggerUi::new("/swagger-ui/{_:.*}")
            .url("/api-docs/openapi.json", ApiDoc::openapi())
    );

    handlers::frontend::configure(cfg, frontend.dist.as_deref());
}
