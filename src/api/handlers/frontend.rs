//! Single-page-app bundle serving
//!
//! When a bundle with an `index.html` is configured, files are served from it
//! and unknown paths fall back to `index.html` for client-side routing.
//! Without one, every unrouted path answers 404 `Frontend not built`.

use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::{web, HttpResponse};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Bundle directory if it is usable
pub fn bundle_dir(dist: Option<&Path>) -> Option<PathBuf> {
    let dist = dist?;
    if dist.join("index.html").is_file() {
        Some(dist.to_path_buf())
    } else {
        warn!(dist = %dist.display(), "Frontend directory has no index.html, not serving it");
        None
    }
}

/// Mount the bundle, or the not-built fallback
///
/// Must be registered after every API route: the bundle matches any path.
pub fn configure(cfg: &mut web::ServiceConfig, dist: Option<&Path>) {
    match bundle_dir(dist) {
        Some(dir) => {
            info!(dist = %dir.display(), "Serving frontend bundle");
            let index = dir.join("index.html");
            cfg.service(
                Files::new("/", dir)
                    .index_file("index.html")
                    .default_handler(fn_service(move |req: ServiceRequest| {
                        let index = index.clone();
                        async move {
                            let (req, _) = req.into_parts();
                            let file = NamedFile::open_async(&index).await?;
                            let res = file.into_response(&req);
                            Ok(ServiceResponse::new(req, res))
                        }
                    })),
            );
        }
        None => {
            cfg.default_service(web::to(frontend_not_built));
        }
    }
}

pub async fn frontend_not_built() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Frontend not built" }))
}
