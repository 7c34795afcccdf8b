//! Lipi OCR
//!
//! Text extraction API for Telugu, Kannada, Hindi and English images using
//! Rust + Actix-Web, guarded by a daily global request quota kept in a
//! transactional store.

use actix_web::{web, App, HttpServer, middleware};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

mod api;
mod config;
mod db;
mod domain;
mod engine;
mod extraction;
mod quota;

#[cfg(test)]
mod test_support;

use crate::config::{QuotaStoreKind, Settings};
use crate::db::{DbPool, MemoryUsageStore, PgUsageStore, UsageStore};
use crate::domain::OcrLanguage;
use crate::engine::{ImageCrateDecoder, TesseractEngine};
use crate::extraction::Extractor;
use crate::quota::{StoreQuotaGate, SystemClock};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    pub extractor: Extractor,
}

/// Build the usage store selected in settings
async fn usage_store(settings: &Settings) -> anyhow::Result<Arc<dyn UsageStore>> {
    match settings.quota.store {
        QuotaStoreKind::Memory => {
            warn!("Quota counter is process-local; do not run more than one instance with quota.store = memory");
            Ok(Arc::new(MemoryUsageStore::new()))
        }
        QuotaStoreKind::Postgres => {
            let pool = DbPool::new(&settings.database.url, settings.database.max_connections)
                .context("Failed to create database pool")?;

            // Startup continues without the database; quota checks fail closed until it answers
            // and the store creates its table on the first call that reaches it.
            if let Err(e) = pool.test_connection().await {
                warn!("Database connection test failed: {}. Quota checks will fail until it recovers.", e);
            }

            Ok(Arc::new(PgUsageStore::new(pool)))
        }
    }
}

/// Warn about allow-listed languages the local tesseract cannot serve
async fn check_language_packs(engine: &TesseractEngine, default_language: &str) {
    match engine.installed_languages().await {
        Ok(installed) => {
            let wanted = OcrLanguage::ALL
                .iter()
                .map(|l| l.code())
                .chain(default_language.split('+'));
            for code in wanted {
                if !installed.iter().any(|i| i == code) {
                    warn!(language = code, "Tesseract language pack not installed");
                }
            }
            info!("Tesseract languages available: {}", installed.join(", "));
        }
        Err(e) => warn!("Could not query tesseract languages: {}", e),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lipi_ocr=info".parse()?)
                .add_directive("actix_web=info".parse()?)
        )
        .json()
        .init();

    let settings = Settings::load().context("Failed to load configuration")?;
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);

    info!(
        "Starting Lipi OCR v{} on {}",
        env!("CARGO_PKG_VERSION"),
        bind_addr
    );

    let store = usage_store(&settings).await?;
    if !settings.quota.disabled {
        match store.get(&settings.quota.counter_key).await {
            Ok(Some(counter)) => info!(date = %counter.date, count = counter.count, "Current usage counter"),
            Ok(None) => info!("No usage recorded yet"),
            Err(e) => warn!("Could not read usage counter: {}", e),
        }
    }

    let gate = StoreQuotaGate::new(store, Arc::new(SystemClock), settings.quota.daily_limit)
        .with_key(settings.quota.counter_key.clone())
        .with_timeout(Duration::from_millis(settings.quota.timeout_ms));

    if settings.quota.disabled {
        warn!("DISABLE_QUOTA is set: requests are not metered");
    } else {
        info!(
            daily_limit = gate.daily_limit(),
            store = ?settings.quota.store,
            "Daily quota enabled"
        );
    }

    let engine = TesseractEngine::new(
        settings.ocr.tesseract_path.clone(),
        Duration::from_secs(settings.ocr.timeout_secs),
    );
    check_language_packs(&engine, &settings.ocr.language).await;

    let extractor = Extractor::new(Arc::new(gate), Arc::new(ImageCrateDecoder), Arc::new(engine))
        .with_default_language(settings.ocr.language.clone())
        .with_quota_disabled(settings.quota.disabled);

    let workers = settings.server.workers.unwrap_or_else(|| num_cpus::get() * 2);
    let frontend = settings.frontend.clone();

    // Create shared application state
    let app_state = web::Data::new(AppState {
        settings,
        extractor,
    });

    // Configure and start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Service", "lipi-ocr"))
                    .add(("X-Version", env!("CARGO_PKG_VERSION")))
            )
            .configure(|cfg| api::configure_routes(cfg, &frontend))
    })
    .workers(workers)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}
