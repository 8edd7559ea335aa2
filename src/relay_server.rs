//! HTTP upload relay served by `banana relay`.
//!
//! Accepts `{ base64 }` from browser clients, strips any data URI prefix and
//! forwards the payload through an [`UploadRelay`] host chain.

use std::sync::LazyLock;

use actix_cors::Cors;
use actix_web::http::Method;
use actix_web::{web, App, HttpResponse, HttpServer};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::BananaError;
use crate::upload::UploadRelay;

/// Upload route.
pub const UPLOAD_PATH: &str = "/api/upload";

const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const ALLOWED_METHODS: [&str; 6] = ["GET", "OPTIONS", "PATCH", "DELETE", "POST", "PUT"];

const ALLOWED_HEADERS: [&str; 9] = [
    "X-CSRF-Token",
    "X-Requested-With",
    "Accept",
    "Accept-Version",
    "Content-Length",
    "Content-MD5",
    "Content-Type",
    "Date",
    "X-Api-Version",
];

static DATA_URI_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:image/\w+;base64,").expect("valid data URI regex"));

#[derive(Debug, Default, Deserialize)]
struct UploadBody {
    base64: Option<String>,
}

fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(ALLOWED_METHODS)
        .allowed_headers(ALLOWED_HEADERS)
        .supports_credentials()
}

/// Register the relay routes on an app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_BODY_BYTES)).service(
        web::resource(UPLOAD_PATH)
            .route(web::post().to(upload))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::to(method_not_allowed)),
    );
}

async fn upload(relay: web::Data<UploadRelay>, body: web::Bytes) -> HttpResponse {
    let payload = serde_json::from_slice::<UploadBody>(&body)
        .unwrap_or_default()
        .base64
        .filter(|b| !b.trim().is_empty());
    let Some(payload) = payload else {
        return HttpResponse::BadRequest()
            .json(json!({"success": false, "message": "Missing base64 data"}));
    };

    let data = DATA_URI_PREFIX.replace(payload.trim(), "");
    info!(bytes = data.len(), "relaying upload");
    match relay.upload(&data).await {
        Ok(url) => HttpResponse::Ok().json(json!({"success": true, "url": url})),
        Err(e) => {
            warn!(error = %e, "relay upload failed");
            HttpResponse::InternalServerError()
                .json(json!({"success": false, "message": e.to_string()}))
        }
    }
}

async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(json!({"message": "Method Not Allowed"}))
}

/// Serve the relay on `bind` until shutdown.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run(bind: &str, relay: UploadRelay) -> Result<(), BananaError> {
    let relay = web::Data::new(relay);
    let hosts: Vec<String> = relay.host_names().map(str::to_string).collect();
    info!(%bind, ?hosts, "starting upload relay");

    let server = HttpServer::new(move || {
        App::new().app_data(relay.clone()).wrap(cors()).configure(configure)
    })
    .bind(bind)
    .map_err(|e| BananaError::Config(format!("Failed to bind {bind}: {e}")))?
    .run();

    eprintln!("Upload relay listening on http://{bind}{UPLOAD_PATH}");
    server.await?;
    info!("upload relay stopped");
    Ok(())
}
