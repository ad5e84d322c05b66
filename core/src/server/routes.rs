//! Review server routes

use super::error::{ReviewError, ReviewResult};
use super::ReviewSession;
use crate::types::QcStatus;
use actix_web::http::header;
use actix_web::{get, post, web, HttpResponse};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Registers the review routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(show_report)
        .service(qc_update)
        .service(get_image);
}

/// Body of `POST /qc_update`
#[derive(Debug, Deserialize)]
pub struct QcUpdateRequest {
    pub filename: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// Redirects to the first page
#[get("/")]
async fn index(session: web::Data<ReviewSession>) -> HttpResponse {
    if session.is_empty() {
        return HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body("<h1>No reports found.</h1>");
    }
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/report/0"))
        .finish()
}

/// Shows one report page
#[get("/report/{id}")]
async fn show_report(
    session: web::Data<ReviewSession>,
    path: web::Path<usize>,
) -> ReviewResult<HttpResponse> {
    let html = session
        .render_page(path.into_inner())
        .ok_or(ReviewError::PageNotFound)?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

/// Stores a review decision in the ledger
#[post("/qc_update")]
async fn qc_update(
    session: web::Data<ReviewSession>,
    body: web::Json<QcUpdateRequest>,
) -> ReviewResult<HttpResponse> {
    let body = body.into_inner();
    let (filename, status) = match (body.filename, body.status) {
        (Some(filename), Some(status)) if !filename.is_empty() && !status.is_empty() => {
            (filename, status)
        }
        _ => return Err(ReviewError::MissingField),
    };
    let status = QcStatus::parse(&status)?;

    session.record(&filename, status, &body.notes).map_err(|e| {
        error!("Failed to update ledger for {}: {}", filename, e);
        ReviewError::from(e)
    })?;
    info!("{} marked {}", filename, status);

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "QC updated successfully",
    }))
}

/// Serves an artifact by file id
#[get("/get_image/{id}")]
async fn get_image(
    session: web::Data<ReviewSession>,
    path: web::Path<usize>,
) -> ReviewResult<HttpResponse> {
    let file = session
        .file(path.into_inner())
        .ok_or(ReviewError::FileIdNotFound)?
        .to_path_buf();
    let content_type = content_type_for(&file);

    let bytes = web::block(move || {
        std::fs::read(&file).map_err(|_| ReviewError::FileMissing(file.display().to_string()))
    })
    .await
    .map_err(|e| ReviewError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().content_type(content_type).body(bytes))
}

/// MIME type guessed from the file extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
