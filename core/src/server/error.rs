use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Result type of the review handlers
pub type ReviewResult<T> = std::result::Result<T, ReviewError>;

/// Errors returned to the browser by the review server
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Invalid page index")]
    PageNotFound,

    #[error("File ID not found")]
    FileIdNotFound,

    #[error("File not found on disk: {0}")]
    FileMissing(String),

    #[error("Missing filename or status")]
    MissingField,

    #[error("{0}")]
    InvalidStatus(String),

    #[error("Internal server error")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ResponseError for ReviewError {
    fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::PageNotFound | ReviewError::FileIdNotFound | ReviewError::FileMissing(_) => {
                StatusCode::NOT_FOUND
            }
            ReviewError::MissingField | ReviewError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            ReviewError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ReviewError::PageNotFound => HttpResponse::NotFound()
                .content_type("text/html; charset=utf-8")
                .body(format!("<h1>{}</h1>", self)),
            ReviewError::FileIdNotFound | ReviewError::FileMissing(_) => {
                HttpResponse::NotFound().body(self.to_string())
            }
            _ => HttpResponse::build(self.status_code()).json(ErrorResponse {
                error: self.to_string(),
            }),
        }
    }
}

impl From<crate::error::QcError> for ReviewError {
    fn from(e: crate::error::QcError) -> Self {
        match e {
            crate::error::QcError::InvalidStatus(_) => ReviewError::InvalidStatus(e.to_string()),
            other => ReviewError::Internal(other.to_string()),
        }
    }
}
