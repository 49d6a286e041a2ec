use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{DOCTYPE, html};
use std::path::PathBuf;

use crate::chat::ChatError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Username already exists.")]
    DuplicateUser,
    #[error("Incorrect username or password.")]
    InvalidCredentials,
    #[error("Please fill all details.")]
    IncompleteForm,
    #[error("Resume must be a PDF or DOCX file (got {0}).")]
    UnsupportedResume(String),
    #[error("Not found")]
    NotFound,
    #[error("Forbidden")]
    Forbidden,
    #[error("Invalid form data: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error("Malformed data in {}: {source}", path.display())]
    MalformedData {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Chat service error: {0}")]
    ExternalApi(#[from] ChatError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Errors a page shows inline as a warning instead of failing the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::DuplicateUser
                | AppError::InvalidCredentials
                | AppError::IncompleteForm
                | AppError::UnsupportedResume(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title, message) = match &self {
            e if e.is_recoverable() => (
                StatusCode::BAD_REQUEST,
                "400 Bad Request",
                e.to_string(),
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "404 Not Found",
                "The page you requested could not be found.".to_string(),
            ),
            AppError::Multipart(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "413 Payload Too Large",
                "The uploaded file is larger than this server accepts.".to_string(),
            ),
            AppError::Multipart(e) => (
                StatusCode::BAD_REQUEST,
                "400 Bad Request",
                format!("The submitted form could not be read: {e}"),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "403 Forbidden",
                "This page is only available to administrators.".to_string(),
            ),
            AppError::ExternalApi(e) => {
                tracing::error!("Chat service error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "502 Bad Gateway",
                    format!("The assistant could not answer: {e}"),
                )
            }
            AppError::MalformedData { path, source } => {
                tracing::error!("Malformed data in {}: {}", path.display(), source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "500 Internal Server Error",
                    "Stored data could not be read.".to_string(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "500 Internal Server Error",
                    "An internal server error occurred.".to_string(),
                )
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "500 Internal Server Error",
                    "An internal server error occurred.".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "500 Internal Server Error",
                    msg.clone(),
                )
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "500 Internal Server Error",
                self.to_string(),
            ),
        };

        let body = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (title) }
                }
                body {
                    h1 { (title) }
                    p { (message) }
                    p { a href="/" { "Back to TalentScout" } }
                }
            }
        };

        (status, Html(body.into_string())).into_response()
    }
}
