use axum::http::StatusCode;
use axum::http::header::InvalidHeaderValue;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

/// Application error type for web handlers.
///
/// Only infrastructure failures end up here. Authorization failures, missing products and
/// rejected forms are answered with redirects by the handlers themselves.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Internal Server Error</h1><p>Something went wrong.</p>"),
        )
            .into_response()
    }
}
