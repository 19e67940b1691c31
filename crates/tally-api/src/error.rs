//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The upstream source could not be fetched.
  #[error("bad gateway: {0}")]
  BadGateway(String),

  #[error("internal error: {0}")]
  Internal(#[source] tally_pipeline::Error),
}

impl From<tally_pipeline::Error> for ApiError {
  fn from(e: tally_pipeline::Error) -> Self {
    use tally_pipeline::Error as P;
    match e {
      P::Core(tally_core::Error::UnknownTable(name)) => {
        Self::NotFound(format!("unknown table {name:?}"))
      }
      P::SourceFormat(e) => Self::BadRequest(e.to_string()),
      P::SourceUnavailable(e) => Self::BadGateway(e.to_string()),
      other => Self::Internal(other),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::BadGateway(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
