//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use witness_core::{
  review::{ReviewError, ReviewIssue},
  store::StoreError,
};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Well-formed input that breaks a domain rule.
  #[error("{0}")]
  Unprocessable(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("review blocked by {} issue(s)", .0.len())]
  ReviewBlocked(Vec<ReviewIssue>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error, surfacing any domain error it carries.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.as_core() {
      Some(core) => classify(core).unwrap_or_else(|| Self::Store(Box::new(e))),
      None => Self::Store(Box::new(e)),
    }
  }
}

/// The API error for a domain error, or `None` if it is an internal fault.
fn classify(e: &witness_core::Error) -> Option<ApiError> {
  use witness_core::Error as E;

  let message = e.to_string();
  Some(match e {
    _ if e.is_not_found() => ApiError::NotFound(message),
    E::DuplicateAttachment { .. } | E::NotPromotable { .. } | E::SourceInUse { .. } => {
      ApiError::Conflict(message)
    }
    E::UnknownFieldKey(_) | E::InvalidFieldValue { .. } => ApiError::BadRequest(message),
    E::UnknownSource { .. }
    | E::PositionOutOfRange { .. }
    | E::IncompleteTimelineOrder
    | E::MissingDeletionReason
    | E::SessionClosed
    | E::NoSuchCapture(_) => ApiError::Unprocessable(message),
    _ => return None,
  })
}

impl From<witness_core::Error> for ApiError {
  fn from(e: witness_core::Error) -> Self {
    classify(&e).unwrap_or_else(|| Self::Store(Box::new(e)))
  }
}

impl From<ReviewError> for ApiError {
  fn from(e: ReviewError) -> Self {
    match e {
      ReviewError::Terminal(_) => Self::Conflict(e.to_string()),
      ReviewError::Blocked(issues) => Self::ReviewBlocked(issues),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::ReviewBlocked(issues) => {
        // Permission issues need a different reviewer; everything else is
        // cleared by editing the incident.
        let status = if issues.iter().any(ReviewIssue::is_permission) {
          StatusCode::FORBIDDEN
        } else {
          StatusCode::UNPROCESSABLE_ENTITY
        };
        let body = json!({ "error": self.to_string(), "issues": issues });
        return (status, Json(body)).into_response();
      }
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
