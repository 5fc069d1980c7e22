//! Handlers for `/guest-submissions` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/guest-submissions` | Optional `?status=&includeDeleted=true` |
//! | `POST`  | `/guest-submissions` | Body: guest report; 409 when the duplicate gate blocks |
//! | `PATCH` | `/guest-submissions` | Body: `{"id":1,"status":"reviewed"}` or a soft delete with `deletion_reason` |
//! | `GET`   | `/guest-submissions/by-name` | `?name=&excludeIncidentId=` |
//! | `POST`  | `/guest-submissions/{id}/promote` | 201 with the new incident's dossier |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Serialize;
use witness_core::{
  duplicate::{DuplicateReport, check_duplicates},
  guest::{GuestReport, GuestSubmission, GuestSubmissionPatch},
  store::{GuestQuery, IncidentStore, StoreLookup},
};

use crate::error::ApiError;

/// `GET /guest-submissions`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(query): Query<GuestQuery>,
) -> Result<Json<Vec<GuestSubmission>>, ApiError>
where
  S: IncidentStore,
{
  let submissions = store
    .list_guest_submissions(&query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(submissions))
}

#[derive(Debug, Serialize)]
pub struct Created {
  pub submission: GuestSubmission,
  pub duplicates: DuplicateReport,
}

/// `POST /guest-submissions`
///
/// The duplicate gate runs first; a refused report is never stored.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(report): Json<GuestReport>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
{
  let duplicates = check_duplicates(&StoreLookup(&*store), &report.duplicate_query()).await;
  if !duplicates.allow_submission {
    let reason = duplicates.reason.unwrap_or_default();
    tracing::warn!(count = duplicates.guest_submission_count, "guest submission refused: {reason}");
    return Err(ApiError::Conflict(reason));
  }

  let submission = store
    .create_guest_submission(report)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(id = submission.id, "guest submission received");
  Ok((StatusCode::CREATED, Json(Created { submission, duplicates })))
}

/// `PATCH /guest-submissions`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Json(patch): Json<GuestSubmissionPatch>,
) -> Result<Json<GuestSubmission>, ApiError>
where
  S: IncidentStore,
{
  patch.validate()?;
  let submission = store
    .update_guest_submission(patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(submission))
}

/// `GET /guest-submissions/by-name?name=`
pub async fn by_name<S>(
  State(store): State<Arc<S>>,
  Query(query): Query<GuestQuery>,
) -> Result<Json<Vec<GuestSubmission>>, ApiError>
where
  S: IncidentStore,
{
  if query.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
    return Err(ApiError::BadRequest("`name` is required".into()));
  }
  let submissions = store
    .list_guest_submissions(&query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(submissions))
}

/// `POST /guest-submissions/{id}/promote`
pub async fn promote<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
{
  let dossier = store
    .promote_guest_submission(id)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(submission = id, incident = dossier.incident.id, "guest submission promoted");
  Ok((StatusCode::CREATED, Json(dossier)))
}
