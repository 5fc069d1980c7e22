//! Review submission and rejection.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/incidents/{id}/review` | Body: `{"user_id":1,"checklist":{...}}`; 422 with `issues` when blocked, 403 on a reviewer lock or a viewer |
//! | `POST` | `/incidents/{id}/reject` | Body: `{"user_id":1,"reason":"..."}`; 403 for a viewer |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use witness_core::{
  incident::Incident,
  review::{self, ReviewChecklist, Reviewer, Transition},
  store::IncidentStore,
};

use crate::{
  error::ApiError,
  incidents::{load_dossier, require_incident},
};

pub(crate) async fn require_reviewer<S: IncidentStore>(
  store: &S,
  id: i64,
) -> Result<Reviewer, ApiError> {
  store
    .get_reviewer(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| witness_core::Error::ReviewerNotFound(id).into())
}

// ─── Submit ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub user_id:   i64,
  #[serde(default)]
  pub checklist: ReviewChecklist,
}

#[derive(Debug, Serialize)]
pub struct ReviewOutcome {
  pub incident:   Incident,
  pub transition: Transition,
  pub message:    &'static str,
}

/// `POST /incidents/{id}/review`
pub async fn submit<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<ReviewOutcome>, ApiError>
where
  S: IncidentStore,
{
  let dossier = load_dossier(&*store, id).await?;
  let reviewer = require_reviewer(&*store, body.user_id).await?;

  let transition = match review::submit_review(&dossier, &body.checklist, &reviewer, Utc::now()) {
    Ok(t) => t,
    Err(e) => {
      tracing::warn!(incident = id, reviewer = reviewer.id, issues = e.issues().len(), "review refused: {e}");
      return Err(e.into());
    }
  };

  let mut incident = dossier.incident;
  transition.apply(&mut incident);
  let incident = store
    .save_review_state(incident)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(
    incident = id,
    reviewer = reviewer.id,
    from = %transition.from,
    to = %transition.to,
    "review accepted"
  );
  Ok(Json(ReviewOutcome { message: transition.message(), incident, transition }))
}

// ─── Reject ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RejectBody {
  pub user_id: i64,
  #[serde(default)]
  pub reason:  String,
}

/// `POST /incidents/{id}/reject`
pub async fn reject<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(body): Json<RejectBody>,
) -> Result<Json<Incident>, ApiError>
where
  S: IncidentStore,
{
  if body.reason.trim().is_empty() {
    return Err(ApiError::Unprocessable("a rejection reason is required".into()));
  }
  let mut incident = require_incident(&*store, id).await?;
  let reviewer = require_reviewer(&*store, body.user_id).await?;

  review::reject(&mut incident, &reviewer, &body.reason, Utc::now())?;
  let incident = store
    .save_review_state(incident)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(incident = id, reviewer = reviewer.id, "incident rejected");
  Ok(Json(incident))
}
