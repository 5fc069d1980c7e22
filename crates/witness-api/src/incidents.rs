//! Handlers for `/incidents` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/incidents` | Optional `?status=pending\|first_review\|...&limit=&offset=` |
//! | `POST` | `/incidents` | Body: incident fields |
//! | `GET`  | `/incidents/{id}` | 404 if not found |
//! | `PUT`  | `/incidents/{id}` | Body: incident fields; last write wins |
//! | `GET`  | `/incidents/{id}/verify-field` | Dossier, field → quote map, validation issues |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Serialize;
use witness_core::{
  dossier::Dossier,
  field::FieldKey,
  incident::{Incident, IncidentFields},
  linking::FieldQuoteMap,
  review::{ReviewIssue, evidentiary_issues},
  store::{IncidentQuery, IncidentStore},
};

use crate::error::ApiError;

// ─── Lookups shared by other handlers ────────────────────────────────────────

pub(crate) async fn require_incident<S: IncidentStore>(
  store: &S,
  id: i64,
) -> Result<Incident, ApiError> {
  store
    .get_incident(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| witness_core::Error::IncidentNotFound(id).into())
}

pub(crate) async fn load_dossier<S: IncidentStore>(
  store: &S,
  id: i64,
) -> Result<Dossier, ApiError> {
  store
    .dossier(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| witness_core::Error::IncidentNotFound(id).into())
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /incidents[?status=<status>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(query): Query<IncidentQuery>,
) -> Result<Json<Vec<Incident>>, ApiError>
where
  S: IncidentStore,
{
  let incidents = store
    .list_incidents(&query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(incidents))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /incidents`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(fields): Json<IncidentFields>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
{
  let incident = store
    .create_incident(fields)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(id = incident.id, incident_id = %incident.incident_id, "incident created");
  Ok((StatusCode::CREATED, Json(incident)))
}

// ─── Get / update ────────────────────────────────────────────────────────────

/// `GET /incidents/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Incident>, ApiError>
where
  S: IncidentStore,
{
  require_incident(&*store, id).await.map(Json)
}

/// `PUT /incidents/{id}`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(fields): Json<IncidentFields>,
) -> Result<Json<Incident>, ApiError>
where
  S: IncidentStore,
{
  let incident = store
    .update_incident(id, fields)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(incident))
}

// ─── Verification view ───────────────────────────────────────────────────────

/// Everything the verification screen needs in one response.
#[derive(Debug, Serialize)]
pub struct VerifyFieldView {
  #[serde(flatten)]
  pub dossier:           Dossier,
  pub field_quote_map:   FieldQuoteMap,
  pub fields_with_data:  Vec<FieldKey>,
  /// Problems that block review regardless of the reviewer's checklist.
  pub validation_issues: Vec<ReviewIssue>,
}

/// `GET /incidents/{id}/verify-field`
pub async fn verify_field<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<VerifyFieldView>, ApiError>
where
  S: IncidentStore,
{
  let dossier = load_dossier(&*store, id).await?;
  Ok(Json(VerifyFieldView {
    field_quote_map: dossier.field_quote_map(),
    fields_with_data: dossier.fields_with_data(),
    validation_issues: evidentiary_issues(&dossier),
    dossier,
  }))
}
