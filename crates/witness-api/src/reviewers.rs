//! Handlers for `/reviewers` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use witness_core::{
  review::{Reviewer, Role},
  store::IncidentStore,
};

use crate::{error::ApiError, review::require_reviewer};

/// `GET /reviewers`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Reviewer>>, ApiError>
where
  S: IncidentStore,
{
  let reviewers = store.list_reviewers().await.map_err(ApiError::from_store)?;
  Ok(Json(reviewers))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
  #[serde(default)]
  pub role: Role,
}

/// `POST /reviewers`, body: `{"name":"Ana","role":"analyst"}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
{
  let name = body.name.trim();
  if name.is_empty() {
    return Err(ApiError::BadRequest("reviewer name must not be empty".into()));
  }
  let reviewer = store
    .add_reviewer(name.to_owned(), body.role)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(reviewer)))
}

/// `GET /reviewers/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Reviewer>, ApiError>
where
  S: IncidentStore,
{
  require_reviewer(&*store, id).await.map(Json)
}
