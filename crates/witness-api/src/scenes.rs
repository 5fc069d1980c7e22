//! `POST /scenes/resolve`, body: `{"scene":{...},"records":[...]}`.
//!
//! Without `records`, the scene is resolved against every verified incident.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use witness_core::{
  incident::{Incident, VerificationStatus},
  scrolly::{Record, Scene, resolve_scene},
  store::{IncidentQuery, IncidentStore},
};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub scene:   Scene,
  #[serde(default)]
  pub records: Option<Vec<Record>>,
}

pub async fn resolve<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<ResolveBody>,
) -> Result<Response, ApiError>
where
  S: IncidentStore,
{
  let records = match body.records {
    Some(records) => records,
    None => published_records(&*store).await?,
  };
  Ok(Json(resolve_scene(&body.scene, &records)).into_response())
}

async fn published_records<S: IncidentStore>(store: &S) -> Result<Vec<Record>, ApiError> {
  let query = IncidentQuery { status: Some(VerificationStatus::Verified), ..Default::default() };
  let incidents = store
    .list_incidents(&query)
    .await
    .map_err(ApiError::from_store)?;
  incidents
    .iter()
    .map(Incident::to_record)
    .collect::<Result<_, _>>()
    .map_err(ApiError::from)
}
