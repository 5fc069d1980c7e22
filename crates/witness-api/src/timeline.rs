//! `PUT /incidents/{id}/timeline/reorder`, body: `{"from":3,"to":0}`.
//!
//! Positions are zero-based indexes into the current order. The whole new
//! order is written in one batch.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Deserialize;
use witness_core::{
  evidence::TimelineEntry,
  record::Persisted,
  store::IncidentStore,
  timeline,
};

use crate::{error::ApiError, incidents::require_incident};

#[derive(Debug, Deserialize)]
pub struct ReorderBody {
  pub from: usize,
  pub to:   usize,
}

pub async fn reorder<S>(
  State(store): State<Arc<S>>,
  Path(incident_id): Path<i64>,
  Json(body): Json<ReorderBody>,
) -> Result<Json<Vec<Persisted<TimelineEntry>>>, ApiError>
where
  S: IncidentStore,
{
  require_incident(&*store, incident_id).await?;
  let mut entries = store
    .list_attachments::<TimelineEntry>(incident_id)
    .await
    .map_err(ApiError::from_store)?;
  timeline::reorder(&mut entries, body.from, body.to)?;

  let entries = store
    .reorder_timeline(incident_id, timeline::order_of(&entries))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(entries))
}
