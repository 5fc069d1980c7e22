//! Uniform CRUD for the child collections of an incident.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/incidents/{id}/<kind>` | All records of the kind |
//! | `POST`   | `/incidents/{id}/<kind>` | Body: the record; 201 |
//! | `PUT`    | `/incidents/{id}/<kind>` | Body: the record plus `<kind>_id` |
//! | `DELETE` | `/incidents/{id}/<kind>` | Body: `{"<kind>_id": 3}`; 204 |
//!
//! `<kind>` is one of `agencies`, `violations`, `sources`, `media`, `quotes`
//! and `timeline`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
  routing::{MethodRouter, get},
};
use serde_json::{Map, Value};
use witness_core::{
  record::{Attachment, AttachmentKind, Persisted},
  store::IncidentStore,
};

use crate::{error::ApiError, incidents::require_incident};

/// The four CRUD methods for attachment type `A`.
pub fn routes<S, A>() -> MethodRouter<Arc<S>>
where
  S: IncidentStore + 'static,
  A: Attachment,
{
  get(list::<S, A>)
    .post(create::<S, A>)
    .put(update::<S, A>)
    .delete(remove::<S, A>)
}

/// Pull the record id out of a request body.
fn take_id(body: &mut Map<String, Value>, kind: AttachmentKind) -> Result<i64, ApiError> {
  let key = kind.id_key();
  body
    .remove(key)
    .and_then(|v| v.as_i64())
    .ok_or_else(|| ApiError::BadRequest(format!("request body must carry a numeric `{key}`")))
}

pub async fn list<S, A>(
  State(store): State<Arc<S>>,
  Path(incident_id): Path<i64>,
) -> Result<Json<Vec<Persisted<A>>>, ApiError>
where
  S: IncidentStore,
  A: Attachment,
{
  require_incident(&*store, incident_id).await?;
  let records = store
    .list_attachments::<A>(incident_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(records))
}

pub async fn create<S, A>(
  State(store): State<Arc<S>>,
  Path(incident_id): Path<i64>,
  Json(value): Json<A>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore,
  A: Attachment,
{
  let record = store
    .add_attachment(incident_id, value)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update<S, A>(
  State(store): State<Arc<S>>,
  Path(incident_id): Path<i64>,
  Json(mut body): Json<Map<String, Value>>,
) -> Result<Json<Persisted<A>>, ApiError>
where
  S: IncidentStore,
  A: Attachment,
{
  let id = take_id(&mut body, A::KIND)?;
  let value: A = serde_json::from_value(Value::Object(body))
    .map_err(|e| ApiError::BadRequest(format!("invalid {}: {e}", A::KIND)))?;
  let record = store
    .update_attachment(incident_id, id, value)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(record))
}

pub async fn remove<S, A>(
  State(store): State<Arc<S>>,
  Path(incident_id): Path<i64>,
  Json(mut body): Json<Map<String, Value>>,
) -> Result<StatusCode, ApiError>
where
  S: IncidentStore,
  A: Attachment,
{
  let id = take_id(&mut body, A::KIND)?;
  store
    .remove_attachment(incident_id, A::KIND, id)
    .await
    .map_err(ApiError::from_store)?;
  tracing::debug!(incident_id, kind = %A::KIND, id, "attachment removed");
  Ok(StatusCode::NO_CONTENT)
}
