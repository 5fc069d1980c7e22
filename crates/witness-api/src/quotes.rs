//! Quote verification and quote ↔ field linking.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `PATCH` | `/incidents/{id}/quotes` | Body: `{"quote_id":3,"verified":true}` |
//! | `POST`  | `/incidents/{id}/quotes/link` | Body: `{"field":"victim_name","quote_id":3}` |
//! | `POST`  | `/incidents/{id}/quotes/unlink` | Body: `{"field":"victim_name"}` |
//! | `GET`   | `/incidents/{id}/quotes/suggest` | `?text=<typed value>` |
//!
//! Link and unlink respond with the incident's field → quote map.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use witness_core::{
  evidence::Quote,
  field::FieldKey,
  linking::{self, FieldQuoteMap},
  record::{AttachmentKind, Persisted},
  store::IncidentStore,
};

use crate::{error::ApiError, incidents::require_incident};

async fn load_quotes<S: IncidentStore>(
  store: &S,
  incident_id: i64,
) -> Result<Vec<Persisted<Quote>>, ApiError> {
  require_incident(store, incident_id).await?;
  store
    .list_attachments::<Quote>(incident_id)
    .await
    .map_err(ApiError::from_store)
}

/// Write back the quotes listed in `changed`.
async fn persist_changed<S: IncidentStore>(
  store: &S,
  quotes: &[Persisted<Quote>],
  changed: &[i64],
) -> Result<(), ApiError> {
  if changed.is_empty() {
    return Ok(());
  }
  let records = quotes
    .iter()
    .filter(|q| changed.contains(&q.id))
    .cloned()
    .collect();
  store
    .update_attachments(records)
    .await
    .map_err(ApiError::from_store)
}

// ─── Verified flag ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifiedBody {
  pub quote_id: i64,
  pub verified: bool,
}

/// `PATCH /incidents/{id}/quotes`
pub async fn set_verified<S>(
  State(store): State<Arc<S>>,
  Path(incident_id): Path<i64>,
  Json(body): Json<VerifiedBody>,
) -> Result<Json<Persisted<Quote>>, ApiError>
where
  S: IncidentStore,
{
  let mut quote = store
    .get_attachment::<Quote>(incident_id, body.quote_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| witness_core::Error::AttachmentNotFound {
      kind: AttachmentKind::Quote,
      id: body.quote_id,
      incident_id,
    })?;
  quote.value.verified = body.verified;
  let quote = store
    .update_attachment(incident_id, quote.id, quote.value)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(quote))
}

// ─── Link / unlink ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LinkBody {
  pub field:    FieldKey,
  pub quote_id: i64,
}

/// `POST /incidents/{id}/quotes/link`
pub async fn link<S>(
  State(store): State<Arc<S>>,
  Path(incident_id): Path<i64>,
  Json(body): Json<LinkBody>,
) -> Result<Json<FieldQuoteMap>, ApiError>
where
  S: IncidentStore,
{
  let mut quotes = load_quotes(&*store, incident_id).await?;
  let changed = linking::link_quote(&mut quotes, body.field, body.quote_id)?;
  persist_changed(&*store, &quotes, &changed).await?;
  tracing::debug!(incident_id, field = %body.field, quote_id = body.quote_id, "field linked");
  Ok(Json(FieldQuoteMap::from_quotes(&quotes)))
}

#[derive(Debug, Deserialize)]
pub struct UnlinkBody {
  pub field: FieldKey,
}

/// `POST /incidents/{id}/quotes/unlink`
pub async fn unlink<S>(
  State(store): State<Arc<S>>,
  Path(incident_id): Path<i64>,
  Json(body): Json<UnlinkBody>,
) -> Result<Json<FieldQuoteMap>, ApiError>
where
  S: IncidentStore,
{
  let mut quotes = load_quotes(&*store, incident_id).await?;
  let changed = linking::unlink_quote(&mut quotes, body.field);
  persist_changed(&*store, &quotes, &changed).await?;
  Ok(Json(FieldQuoteMap::from_quotes(&quotes)))
}

// ─── Suggestions ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
  #[serde(default)]
  pub text: String,
}

/// `GET /incidents/{id}/quotes/suggest?text=`
pub async fn suggest<S>(
  State(store): State<Arc<S>>,
  Path(incident_id): Path<i64>,
  Query(params): Query<SuggestParams>,
) -> Result<Json<Vec<Persisted<Quote>>>, ApiError>
where
  S: IncidentStore,
{
  let quotes = load_quotes(&*store, incident_id).await?;
  let hits = linking::suggest_quotes(&quotes, &params.text)
    .into_iter()
    .cloned()
    .collect();
  Ok(Json(hits))
}
