//! `POST /check-duplicates`, body: `{"victimName":"...","dateOfDeath":"2026-01-01","facility":"...","sourceUrls":[...]}`.
//!
//! Always answers 200: a failing lookup is reported as "no duplicates".

use std::sync::Arc;

use axum::{Json, extract::State};
use witness_core::{
  duplicate::{DuplicateQuery, DuplicateReport, check_duplicates},
  store::{IncidentStore, StoreLookup},
};

pub async fn check<S>(
  State(store): State<Arc<S>>,
  Json(query): Json<DuplicateQuery>,
) -> Json<DuplicateReport>
where
  S: IncidentStore,
{
  Json(check_duplicates(&StoreLookup(&*store), &query).await)
}
