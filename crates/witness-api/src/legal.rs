//! Static legal reference data, one entry per violation type.

use axum::{Json, extract::Path};
use strum::IntoEnumIterator;
use witness_core::{
  legal::{LegalReference, reference},
  tags::ViolationKind,
};

/// `GET /legal`
pub async fn list() -> Json<Vec<&'static LegalReference>> {
  Json(ViolationKind::iter().map(reference).collect())
}

/// `GET /legal/{violation_type}`; an unknown type is rejected by the path
/// extractor with 400.
pub async fn get_one(Path(kind): Path<ViolationKind>) -> Json<&'static LegalReference> {
  Json(reference(kind))
}
