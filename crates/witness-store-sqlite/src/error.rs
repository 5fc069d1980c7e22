//! Error type for `witness-store-sqlite`.

use thiserror::Error;
use witness_core::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] witness_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored discriminant that no longer parses.
  #[error("cannot decode column: {0}")]
  Decode(String),
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&witness_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
