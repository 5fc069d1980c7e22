//! Error types for `witness-core`.

use thiserror::Error;

use crate::{incident::IncidentField, record::AttachmentKind};

#[derive(Debug, Error)]
pub enum Error {
  #[error("incident not found: {0}")]
  IncidentNotFound(i64),

  #[error("{kind} {id} not found on incident {incident_id}")]
  AttachmentNotFound {
    kind:        AttachmentKind,
    id:          i64,
    incident_id: i64,
  },

  #[error("incident {incident_id} already has a {kind} entry for {key:?}")]
  DuplicateAttachment {
    kind:        AttachmentKind,
    key:         String,
    incident_id: i64,
  },

  #[error("source {source_id} does not belong to incident {incident_id}")]
  UnknownSource { source_id: i64, incident_id: i64 },

  #[error("source {source_id} is still cited by {quotes} quote(s)")]
  SourceInUse { source_id: i64, quotes: u32 },

  #[error("guest submission not found: {0}")]
  GuestSubmissionNotFound(i64),

  #[error("guest submission {id} cannot be promoted: {reason}")]
  NotPromotable { id: i64, reason: &'static str },

  #[error("reviewer not found: {0}")]
  ReviewerNotFound(i64),

  #[error("unknown field key: {0:?}")]
  UnknownFieldKey(String),

  #[error("invalid value {value:?} for field {field}")]
  InvalidFieldValue { field: IncidentField, value: String },

  #[error("timeline position {position} is out of range for {len} entries")]
  PositionOutOfRange { position: usize, len: usize },

  #[error("timeline order must list every entry of the incident exactly once")]
  IncompleteTimelineOrder,

  #[error("a deletion reason is required")]
  MissingDeletionReason,

  #[error("capture session is closed")]
  SessionClosed,

  #[error("no captured item at index {0}")]
  NoSuchCapture(usize),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Whether the error reports a missing entity rather than a rule violation.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::IncidentNotFound(_)
        | Self::AttachmentNotFound { .. }
        | Self::GuestSubmissionNotFound(_)
        | Self::ReviewerNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
