//! Attachments (the per-incident child records) and their persistence state.
//!
//! Every child record kind shares one storage shape: a typed payload owned by
//! an incident. Whether a record has been saved yet is expressed by
//! [`Stored`], never by a sentinel id.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  evidence::{Media, Quote, Source, TimelineEntry, normalize_url},
  tags::{Agency, Violation},
};

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// Discriminant of an attachment type. The string form is also the URL
/// segment under `/incidents/{id}/`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttachmentKind {
  Agency,
  Violation,
  Source,
  Quote,
  Media,
  Timeline,
}

impl AttachmentKind {
  /// Name of the id property in request bodies, e.g. `quote_id`.
  pub fn id_key(self) -> &'static str {
    match self {
      Self::Agency => "agency_id",
      Self::Violation => "violation_id",
      Self::Source => "source_id",
      Self::Quote => "quote_id",
      Self::Media => "media_id",
      Self::Timeline => "timeline_id",
    }
  }
}

/// A payload type that can be attached to an incident.
pub trait Attachment:
  Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
  const KIND: AttachmentKind;

  /// A key that must be unique among attachments of this kind on one
  /// incident, or `None` if duplicates are allowed.
  fn dedup_key(&self) -> Option<String> { None }

  /// The source this record cites, which must belong to the same incident.
  fn source_ref(&self) -> Option<i64> { None }

  /// Normalised URL used to match the record against duplicate queries.
  fn url_key(&self) -> Option<String> { None }

  /// Position within an ordered collection, for kinds that have one.
  fn sequence(&self) -> Option<u32> { None }

  fn set_sequence(&mut self, _position: u32) {}
}

impl Attachment for Agency {
  const KIND: AttachmentKind = AttachmentKind::Agency;

  fn dedup_key(&self) -> Option<String> { Some(self.agency.to_string()) }
}

impl Attachment for Violation {
  const KIND: AttachmentKind = AttachmentKind::Violation;

  fn dedup_key(&self) -> Option<String> { Some(self.violation_type.to_string()) }
}

impl Attachment for Source {
  const KIND: AttachmentKind = AttachmentKind::Source;

  fn url_key(&self) -> Option<String> { Some(normalize_url(&self.url)) }
}

impl Attachment for Quote {
  const KIND: AttachmentKind = AttachmentKind::Quote;

  fn source_ref(&self) -> Option<i64> { self.source_id }
}

impl Attachment for Media {
  const KIND: AttachmentKind = AttachmentKind::Media;
}

impl Attachment for TimelineEntry {
  const KIND: AttachmentKind = AttachmentKind::Timeline;

  fn sequence(&self) -> Option<u32> { Some(self.sequence_order) }

  fn set_sequence(&mut self, position: u32) { self.sequence_order = position; }
}

// ─── Persistence state ───────────────────────────────────────────────────────

/// A saved attachment: the store-assigned id, the owning incident, and the
/// payload fields flattened alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persisted<T> {
  pub id:          i64,
  pub incident_id: i64,
  #[serde(flatten)]
  pub value:       T,
}

/// Either a value that has not been saved yet or a saved one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Stored<T> {
  Draft(T),
  Persisted(Persisted<T>),
}

impl<T> Stored<T> {
  pub fn id(&self) -> Option<i64> {
    match self {
      Self::Draft(_) => None,
      Self::Persisted(p) => Some(p.id),
    }
  }

  pub fn value(&self) -> &T {
    match self {
      Self::Draft(v) => v,
      Self::Persisted(p) => &p.value,
    }
  }

  pub fn is_draft(&self) -> bool { matches!(self, Self::Draft(_)) }

  pub fn into_value(self) -> T {
    match self {
      Self::Draft(v) => v,
      Self::Persisted(p) => p.value,
    }
  }
}

impl<T> From<Persisted<T>> for Stored<T> {
  fn from(p: Persisted<T>) -> Self { Self::Persisted(p) }
}
