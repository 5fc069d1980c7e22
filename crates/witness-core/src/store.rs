//! The `IncidentStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `witness-store-sqlite`).
//! Higher layers (`witness-api`, `witness-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use serde::Deserialize;

use crate::{
  dossier::Dossier,
  duplicate::{DuplicateLookup, DuplicateMatches, DuplicateQuery, DuplicateReport},
  evidence::TimelineEntry,
  guest::{GuestReport, GuestStatus, GuestSubmission, GuestSubmissionPatch},
  incident::{Incident, IncidentFields, VerificationStatus},
  record::{Attachment, AttachmentKind, Persisted},
  review::{Reviewer, Role},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`IncidentStore::list_incidents`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IncidentQuery {
  pub status: Option<VerificationStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// Parameters for [`IncidentStore::list_guest_submissions`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GuestQuery {
  pub status:              Option<GuestStatus>,
  /// Case-insensitive exact match on the victim name.
  pub name:                Option<String>,
  /// Leave out submissions already promoted into this incident.
  pub exclude_incident_id: Option<i64>,
  pub include_deleted:     bool,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend errors expose any domain error they carry so callers can map
/// "not found" and rule violations without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Witness incident store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait IncidentStore: Send + Sync {
  type Error: StoreError;

  // ── Incidents ─────────────────────────────────────────────────────────

  /// Create a pending incident with a fresh public id.
  fn create_incident(
    &self,
    fields: IncidentFields,
  ) -> impl Future<Output = Result<Incident, Self::Error>> + Send + '_;

  /// Retrieve an incident by row id. Returns `None` if not found.
  fn get_incident(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Incident>, Self::Error>> + Send + '_;

  fn list_incidents<'a>(
    &'a self,
    query: &'a IncidentQuery,
  ) -> impl Future<Output = Result<Vec<Incident>, Self::Error>> + Send + 'a;

  /// Replace the editable fields of an incident. Last write wins.
  fn update_incident(
    &self,
    id: i64,
    fields: IncidentFields,
  ) -> impl Future<Output = Result<Incident, Self::Error>> + Send + '_;

  /// Persist the verification columns of `incident` (status, reviewers,
  /// timestamps, rejection reason).
  fn save_review_state(
    &self,
    incident: Incident,
  ) -> impl Future<Output = Result<Incident, Self::Error>> + Send + '_;

  /// The incident with all of its child collections.
  fn dossier(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Dossier>, Self::Error>> + Send + '_;

  // ── Attachments ───────────────────────────────────────────────────────

  /// Attach a child record. Agencies and violations are rejected with
  /// [`crate::Error::DuplicateAttachment`] if the incident already has one
  /// of that kind; timeline entries are appended at the end.
  fn add_attachment<A: Attachment>(
    &self,
    incident_id: i64,
    value: A,
  ) -> impl Future<Output = Result<Persisted<A>, Self::Error>> + Send + '_;

  fn get_attachment<A: Attachment>(
    &self,
    incident_id: i64,
    id: i64,
  ) -> impl Future<Output = Result<Option<Persisted<A>>, Self::Error>> + Send + '_;

  /// All records of one kind, timeline entries in sequence order, others in
  /// insertion order.
  fn list_attachments<A: Attachment>(
    &self,
    incident_id: i64,
  ) -> impl Future<Output = Result<Vec<Persisted<A>>, Self::Error>> + Send + '_;

  fn update_attachment<A: Attachment>(
    &self,
    incident_id: i64,
    id: i64,
    value: A,
  ) -> impl Future<Output = Result<Persisted<A>, Self::Error>> + Send + '_;

  /// Write several records of one kind in a single transaction.
  fn update_attachments<A: Attachment>(
    &self,
    records: Vec<Persisted<A>>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a child record. Removing a timeline entry renumbers the rest.
  fn remove_attachment(
    &self,
    incident_id: i64,
    kind: AttachmentKind,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Rewrite every timeline entry's `sequence_order` to match `order` (a
  /// permutation of the incident's entry ids) in one transaction.
  fn reorder_timeline(
    &self,
    incident_id: i64,
    order: Vec<i64>,
  ) -> impl Future<Output = Result<Vec<Persisted<TimelineEntry>>, Self::Error>> + Send + '_;

  // ── Guest submissions ─────────────────────────────────────────────────

  fn create_guest_submission(
    &self,
    report: GuestReport,
  ) -> impl Future<Output = Result<GuestSubmission, Self::Error>> + Send + '_;

  fn get_guest_submission(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<GuestSubmission>, Self::Error>> + Send + '_;

  fn list_guest_submissions<'a>(
    &'a self,
    query: &'a GuestQuery,
  ) -> impl Future<Output = Result<Vec<GuestSubmission>, Self::Error>> + Send + 'a;

  fn update_guest_submission(
    &self,
    patch: GuestSubmissionPatch,
  ) -> impl Future<Output = Result<GuestSubmission, Self::Error>> + Send + '_;

  /// Promote a submission into a new incident: the incident and every draft
  /// are created and the submission marked promoted, all in one
  /// transaction.
  fn promote_guest_submission(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Dossier, Self::Error>> + Send + '_;

  // ── Duplicates ────────────────────────────────────────────────────────

  /// Raw duplicate matches for `query`; policy lives in
  /// [`DuplicateReport::assess`].
  fn find_duplicates<'a>(
    &'a self,
    query: &'a DuplicateQuery,
  ) -> impl Future<Output = Result<DuplicateMatches, Self::Error>> + Send + 'a;

  // ── Reviewers ─────────────────────────────────────────────────────────

  fn add_reviewer(
    &self,
    name: String,
    role: Role,
  ) -> impl Future<Output = Result<Reviewer, Self::Error>> + Send + '_;

  fn get_reviewer(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Reviewer>, Self::Error>> + Send + '_;

  fn list_reviewers(&self) -> impl Future<Output = Result<Vec<Reviewer>, Self::Error>> + Send + '_;
}

/// Answers duplicate queries straight from a store.
pub struct StoreLookup<'s, S>(pub &'s S);

impl<S: IncidentStore> DuplicateLookup for StoreLookup<'_, S> {
  type Error = S::Error;

  fn lookup<'a>(
    &'a self,
    query: &'a DuplicateQuery,
  ) -> impl Future<Output = Result<DuplicateReport, Self::Error>> + Send + 'a {
    async move { self.0.find_duplicates(query).await.map(DuplicateReport::assess) }
  }
}
