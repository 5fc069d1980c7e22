//! [`SqliteStore`], the SQLite implementation of [`IncidentStore`].

use std::path::Path;

use witness_core::{
  dossier::Dossier,
  duplicate::{DuplicateMatches, DuplicateQuery},
  evidence::TimelineEntry,
  guest::{GuestReport, GuestSubmission, GuestSubmissionPatch},
  incident::{Incident, IncidentFields},
  record::{Attachment, AttachmentKind, Persisted},
  review::{Reviewer, Role},
  store::{GuestQuery, IncidentQuery, IncidentStore},
};

use crate::{Result, queries, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Witness incident store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread. Domain and decode errors travel back
  /// inside the closure's result; only connection failures use the outer one.
  async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

// ─── IncidentStore impl ──────────────────────────────────────────────────────

impl IncidentStore for SqliteStore {
  type Error = crate::Error;

  // ── Incidents ─────────────────────────────────────────────────────────────

  async fn create_incident(&self, fields: IncidentFields) -> Result<Incident> {
    let incident = self.with_conn(move |c| queries::insert_incident(c, &fields)).await?;
    tracing::debug!(id = incident.id, incident_id = %incident.incident_id, "incident created");
    Ok(incident)
  }

  async fn get_incident(&self, id: i64) -> Result<Option<Incident>> {
    self.with_conn(move |c| queries::select_incident(c, id)).await
  }

  async fn list_incidents(&self, query: &IncidentQuery) -> Result<Vec<Incident>> {
    let query = query.clone();
    self.with_conn(move |c| queries::select_incidents(c, &query)).await
  }

  async fn update_incident(&self, id: i64, fields: IncidentFields) -> Result<Incident> {
    tracing::debug!(id, "updating incident fields");
    self.with_conn(move |c| queries::update_incident_fields(c, id, &fields)).await
  }

  async fn save_review_state(&self, incident: Incident) -> Result<Incident> {
    tracing::debug!(id = incident.id, status = %incident.verification_status, "saving review state");
    self.with_conn(move |c| queries::update_review_state(c, &incident)).await
  }

  async fn dossier(&self, id: i64) -> Result<Option<Dossier>> {
    self.with_conn(move |c| queries::select_dossier(c, id)).await
  }

  // ── Attachments ───────────────────────────────────────────────────────────

  async fn add_attachment<A: Attachment>(&self, incident_id: i64, value: A) -> Result<Persisted<A>> {
    tracing::debug!(incident_id, kind = %A::KIND, "adding attachment");
    self.with_conn(move |c| queries::insert_attachment(c, incident_id, value)).await
  }

  async fn get_attachment<A: Attachment>(
    &self,
    incident_id: i64,
    id: i64,
  ) -> Result<Option<Persisted<A>>> {
    self.with_conn(move |c| queries::select_attachment(c, incident_id, id)).await
  }

  async fn list_attachments<A: Attachment>(&self, incident_id: i64) -> Result<Vec<Persisted<A>>> {
    self.with_conn(move |c| queries::select_attachments(c, incident_id)).await
  }

  async fn update_attachment<A: Attachment>(
    &self,
    incident_id: i64,
    id: i64,
    value: A,
  ) -> Result<Persisted<A>> {
    tracing::debug!(incident_id, id, kind = %A::KIND, "updating attachment");
    self.with_conn(move |c| queries::update_attachment(c, incident_id, id, value)).await
  }

  async fn update_attachments<A: Attachment>(&self, records: Vec<Persisted<A>>) -> Result<()> {
    if records.is_empty() {
      return Ok(());
    }
    self.with_conn(move |c| queries::update_attachments(c, records)).await
  }

  async fn remove_attachment(&self, incident_id: i64, kind: AttachmentKind, id: i64) -> Result<()> {
    tracing::debug!(incident_id, id, %kind, "removing attachment");
    self.with_conn(move |c| queries::delete_attachment(c, incident_id, kind, id)).await
  }

  async fn reorder_timeline(
    &self,
    incident_id: i64,
    order: Vec<i64>,
  ) -> Result<Vec<Persisted<TimelineEntry>>> {
    self.with_conn(move |c| queries::reorder_timeline(c, incident_id, &order)).await
  }

  // ── Guest submissions ─────────────────────────────────────────────────────

  async fn create_guest_submission(&self, report: GuestReport) -> Result<GuestSubmission> {
    self.with_conn(move |c| queries::insert_guest(c, report)).await
  }

  async fn get_guest_submission(&self, id: i64) -> Result<Option<GuestSubmission>> {
    self.with_conn(move |c| queries::select_guest(c, id)).await
  }

  async fn list_guest_submissions(&self, query: &GuestQuery) -> Result<Vec<GuestSubmission>> {
    let query = query.clone();
    self.with_conn(move |c| queries::select_guests(c, &query)).await
  }

  async fn update_guest_submission(&self, patch: GuestSubmissionPatch) -> Result<GuestSubmission> {
    self.with_conn(move |c| queries::update_guest(c, &patch)).await
  }

  async fn promote_guest_submission(&self, id: i64) -> Result<Dossier> {
    tracing::debug!(submission = id, "promoting guest submission");
    self.with_conn(move |c| queries::promote_guest(c, id)).await
  }

  // ── Duplicates ────────────────────────────────────────────────────────────

  async fn find_duplicates(&self, query: &DuplicateQuery) -> Result<DuplicateMatches> {
    let query = query.clone();
    self.with_conn(move |c| queries::find_duplicates(c, &query)).await
  }

  // ── Reviewers ─────────────────────────────────────────────────────────────

  async fn add_reviewer(&self, name: String, role: Role) -> Result<Reviewer> {
    self.with_conn(move |c| queries::insert_reviewer(c, name, role)).await
  }

  async fn get_reviewer(&self, id: i64) -> Result<Option<Reviewer>> {
    self.with_conn(move |c| queries::select_reviewer(c, id)).await
  }

  async fn list_reviewers(&self) -> Result<Vec<Reviewer>> {
    self.with_conn(|c| queries::select_reviewers(c)).await
  }
}
