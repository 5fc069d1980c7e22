//! Synchronous SQL run on the `tokio-rusqlite` connection thread.
//!
//! Functions taking `&Connection` also accept a `&Transaction`, so the
//! multi-step writes (promotion, reorder, timeline removal) compose them
//! inside one transaction.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;
use witness_core::{
  dossier::Dossier,
  duplicate::{CaseMatch, DuplicateMatches, DuplicateQuery, SourceMatch},
  evidence::{Quote, Source, TimelineEntry, normalize_url},
  guest::{GuestReport, GuestStatus, GuestSubmission, GuestSubmissionPatch, PromotedQuote},
  incident::{Incident, IncidentFields, VerificationStatus},
  record::{Attachment, AttachmentKind, Persisted},
  review::{Reviewer, Role},
  store::{GuestQuery, IncidentQuery},
  timeline,
};

use crate::{
  Error, Result,
  encode::{
    GUEST_COLUMNS, INCIDENT_COLUMNS, RawAttachment, RawGuestSubmission, RawIncident,
    RawReviewer, encode_dt, encode_uuid, match_key,
  },
};

// ─── Incidents ───────────────────────────────────────────────────────────────

pub fn insert_incident(conn: &Connection, fields: &IncidentFields) -> Result<Incident> {
  let now = Utc::now();
  let incident_id = Uuid::new_v4();
  conn.execute(
    "INSERT INTO incidents (
       incident_id, fields_json, name_key, facility_key, verification_status,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    params![
      encode_uuid(incident_id),
      serde_json::to_string(fields)?,
      match_key(fields.victim_name.as_deref()),
      match_key(fields.facility.as_deref()),
      VerificationStatus::Pending.as_ref(),
      encode_dt(now),
    ],
  )?;

  Ok(Incident {
    id: conn.last_insert_rowid(),
    incident_id,
    fields: fields.clone(),
    verification_status: VerificationStatus::Pending,
    first_verified_by: None,
    first_verified_at: None,
    second_verified_by: None,
    second_verified_at: None,
    verified_at: None,
    rejection_reason: None,
    created_at: now,
    updated_at: now,
  })
}

pub fn select_incident(conn: &Connection, id: i64) -> Result<Option<Incident>> {
  let raw = conn
    .query_row(
      &format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = ?1"),
      params![id],
      RawIncident::from_row,
    )
    .optional()?;
  raw.map(RawIncident::into_incident).transpose()
}

fn require_incident(conn: &Connection, id: i64) -> Result<Incident> {
  select_incident(conn, id)?.ok_or(Error::Core(witness_core::Error::IncidentNotFound(id)))
}

pub fn select_incidents(conn: &Connection, query: &IncidentQuery) -> Result<Vec<Incident>> {
  let status = query.status.map(|s| s.as_ref().to_owned());
  let limit = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
  let offset = query.offset.map_or(0, |o| i64::try_from(o).unwrap_or(i64::MAX));

  let mut stmt = conn.prepare(&format!(
    "SELECT {INCIDENT_COLUMNS} FROM incidents
     WHERE ?1 IS NULL OR verification_status = ?1
     ORDER BY id
     LIMIT ?2 OFFSET ?3"
  ))?;
  let raws = stmt
    .query_map(params![status, limit, offset], RawIncident::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawIncident::into_incident).collect()
}

pub fn update_incident_fields(
  conn: &Connection,
  id: i64,
  fields: &IncidentFields,
) -> Result<Incident> {
  let changed = conn.execute(
    "UPDATE incidents
     SET fields_json = ?2, name_key = ?3, facility_key = ?4, updated_at = ?5
     WHERE id = ?1",
    params![
      id,
      serde_json::to_string(fields)?,
      match_key(fields.victim_name.as_deref()),
      match_key(fields.facility.as_deref()),
      encode_dt(Utc::now()),
    ],
  )?;
  if changed == 0 {
    return Err(witness_core::Error::IncidentNotFound(id).into());
  }
  require_incident(conn, id)
}

pub fn update_review_state(conn: &Connection, incident: &Incident) -> Result<Incident> {
  let changed = conn.execute(
    "UPDATE incidents
     SET verification_status = ?2,
         first_verified_by = ?3, first_verified_at = ?4,
         second_verified_by = ?5, second_verified_at = ?6,
         verified_at = ?7, rejection_reason = ?8, updated_at = ?9
     WHERE id = ?1",
    params![
      incident.id,
      incident.verification_status.as_ref(),
      incident.first_verified_by,
      incident.first_verified_at.map(encode_dt),
      incident.second_verified_by,
      incident.second_verified_at.map(encode_dt),
      incident.verified_at.map(encode_dt),
      incident.rejection_reason,
      encode_dt(Utc::now()),
    ],
  )?;
  if changed == 0 {
    return Err(witness_core::Error::IncidentNotFound(incident.id).into());
  }
  require_incident(conn, incident.id)
}

pub fn select_dossier(conn: &Connection, id: i64) -> Result<Option<Dossier>> {
  let Some(incident) = select_incident(conn, id)? else {
    return Ok(None);
  };
  Ok(Some(Dossier {
    incident,
    agencies: select_attachments(conn, id)?,
    violations: select_attachments(conn, id)?,
    sources: select_attachments(conn, id)?,
    quotes: select_attachments(conn, id)?,
    media: select_attachments(conn, id)?,
    timeline: select_attachments(conn, id)?,
  }))
}

// ─── Attachments ─────────────────────────────────────────────────────────────

pub fn select_attachments<A: Attachment>(
  conn: &Connection,
  incident_id: i64,
) -> Result<Vec<Persisted<A>>> {
  // Non-timeline payloads have no sequence_order, so they fall back to id.
  let mut stmt = conn.prepare(
    "SELECT id, incident_id, value_json FROM attachments
     WHERE incident_id = ?1 AND kind = ?2
     ORDER BY json_extract(value_json, '$.sequence_order'), id",
  )?;
  let raws = stmt
    .query_map(params![incident_id, A::KIND.as_ref()], RawAttachment::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawAttachment::into_persisted).collect()
}

pub fn select_attachment<A: Attachment>(
  conn: &Connection,
  incident_id: i64,
  id: i64,
) -> Result<Option<Persisted<A>>> {
  let raw = conn
    .query_row(
      "SELECT id, incident_id, value_json FROM attachments
       WHERE id = ?1 AND incident_id = ?2 AND kind = ?3",
      params![id, incident_id, A::KIND.as_ref()],
      RawAttachment::from_row,
    )
    .optional()?;
  raw.map(RawAttachment::into_persisted).transpose()
}

/// Reject `value` if another attachment of its kind already holds its dedup
/// key. `except` is the row being updated, if any.
fn check_unique<A: Attachment>(
  conn: &Connection,
  incident_id: i64,
  value: &A,
  except: Option<i64>,
) -> Result<()> {
  let Some(key) = value.dedup_key() else {
    return Ok(());
  };
  let taken: bool = conn
    .query_row(
      "SELECT 1 FROM attachments
       WHERE incident_id = ?1 AND kind = ?2 AND dedup_key = ?3 AND id IS NOT ?4",
      params![incident_id, A::KIND.as_ref(), key, except],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  if taken {
    return Err(
      witness_core::Error::DuplicateAttachment { kind: A::KIND, key, incident_id }.into(),
    );
  }
  Ok(())
}

/// Reject a citation of a source that is not attached to `incident_id`.
fn check_source_ref<A: Attachment>(conn: &Connection, incident_id: i64, value: &A) -> Result<()> {
  let Some(source_id) = value.source_ref() else {
    return Ok(());
  };
  let found = conn
    .query_row(
      "SELECT 1 FROM attachments WHERE id = ?1 AND incident_id = ?2 AND kind = ?3",
      params![source_id, incident_id, AttachmentKind::Source.as_ref()],
      |_| Ok(()),
    )
    .optional()?;
  if found.is_none() {
    return Err(witness_core::Error::UnknownSource { source_id, incident_id }.into());
  }
  Ok(())
}

fn count_attachments(conn: &Connection, incident_id: i64, kind: AttachmentKind) -> Result<u32> {
  Ok(conn.query_row(
    "SELECT COUNT(*) FROM attachments WHERE incident_id = ?1 AND kind = ?2",
    params![incident_id, kind.as_ref()],
    |r| r.get(0),
  )?)
}

pub fn insert_attachment<A: Attachment>(
  conn: &Connection,
  incident_id: i64,
  mut value: A,
) -> Result<Persisted<A>> {
  require_incident(conn, incident_id)?;
  check_unique(conn, incident_id, &value, None)?;
  check_source_ref(conn, incident_id, &value)?;
  if value.sequence().is_some() {
    value.set_sequence(count_attachments(conn, incident_id, A::KIND)? + 1);
  }

  conn.execute(
    "INSERT INTO attachments (incident_id, kind, value_json, dedup_key, url_key)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      incident_id,
      A::KIND.as_ref(),
      serde_json::to_string(&value)?,
      value.dedup_key(),
      value.url_key(),
    ],
  )?;
  Ok(Persisted { id: conn.last_insert_rowid(), incident_id, value })
}

/// Overwrite an attachment's payload. A record's position in an ordered
/// collection only changes through [`reorder_timeline`].
pub fn update_attachment<A: Attachment>(
  conn: &Connection,
  incident_id: i64,
  id: i64,
  mut value: A,
) -> Result<Persisted<A>> {
  let existing: Persisted<A> = select_attachment(conn, incident_id, id)?.ok_or(
    witness_core::Error::AttachmentNotFound { kind: A::KIND, id, incident_id },
  )?;
  check_unique(conn, incident_id, &value, Some(id))?;
  check_source_ref(conn, incident_id, &value)?;
  if let Some(position) = existing.value.sequence() {
    value.set_sequence(position);
  }
  write_attachment(conn, id, &value)?;
  Ok(Persisted { id, incident_id, value })
}

fn write_attachment<A: Attachment>(conn: &Connection, id: i64, value: &A) -> Result<()> {
  conn.execute(
    "UPDATE attachments SET value_json = ?2, dedup_key = ?3, url_key = ?4 WHERE id = ?1",
    params![id, serde_json::to_string(value)?, value.dedup_key(), value.url_key()],
  )?;
  Ok(())
}

pub fn update_attachments<A: Attachment>(
  conn: &mut Connection,
  records: Vec<Persisted<A>>,
) -> Result<()> {
  let tx = conn.transaction()?;
  for record in records {
    update_attachment(&tx, record.incident_id, record.id, record.value)?;
  }
  tx.commit()?;
  Ok(())
}

pub fn delete_attachment(
  conn: &mut Connection,
  incident_id: i64,
  kind: AttachmentKind,
  id: i64,
) -> Result<()> {
  let tx = conn.transaction()?;
  if kind == AttachmentKind::Source {
    let quotes: u32 = tx.query_row(
      "SELECT COUNT(*) FROM attachments
       WHERE incident_id = ?1 AND kind = ?2 AND json_extract(value_json, '$.source_id') = ?3",
      params![incident_id, AttachmentKind::Quote.as_ref(), id],
      |r| r.get(0),
    )?;
    if quotes > 0 {
      return Err(witness_core::Error::SourceInUse { source_id: id, quotes }.into());
    }
  }

  let removed = tx.execute(
    "DELETE FROM attachments WHERE id = ?1 AND incident_id = ?2 AND kind = ?3",
    params![id, incident_id, kind.as_ref()],
  )?;
  if removed == 0 {
    return Err(witness_core::Error::AttachmentNotFound { kind, id, incident_id }.into());
  }

  if kind == AttachmentKind::Timeline {
    let mut entries: Vec<Persisted<TimelineEntry>> = select_attachments(&tx, incident_id)?;
    timeline::renumber(&mut entries);
    for entry in &entries {
      write_attachment(&tx, entry.id, &entry.value)?;
    }
  }
  tx.commit()?;
  Ok(())
}

pub fn reorder_timeline(
  conn: &mut Connection,
  incident_id: i64,
  order: &[i64],
) -> Result<Vec<Persisted<TimelineEntry>>> {
  let tx = conn.transaction()?;
  let mut entries: Vec<Persisted<TimelineEntry>> = select_attachments(&tx, incident_id)?;
  timeline::validate_order(&entries, order)?;

  for entry in &mut entries {
    let index = order.iter().position(|id| *id == entry.id).unwrap_or(order.len());
    entry.value.sequence_order = u32::try_from(index + 1).unwrap_or(u32::MAX);
    write_attachment(&tx, entry.id, &entry.value)?;
  }
  tx.commit()?;

  entries.sort_by_key(|e| e.value.sequence_order);
  Ok(entries)
}

// ─── Guest submissions ───────────────────────────────────────────────────────

pub fn insert_guest(conn: &Connection, report: GuestReport) -> Result<GuestSubmission> {
  let now = Utc::now();
  conn.execute(
    "INSERT INTO guest_submissions (submitted_at, report_json, name_key, status)
     VALUES (?1, ?2, ?3, ?4)",
    params![
      encode_dt(now),
      serde_json::to_string(&report)?,
      match_key(report.victim_name.as_deref()),
      GuestStatus::Pending.as_ref(),
    ],
  )?;
  Ok(GuestSubmission {
    id: conn.last_insert_rowid(),
    submitted_at: now,
    report,
    status: GuestStatus::Pending,
    incident_id: None,
    deleted_at: None,
    deletion_reason: None,
  })
}

pub fn select_guest(conn: &Connection, id: i64) -> Result<Option<GuestSubmission>> {
  let raw = conn
    .query_row(
      &format!("SELECT {GUEST_COLUMNS} FROM guest_submissions WHERE id = ?1"),
      params![id],
      RawGuestSubmission::from_row,
    )
    .optional()?;
  raw.map(RawGuestSubmission::into_submission).transpose()
}

pub fn select_guests(conn: &Connection, query: &GuestQuery) -> Result<Vec<GuestSubmission>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {GUEST_COLUMNS} FROM guest_submissions
     WHERE (?1 IS NULL OR status = ?1)
       AND (?2 IS NULL OR name_key = ?2)
       AND (?3 IS NULL OR incident_id IS NULL OR incident_id != ?3)
       AND (?4 OR deleted_at IS NULL)
     ORDER BY id DESC"
  ))?;
  let raws = stmt
    .query_map(
      params![
        query.status.map(|s| s.as_ref().to_owned()),
        match_key(query.name.as_deref()),
        query.exclude_incident_id,
        query.include_deleted,
      ],
      RawGuestSubmission::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawGuestSubmission::into_submission).collect()
}

fn write_guest_state(conn: &Connection, submission: &GuestSubmission) -> Result<()> {
  conn.execute(
    "UPDATE guest_submissions
     SET status = ?2, incident_id = ?3, deleted_at = ?4, deletion_reason = ?5
     WHERE id = ?1",
    params![
      submission.id,
      submission.status.as_ref(),
      submission.incident_id,
      submission.deleted_at.map(encode_dt),
      submission.deletion_reason,
    ],
  )?;
  Ok(())
}

pub fn update_guest(conn: &Connection, patch: &GuestSubmissionPatch) -> Result<GuestSubmission> {
  let mut submission = select_guest(conn, patch.id)?
    .ok_or(witness_core::Error::GuestSubmissionNotFound(patch.id))?;
  patch.apply(&mut submission)?;
  write_guest_state(conn, &submission)?;
  Ok(submission)
}

pub fn promote_guest(conn: &mut Connection, id: i64) -> Result<Dossier> {
  let tx = conn.transaction()?;
  let mut submission =
    select_guest(&tx, id)?.ok_or(witness_core::Error::GuestSubmissionNotFound(id))?;
  let promotion = submission.promote()?;

  let incident = insert_incident(&tx, &promotion.incident)?;
  for agency in promotion.agencies {
    insert_attachment(&tx, incident.id, agency.into_value())?;
  }
  let mut source_ids = Vec::with_capacity(promotion.sources.len());
  for source in promotion.sources {
    source_ids.push(insert_attachment(&tx, incident.id, source.into_value())?.id);
  }
  for PromotedQuote { quote, source } in promotion.quotes {
    let quote = Quote {
      source_id: source.and_then(|i| source_ids.get(i).copied()),
      ..quote.into_value()
    };
    insert_attachment(&tx, incident.id, quote)?;
  }
  for media in promotion.media {
    insert_attachment(&tx, incident.id, media.into_value())?;
  }

  submission.status = GuestStatus::Promoted;
  submission.incident_id = Some(incident.id);
  write_guest_state(&tx, &submission)?;

  let dossier = select_dossier(&tx, incident.id)?
    .ok_or(witness_core::Error::IncidentNotFound(incident.id))?;
  tx.commit()?;
  Ok(dossier)
}

// ─── Duplicates ──────────────────────────────────────────────────────────────

pub fn find_duplicates(conn: &Connection, query: &DuplicateQuery) -> Result<DuplicateMatches> {
  let name = match_key(query.name());
  let facility = match_key(query.facility());
  let date = query.date_of_death.map(|d| d.to_string());

  let mut stmt = conn.prepare(&format!(
    "SELECT {INCIDENT_COLUMNS} FROM incidents
     WHERE (?1 IS NOT NULL AND name_key = ?1)
        OR (?2 IS NOT NULL AND ?3 IS NOT NULL
            AND json_extract(fields_json, '$.incident_date') = ?2
            AND facility_key = ?3)
     ORDER BY id"
  ))?;
  let cases = stmt
    .query_map(params![name, date, facility], RawIncident::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .into_iter()
    .map(|raw| {
      let incident = raw.into_incident()?;
      Ok(CaseMatch {
        id:                  incident.id,
        incident_id:         incident.incident_id,
        victim_name:         incident.fields.victim_name,
        incident_date:       incident.fields.incident_date,
        facility:            incident.fields.facility,
        verification_status: incident.verification_status,
      })
    })
    .collect::<Result<Vec<_>>>()?;

  let wanted: Vec<String> = query.urls().map(normalize_url).collect();
  let sources: Vec<SourceMatch> = if wanted.is_empty() {
    Vec::new()
  } else {
    let mut stmt = conn.prepare(
      "SELECT id, incident_id, value_json FROM attachments
       WHERE kind = ?1 AND url_key IN (SELECT value FROM json_each(?2))
       ORDER BY id",
    )?;
    let raws = stmt
      .query_map(
        params![AttachmentKind::Source.as_ref(), serde_json::to_string(&wanted)?],
        RawAttachment::from_row,
      )?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws
      .into_iter()
      .map(RawAttachment::into_persisted::<Source>)
      .collect::<Result<Vec<_>>>()?
      .into_iter()
      .map(|s| SourceMatch {
        id:          s.id,
        incident_id: s.incident_id,
        url:         s.value.url,
        title:       s.value.title,
      })
      .collect()
  };

  let pending_guest_submissions: u32 = match &name {
    Some(name) => conn.query_row(
      "SELECT COUNT(*) FROM guest_submissions
       WHERE name_key = ?1 AND status = ?2 AND deleted_at IS NULL",
      params![name, GuestStatus::Pending.as_ref()],
      |r| r.get(0),
    )?,
    None => 0,
  };

  Ok(DuplicateMatches { cases, sources, pending_guest_submissions })
}

// ─── Reviewers ───────────────────────────────────────────────────────────────

pub fn insert_reviewer(conn: &Connection, name: String, role: Role) -> Result<Reviewer> {
  conn.execute(
    "INSERT INTO reviewers (name, role) VALUES (?1, ?2)",
    params![name, role.to_string()],
  )?;
  Ok(Reviewer { id: conn.last_insert_rowid(), name, role })
}

pub fn select_reviewer(conn: &Connection, id: i64) -> Result<Option<Reviewer>> {
  let raw = conn
    .query_row(
      "SELECT id, name, role FROM reviewers WHERE id = ?1",
      params![id],
      RawReviewer::from_row,
    )
    .optional()?;
  raw.map(RawReviewer::into_reviewer).transpose()
}

pub fn select_reviewers(conn: &Connection) -> Result<Vec<Reviewer>> {
  let mut stmt = conn.prepare("SELECT id, name, role FROM reviewers ORDER BY id")?;
  let raws = stmt
    .query_map([], RawReviewer::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawReviewer::into_reviewer).collect()
}
