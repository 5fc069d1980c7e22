//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Payloads (incident fields,
//! attachments, guest reports) are stored as compact JSON. UUIDs are stored as
//! hyphenated lowercase strings. Enum discriminants use their snake_case
//! string form.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;
use witness_core::{
  guest::GuestSubmission,
  incident::Incident,
  record::{Attachment, Persisted},
  review::Reviewer,
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

/// Parse a stored strum/serde discriminant.
pub fn decode_enum<T: FromStr>(s: &str, what: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

/// The normalised form used for case-insensitive matching on names and
/// facilities.
pub fn match_key(s: Option<&str>) -> Option<String> {
  s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase)
}

// ─── Incidents ───────────────────────────────────────────────────────────────

pub const INCIDENT_COLUMNS: &str = "id, incident_id, fields_json, verification_status, \
  first_verified_by, first_verified_at, second_verified_by, second_verified_at, verified_at, \
  rejection_reason, created_at, updated_at";

/// Raw values read directly from an `incidents` row.
pub struct RawIncident {
  pub id:                  i64,
  pub incident_id:         String,
  pub fields_json:         String,
  pub verification_status: String,
  pub first_verified_by:   Option<i64>,
  pub first_verified_at:   Option<String>,
  pub second_verified_by:  Option<i64>,
  pub second_verified_at:  Option<String>,
  pub verified_at:         Option<String>,
  pub rejection_reason:    Option<String>,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawIncident {
  /// Read a row selected with [`INCIDENT_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      incident_id:         row.get(1)?,
      fields_json:         row.get(2)?,
      verification_status: row.get(3)?,
      first_verified_by:   row.get(4)?,
      first_verified_at:   row.get(5)?,
      second_verified_by:  row.get(6)?,
      second_verified_at:  row.get(7)?,
      verified_at:         row.get(8)?,
      rejection_reason:    row.get(9)?,
      created_at:          row.get(10)?,
      updated_at:          row.get(11)?,
    })
  }

  pub fn into_incident(self) -> Result<Incident> {
    Ok(Incident {
      id:                  self.id,
      incident_id:         decode_uuid(&self.incident_id)?,
      fields:              serde_json::from_str(&self.fields_json)?,
      verification_status: decode_enum(&self.verification_status, "verification status")?,
      first_verified_by:   self.first_verified_by,
      first_verified_at:   decode_opt_dt(self.first_verified_at)?,
      second_verified_by:  self.second_verified_by,
      second_verified_at:  decode_opt_dt(self.second_verified_at)?,
      verified_at:         decode_opt_dt(self.verified_at)?,
      rejection_reason:    self.rejection_reason,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Attachments ─────────────────────────────────────────────────────────────

pub struct RawAttachment {
  pub id:          i64,
  pub incident_id: i64,
  pub value_json:  String,
}

impl RawAttachment {
  /// Read a row selected as `id, incident_id, value_json`.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { id: row.get(0)?, incident_id: row.get(1)?, value_json: row.get(2)? })
  }

  pub fn into_persisted<A: Attachment>(self) -> Result<Persisted<A>> {
    Ok(Persisted {
      id:          self.id,
      incident_id: self.incident_id,
      value:       serde_json::from_str(&self.value_json)?,
    })
  }
}

// ─── Guest submissions ───────────────────────────────────────────────────────

pub const GUEST_COLUMNS: &str =
  "id, submitted_at, report_json, status, incident_id, deleted_at, deletion_reason";

pub struct RawGuestSubmission {
  pub id:              i64,
  pub submitted_at:    String,
  pub report_json:     String,
  pub status:          String,
  pub incident_id:     Option<i64>,
  pub deleted_at:      Option<String>,
  pub deletion_reason: Option<String>,
}

impl RawGuestSubmission {
  /// Read a row selected with [`GUEST_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      submitted_at:    row.get(1)?,
      report_json:     row.get(2)?,
      status:          row.get(3)?,
      incident_id:     row.get(4)?,
      deleted_at:      row.get(5)?,
      deletion_reason: row.get(6)?,
    })
  }

  pub fn into_submission(self) -> Result<GuestSubmission> {
    Ok(GuestSubmission {
      id:              self.id,
      submitted_at:    decode_dt(&self.submitted_at)?,
      report:          serde_json::from_str(&self.report_json)?,
      status:          decode_enum(&self.status, "guest status")?,
      incident_id:     self.incident_id,
      deleted_at:      decode_opt_dt(self.deleted_at)?,
      deletion_reason: self.deletion_reason,
    })
  }
}

// ─── Reviewers ───────────────────────────────────────────────────────────────

pub struct RawReviewer {
  pub id:   i64,
  pub name: String,
  pub role: String,
}

impl RawReviewer {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { id: row.get(0)?, name: row.get(1)?, role: row.get(2)? })
  }

  pub fn into_reviewer(self) -> Result<Reviewer> {
    Ok(Reviewer { id: self.id, name: self.name, role: decode_enum(&self.role, "role")? })
  }
}
