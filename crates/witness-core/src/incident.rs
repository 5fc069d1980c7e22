//! Incidents: the documented cases moving through the review pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result, scrolly::Record};

// ─── Status ──────────────────────────────────────────────────────────────────

/// An incident's position in the review pipeline.
///
/// `pending → first_review → second_review → verified`, with `rejected`
/// reachable from any non-terminal state.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStatus {
  #[default]
  Pending,
  FirstReview,
  SecondReview,
  Verified,
  Rejected,
}

impl VerificationStatus {
  /// The stage a successful review submission advances to, or `None` for
  /// terminal states.
  pub fn next(self) -> Option<Self> {
    match self {
      Self::Pending => Some(Self::FirstReview),
      Self::FirstReview => Some(Self::SecondReview),
      Self::SecondReview => Some(Self::Verified),
      Self::Verified | Self::Rejected => None,
    }
  }

  pub fn is_terminal(self) -> bool { self.next().is_none() }

  /// Only verified incidents are visible to the public.
  pub fn is_public(self) -> bool { self == Self::Verified }
}

// ─── Classification ──────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
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
pub enum IncidentType {
  Death,
  Injury,
  Arrest,
  Detention,
  Deportation,
  RightsViolation,
  #[default]
  Other,
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// The structured incident fields that can be backed by a quote.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentField {
  VictimName,
  IncidentDate,
  IncidentType,
  SubjectAge,
  SubjectGender,
  SubjectNationality,
  City,
  State,
  Facility,
  Summary,
}

/// Every field a reviewer must substantiate with a quote when it has data.
pub const LINKABLE_FIELDS: &[IncidentField] = &[
  IncidentField::VictimName,
  IncidentField::IncidentDate,
  IncidentField::IncidentType,
  IncidentField::SubjectAge,
  IncidentField::SubjectGender,
  IncidentField::SubjectNationality,
  IncidentField::City,
  IncidentField::State,
  IncidentField::Facility,
  IncidentField::Summary,
];

/// Values that stand in for "we don't know" and therefore carry no claim.
const PLACEHOLDERS: &[&str] =
  &["", "unknown", "n/a", "na", "none", "not specified", "-"];

/// Whether `value` is empty or one of the placeholder strings.
pub fn is_placeholder(value: &str) -> bool {
  let normalized = value.trim().to_lowercase();
  PLACEHOLDERS.contains(&normalized.as_str())
}

/// The editable part of an incident. Used both to create an incident and as
/// the body of a field edit (which replaces all of them; last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentFields {
  #[serde(default)]
  pub incident_type:       IncidentType,
  #[serde(default)]
  pub victim_name:         Option<String>,
  #[serde(default)]
  pub incident_date:       Option<NaiveDate>,
  #[serde(default)]
  pub subject_age:         Option<u32>,
  #[serde(default)]
  pub subject_gender:      Option<String>,
  #[serde(default)]
  pub subject_nationality: Option<String>,
  #[serde(default)]
  pub city:                Option<String>,
  #[serde(default)]
  pub state:               Option<String>,
  #[serde(default)]
  pub facility:            Option<String>,
  #[serde(default)]
  pub summary:             Option<String>,
}

impl IncidentFields {
  /// The display value of `field`, or `None` if unset.
  pub fn value(&self, field: IncidentField) -> Option<String> {
    match field {
      IncidentField::VictimName => self.victim_name.clone(),
      IncidentField::IncidentDate => self.incident_date.map(|d| d.to_string()),
      IncidentField::IncidentType => Some(self.incident_type.to_string()),
      IncidentField::SubjectAge => self.subject_age.map(|a| a.to_string()),
      IncidentField::SubjectGender => self.subject_gender.clone(),
      IncidentField::SubjectNationality => self.subject_nationality.clone(),
      IncidentField::City => self.city.clone(),
      IncidentField::State => self.state.clone(),
      IncidentField::Facility => self.facility.clone(),
      IncidentField::Summary => self.summary.clone(),
    }
  }

  /// Whether `field` holds a real claim (set, non-empty, not a placeholder).
  /// The default `other` incident type makes no claim.
  pub fn has_data(&self, field: IncidentField) -> bool {
    if field == IncidentField::IncidentType {
      return self.incident_type != IncidentType::Other;
    }
    self.value(field).is_some_and(|v| !is_placeholder(&v))
  }

  /// Set `field` from its textual form. An empty string clears it.
  pub fn set(&mut self, field: IncidentField, raw: &str) -> Result<()> {
    let trimmed = raw.trim();
    let text = (!trimmed.is_empty()).then(|| trimmed.to_owned());
    let invalid = || Error::InvalidFieldValue { field, value: raw.to_owned() };

    match field {
      IncidentField::VictimName => self.victim_name = text,
      IncidentField::IncidentDate => {
        self.incident_date = text
          .map(|t| t.parse::<NaiveDate>().map_err(|_| invalid()))
          .transpose()?;
      }
      IncidentField::IncidentType => {
        self.incident_type = match text {
          Some(t) => t.parse().map_err(|_| invalid())?,
          None => IncidentType::default(),
        };
      }
      IncidentField::SubjectAge => {
        self.subject_age = text
          .map(|t| t.parse::<u32>().map_err(|_| invalid()))
          .transpose()?;
      }
      IncidentField::SubjectGender => self.subject_gender = text,
      IncidentField::SubjectNationality => self.subject_nationality = text,
      IncidentField::City => self.city = text,
      IncidentField::State => self.state = text,
      IncidentField::Facility => self.facility = text,
      IncidentField::Summary => self.summary = text,
    }
    Ok(())
  }
}

// ─── Incident ────────────────────────────────────────────────────────────────

/// A documented case under review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
  pub id:                  i64,
  /// Stable public identifier, safe to expose in URLs.
  pub incident_id:         Uuid,
  #[serde(flatten)]
  pub fields:              IncidentFields,
  pub verification_status: VerificationStatus,
  pub first_verified_by:   Option<i64>,
  pub first_verified_at:   Option<DateTime<Utc>>,
  pub second_verified_by:  Option<i64>,
  pub second_verified_at:  Option<DateTime<Utc>>,
  pub verified_at:         Option<DateTime<Utc>>,
  pub rejection_reason:    Option<String>,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

impl Incident {
  /// Flatten the incident into a scrollytelling record.
  pub fn to_record(&self) -> Result<Record> {
    match serde_json::to_value(self)? {
      serde_json::Value::Object(map) => Ok(map),
      _ => Ok(Record::new()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_advances_one_stage_at_a_time() {
    assert_eq!(VerificationStatus::Pending.next(), Some(VerificationStatus::FirstReview));
    assert_eq!(
      VerificationStatus::FirstReview.next(),
      Some(VerificationStatus::SecondReview)
    );
    assert_eq!(VerificationStatus::SecondReview.next(), Some(VerificationStatus::Verified));
    assert!(VerificationStatus::Verified.is_terminal());
    assert!(VerificationStatus::Rejected.is_terminal());
  }

  #[test]
  fn placeholders_carry_no_data() {
    let fields = IncidentFields {
      victim_name: Some("  Unknown ".into()),
      facility: Some("N/A".into()),
      city: Some("Tucson".into()),
      ..Default::default()
    };
    assert!(!fields.has_data(IncidentField::VictimName));
    assert!(!fields.has_data(IncidentField::Facility));
    assert!(fields.has_data(IncidentField::City));
    assert!(!fields.has_data(IncidentField::IncidentType));
  }

  #[test]
  fn set_parses_typed_fields() {
    let mut fields = IncidentFields::default();
    fields.set(IncidentField::IncidentDate, "2026-01-01").unwrap();
    fields.set(IncidentField::SubjectAge, "34").unwrap();
    fields.set(IncidentField::IncidentType, "death").unwrap();
    assert_eq!(fields.incident_date, NaiveDate::from_ymd_opt(2026, 1, 1));
    assert_eq!(fields.subject_age, Some(34));
    assert_eq!(fields.incident_type, IncidentType::Death);

    fields.set(IncidentField::SubjectAge, "").unwrap();
    assert_eq!(fields.subject_age, None);

    let err = fields.set(IncidentField::IncidentDate, "last tuesday").unwrap_err();
    assert!(matches!(err, Error::InvalidFieldValue { field: IncidentField::IncidentDate, .. }));
  }
}
