//! Guest submissions: untrusted reports awaiting triage.
//!
//! A submission is either promoted into an incident, marked reviewed or
//! rejected, or soft-deleted with a reason.

use std::{
  collections::{BTreeMap, BTreeSet},
  str::FromStr,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  Error, Result,
  duplicate::DuplicateQuery,
  evidence::{Media, Quote, Source, normalize_url},
  field::FieldKey,
  incident::{IncidentFields, IncidentType},
  record::Stored,
  tags::{Agency, AgencyKind},
};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GuestStatus {
  #[default]
  Pending,
  Reviewed,
  Promoted,
  Rejected,
}

/// A quote captured with a report, optionally backing one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestQuote {
  pub text:         String,
  #[serde(default)]
  pub source_url:   Option<String>,
  #[serde(default)]
  pub linked_field: Option<FieldKey>,
}

/// What a guest actually typed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestReport {
  #[serde(default)]
  pub victim_name:     Option<String>,
  #[serde(default)]
  pub date_of_death:   Option<NaiveDate>,
  #[serde(default)]
  pub incident_type:   Option<IncidentType>,
  #[serde(default)]
  pub facility:        Option<String>,
  #[serde(default)]
  pub city:            Option<String>,
  #[serde(default)]
  pub state:           Option<String>,
  #[serde(default)]
  pub summary:         Option<String>,
  /// Agency checkboxes as submitted, keyed by agency name.
  #[serde(default)]
  pub agencies:        BTreeMap<String, bool>,
  #[serde(default)]
  pub source_urls:     Vec<String>,
  #[serde(default)]
  pub media_urls:      Vec<String>,
  #[serde(default)]
  pub quotes:          Vec<GuestQuote>,
  #[serde(default)]
  pub submitter_email: Option<String>,
}

impl GuestReport {
  pub fn duplicate_query(&self) -> DuplicateQuery {
    DuplicateQuery {
      victim_name:   self.victim_name.clone(),
      date_of_death: self.date_of_death,
      facility:      self.facility.clone(),
      source_urls:   self.source_urls.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestSubmission {
  pub id:              i64,
  pub submitted_at:    DateTime<Utc>,
  #[serde(flatten)]
  pub report:          GuestReport,
  pub status:          GuestStatus,
  /// Row id of the incident this submission was promoted into.
  pub incident_id:     Option<i64>,
  pub deleted_at:      Option<DateTime<Utc>>,
  pub deletion_reason: Option<String>,
}

impl GuestSubmission {
  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }

  /// Convert the submission into unsaved incident records.
  ///
  /// Agency keys that are `true` become agency drafts (unknown keys are
  /// skipped); each distinct source URL becomes a source draft; each media
  /// URL a media draft. Quotes become quote drafts tied to the source draft
  /// for their URL, and keep their field link unless an earlier quote
  /// already backs that field.
  pub fn promote(&self) -> Result<Promotion> {
    if self.is_deleted() {
      return Err(Error::NotPromotable { id: self.id, reason: "it has been deleted" });
    }
    if self.status == GuestStatus::Promoted {
      return Err(Error::NotPromotable { id: self.id, reason: "it was already promoted" });
    }

    let r = &self.report;
    let incident = IncidentFields {
      incident_type: r.incident_type.unwrap_or(if r.date_of_death.is_some() {
        IncidentType::Death
      } else {
        IncidentType::Other
      }),
      victim_name: r.victim_name.clone(),
      incident_date: r.date_of_death,
      facility: r.facility.clone(),
      city: r.city.clone(),
      state: r.state.clone(),
      summary: r.summary.clone(),
      ..Default::default()
    };

    let agencies = r
      .agencies
      .iter()
      .filter(|(_, checked)| **checked)
      .filter_map(|(key, _)| match AgencyKind::from_str(key) {
        Ok(kind) => Some(Stored::Draft(Agency::new(kind))),
        Err(_) => {
          tracing::debug!(agency = %key, submission = self.id, "skipping unknown agency key");
          None
        }
      })
      .collect();

    let mut sources = Vec::new();
    for url in r.source_urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
      source_slot(&mut sources, url);
    }

    let mut linked = BTreeSet::new();
    let mut quotes = Vec::new();
    for captured in &r.quotes {
      let text = captured.text.trim();
      if text.is_empty() {
        continue;
      }
      let source = captured
        .source_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(|u| source_slot(&mut sources, u));
      let mut quote = Quote::new(text);
      if let Some(field) = captured.linked_field.filter(|f| linked.insert(*f)) {
        quote.linked_fields.insert(field);
      }
      quotes.push(PromotedQuote { quote: Stored::Draft(quote), source });
    }

    let media = r
      .media_urls
      .iter()
      .map(|u| u.trim())
      .filter(|u| !u.is_empty())
      .map(|u| Stored::Draft(Media::from_url(u)))
      .collect();

    Ok(Promotion { submission_id: self.id, incident, agencies, sources, media, quotes })
  }
}

/// Index of the source draft for `url`, adding one if none matches.
fn source_slot(sources: &mut Vec<Stored<Source>>, url: &str) -> usize {
  let key = normalize_url(url);
  match sources.iter().position(|s| normalize_url(&s.value().url) == key) {
    Some(index) => index,
    None => {
      sources.push(Stored::Draft(Source::from_url(url)));
      sources.len() - 1
    }
  }
}

/// Unsaved records produced by promoting a guest submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
  pub submission_id: i64,
  pub incident:      IncidentFields,
  pub agencies:      Vec<Stored<Agency>>,
  pub sources:       Vec<Stored<Source>>,
  pub media:         Vec<Stored<Media>>,
  pub quotes:        Vec<PromotedQuote>,
}

/// A quote draft and the position of its source in [`Promotion::sources`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotedQuote {
  pub quote:  Stored<Quote>,
  pub source: Option<usize>,
}

/// A status change or soft delete. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestSubmissionPatch {
  pub id:              i64,
  #[serde(default)]
  pub status:          Option<GuestStatus>,
  #[serde(default)]
  pub deleted_at:      Option<DateTime<Utc>>,
  #[serde(default)]
  pub deletion_reason: Option<String>,
}

impl GuestSubmissionPatch {
  /// A soft delete must say why.
  pub fn validate(&self) -> Result<()> {
    let has_reason = self.deletion_reason.as_deref().is_some_and(|r| !r.trim().is_empty());
    if self.deleted_at.is_some() && !has_reason {
      return Err(Error::MissingDeletionReason);
    }
    Ok(())
  }

  /// Apply the patch to `submission`.
  pub fn apply(&self, submission: &mut GuestSubmission) -> Result<()> {
    self.validate()?;
    if let Some(status) = self.status {
      submission.status = status;
    }
    if let Some(at) = self.deleted_at {
      submission.deleted_at = Some(at);
      submission.deletion_reason = self.deletion_reason.as_deref().map(|r| r.trim().to_owned());
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{evidence::MediaType, incident::IncidentField};

  fn submission() -> GuestSubmission {
    GuestSubmission {
      id:              12,
      submitted_at:    Utc::now(),
      report:          GuestReport {
        victim_name: Some("Jane Doe".into()),
        date_of_death: NaiveDate::from_ymd_opt(2026, 1, 1),
        facility: Some("Stewart Detention Center".into()),
        agencies: BTreeMap::from([
          ("ice".to_owned(), true),
          ("cbp".to_owned(), false),
          ("space_force".to_owned(), true),
        ]),
        source_urls: vec![
          "https://news.example/jane".into(),
          "".into(),
          "https://NEWS.example/jane/".into(),
        ],
        media_urls: vec!["https://cdn.example/vigil.mp4".into()],
        quotes: vec![
          GuestQuote {
            text:         " Jane Doe died at Stewart. ".into(),
            source_url:   Some("https://news.example/jane".into()),
            linked_field: Some(IncidentField::VictimName.into()),
          },
          GuestQuote {
            text:         "Her family was not told for a week.".into(),
            source_url:   Some("https://tv.example/report".into()),
            linked_field: Some(IncidentField::VictimName.into()),
          },
          GuestQuote { text: "  ".into(), source_url: None, linked_field: None },
        ],
        ..Default::default()
      },
      status:          GuestStatus::Pending,
      incident_id:     None,
      deleted_at:      None,
      deletion_reason: None,
    }
  }

  #[test]
  fn promotion_produces_drafts() {
    let p = submission().promote().unwrap();
    assert_eq!(p.incident.victim_name.as_deref(), Some("Jane Doe"));
    assert_eq!(p.incident.incident_type, IncidentType::Death);
    assert_eq!(p.agencies.len(), 1);
    assert_eq!(p.agencies[0].value().agency, AgencyKind::Ice);
    // Duplicate URLs collapse; the second quote adds its own source.
    assert_eq!(p.sources.len(), 2);
    assert_eq!(p.media[0].value().media_type, MediaType::Video);
    assert!(p.agencies.iter().all(Stored::is_draft));
    assert!(p.sources.iter().all(|s| s.id().is_none()));
  }

  #[test]
  fn promoted_quotes_point_at_their_source_drafts() {
    let p = submission().promote().unwrap();
    assert_eq!(p.sources.len(), 2);
    assert_eq!(p.quotes.len(), 2);

    let first = &p.quotes[0];
    assert_eq!(first.source, Some(0));
    assert_eq!(first.quote.value().quote_text, "Jane Doe died at Stewart.");
    assert!(
      first
        .quote
        .value()
        .linked_fields
        .contains(&FieldKey::Field(IncidentField::VictimName))
    );

    // The second quote brings its own source and loses the field to the first.
    let second = &p.quotes[1];
    assert_eq!(second.source, Some(1));
    assert_eq!(p.sources[1].value().url, "https://tv.example/report");
    assert!(second.quote.value().linked_fields.is_empty());
  }

  #[test]
  fn deleted_or_promoted_submissions_cannot_be_promoted() {
    let mut s = submission();
    s.status = GuestStatus::Promoted;
    assert!(matches!(s.promote(), Err(Error::NotPromotable { .. })));

    let mut s = submission();
    s.deleted_at = Some(Utc::now());
    assert!(s.promote().is_err());
  }

  #[test]
  fn soft_delete_requires_reason() {
    let mut s = submission();
    let patch = GuestSubmissionPatch { id: 12, deleted_at: Some(Utc::now()), ..Default::default() };
    assert!(matches!(patch.apply(&mut s), Err(Error::MissingDeletionReason)));
    assert!(!s.is_deleted());

    let patch = GuestSubmissionPatch {
      id: 12,
      deleted_at: Some(Utc::now()),
      deletion_reason: Some(" spam ".into()),
      ..Default::default()
    };
    patch.apply(&mut s).unwrap();
    assert!(s.is_deleted());
    assert_eq!(s.deletion_reason.as_deref(), Some("spam"));
  }
}
