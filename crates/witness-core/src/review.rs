//! The verification state machine.
//!
//! A review submission advances an incident exactly one stage. Before it may
//! do so, the transition guard checks the dossier's evidentiary completeness
//! and the reviewer's checklist, and the role guard checks that the second
//! review is done by someone other than the first reviewer. All failures are
//! collected so the reviewer can fix everything in one pass.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::{
  dossier::Dossier,
  field::FieldKey,
  incident::{Incident, VerificationStatus},
};

// ─── Reviewers ───────────────────────────────────────────────────────────────

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
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  Viewer,
  Analyst,
  Editor,
  Admin,
}

impl Role {
  /// Analysts and above may submit reviews and reject incidents.
  pub fn can_review(self) -> bool { !matches!(self, Self::Viewer) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
  pub id:   i64,
  pub name: String,
  pub role: Role,
}

// ─── Checklist ───────────────────────────────────────────────────────────────

/// The reviewer's per-session verification checkboxes.
///
/// Never persisted: a checklist lives in the reviewer's session and travels
/// with the review submission that it gates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewChecklist {
  pub fields:   BTreeSet<FieldKey>,
  pub sources:  BTreeSet<i64>,
  pub quotes:   BTreeSet<i64>,
  pub timeline: BTreeSet<i64>,
  pub media:    BTreeSet<i64>,
}

impl ReviewChecklist {
  /// A checklist with every box in `dossier` ticked.
  pub fn all_checked(dossier: &Dossier) -> Self {
    Self {
      fields:   dossier.fields_with_data().into_iter().collect(),
      sources:  dossier.sources.iter().map(|s| s.id).collect(),
      quotes:   dossier.quotes.iter().map(|q| q.id).collect(),
      timeline: dossier.timeline.iter().map(|t| t.id).collect(),
      media:    dossier.media.iter().map(|m| m.id).collect(),
    }
  }
}

// ─── Issues ──────────────────────────────────────────────────────────────────

/// One reason a review submission is blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ReviewIssue {
  UnlinkedField { field: FieldKey },
  QuoteWithoutSource { quote_id: i64 },
  QuoteSourceMissing { quote_id: i64, source_id: i64 },
  UnverifiedQuote { quote_id: i64 },
  UncheckedField { field: FieldKey },
  UncheckedSource { source_id: i64 },
  UncheckedQuote { quote_id: i64 },
  UncheckedTimeline { timeline_id: i64 },
  UncheckedMedia { media_id: i64 },
  SameReviewer { reviewer_id: i64 },
  InsufficientRole { reviewer_id: i64, role: Role },
}

impl ReviewIssue {
  /// Permission issues cannot be fixed by editing; they need another user.
  pub fn is_permission(&self) -> bool {
    matches!(self, Self::SameReviewer { .. } | Self::InsufficientRole { .. })
  }
}

impl fmt::Display for ReviewIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnlinkedField { field } => write!(f, "field {field} has no linked quote"),
      Self::QuoteWithoutSource { quote_id } => {
        write!(f, "quote {quote_id} is not attached to a source")
      }
      Self::QuoteSourceMissing { quote_id, source_id } => {
        write!(f, "quote {quote_id} cites source {source_id}, which is not in this incident")
      }
      Self::UnverifiedQuote { quote_id } => write!(f, "quote {quote_id} is not verified"),
      Self::UncheckedField { field } => write!(f, "field {field} has not been checked"),
      Self::UncheckedSource { source_id } => {
        write!(f, "source {source_id} has not been checked")
      }
      Self::UncheckedQuote { quote_id } => write!(f, "quote {quote_id} has not been checked"),
      Self::UncheckedTimeline { timeline_id } => {
        write!(f, "timeline entry {timeline_id} has not been checked")
      }
      Self::UncheckedMedia { media_id } => write!(f, "media {media_id} has not been checked"),
      Self::SameReviewer { .. } => {
        write!(f, "the first reviewer cannot also perform the second review")
      }
      Self::InsufficientRole { role, .. } => {
        write!(f, "a {role} may not review or reject incidents")
      }
    }
  }
}

/// Issues that depend only on persisted data: unlinked fields, quotes
/// without a source of this incident, unverified quotes.
pub fn evidentiary_issues(dossier: &Dossier) -> Vec<ReviewIssue> {
  let links = dossier.field_quote_map();
  let mut issues: Vec<ReviewIssue> = dossier
    .fields_with_data()
    .into_iter()
    .filter(|field| !links.contains(*field))
    .map(|field| ReviewIssue::UnlinkedField { field })
    .collect();

  let source_ids: BTreeSet<i64> = dossier.sources.iter().map(|s| s.id).collect();
  for quote in &dossier.quotes {
    match quote.value.source_id {
      None => issues.push(ReviewIssue::QuoteWithoutSource { quote_id: quote.id }),
      Some(source_id) if !source_ids.contains(&source_id) => {
        issues.push(ReviewIssue::QuoteSourceMissing { quote_id: quote.id, source_id });
      }
      Some(_) => {}
    }
  }
  for quote in &dossier.quotes {
    if !quote.value.verified {
      issues.push(ReviewIssue::UnverifiedQuote { quote_id: quote.id });
    }
  }
  issues
}

/// Issues from boxes the reviewer has not ticked.
pub fn checklist_issues(dossier: &Dossier, checklist: &ReviewChecklist) -> Vec<ReviewIssue> {
  let fields = dossier
    .fields_with_data()
    .into_iter()
    .filter(|field| !checklist.fields.contains(field))
    .map(|field| ReviewIssue::UncheckedField { field });
  let sources = dossier
    .sources
    .iter()
    .filter(|s| !checklist.sources.contains(&s.id))
    .map(|s| ReviewIssue::UncheckedSource { source_id: s.id });
  let quotes = dossier
    .quotes
    .iter()
    .filter(|q| !checklist.quotes.contains(&q.id))
    .map(|q| ReviewIssue::UncheckedQuote { quote_id: q.id });
  let timeline = dossier
    .timeline
    .iter()
    .filter(|t| !checklist.timeline.contains(&t.id))
    .map(|t| ReviewIssue::UncheckedTimeline { timeline_id: t.id });
  let media = dossier
    .media
    .iter()
    .filter(|m| !checklist.media.contains(&m.id))
    .map(|m| ReviewIssue::UncheckedMedia { media_id: m.id });

  fields.chain(sources).chain(quotes).chain(timeline).chain(media).collect()
}

/// Viewers may not review at all.
pub fn permission_issue(reviewer: &Reviewer) -> Option<ReviewIssue> {
  (!reviewer.role.can_review())
    .then_some(ReviewIssue::InsufficientRole { reviewer_id: reviewer.id, role: reviewer.role })
}

/// The reviewer lock: at `first_review`, the first reviewer may not submit
/// again unless they are an admin.
pub fn role_issue(incident: &Incident, reviewer: &Reviewer) -> Option<ReviewIssue> {
  let locked = incident.verification_status == VerificationStatus::FirstReview
    && incident.first_verified_by == Some(reviewer.id)
    && reviewer.role != Role::Admin;
  locked.then_some(ReviewIssue::SameReviewer { reviewer_id: reviewer.id })
}

// ─── Transitions ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ReviewError {
  #[error("incident is {0} and can no longer be reviewed")]
  Terminal(VerificationStatus),

  #[error("review blocked by {} issue(s)", .0.len())]
  Blocked(Vec<ReviewIssue>),
}

impl ReviewError {
  pub fn issues(&self) -> &[ReviewIssue] {
    match self {
      Self::Terminal(_) => &[],
      Self::Blocked(issues) => issues,
    }
  }
}

/// An accepted status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
  pub from:        VerificationStatus,
  pub to:          VerificationStatus,
  pub reviewer_id: i64,
  pub at:          DateTime<Utc>,
}

impl Transition {
  /// Record the transition on `incident`.
  pub fn apply(&self, incident: &mut Incident) {
    incident.verification_status = self.to;
    incident.updated_at = self.at;
    match self.to {
      VerificationStatus::FirstReview => {
        incident.first_verified_by = Some(self.reviewer_id);
        incident.first_verified_at = Some(self.at);
      }
      VerificationStatus::SecondReview => {
        incident.second_verified_by = Some(self.reviewer_id);
        incident.second_verified_at = Some(self.at);
      }
      VerificationStatus::Verified => incident.verified_at = Some(self.at),
      VerificationStatus::Pending | VerificationStatus::Rejected => {}
    }
  }

  /// Confirmation shown to the reviewer after the submission.
  pub fn message(&self) -> &'static str {
    match self.to {
      VerificationStatus::FirstReview => {
        "First review complete. The incident is queued for a second reviewer."
      }
      VerificationStatus::SecondReview => {
        "Second review complete. The incident is queued for final verification."
      }
      VerificationStatus::Verified => "Incident verified and published.",
      VerificationStatus::Rejected => "Incident rejected.",
      VerificationStatus::Pending => "Incident returned to the pending queue.",
    }
  }
}

/// Evaluate both guards and, if nothing blocks, return the transition to the
/// next stage.
pub fn submit_review(
  dossier: &Dossier,
  checklist: &ReviewChecklist,
  reviewer: &Reviewer,
  now: DateTime<Utc>,
) -> Result<Transition, ReviewError> {
  let from = dossier.incident.verification_status;
  let to = from.next().ok_or(ReviewError::Terminal(from))?;

  let mut issues = evidentiary_issues(dossier);
  issues.extend(checklist_issues(dossier, checklist));
  issues.extend(permission_issue(reviewer));
  issues.extend(role_issue(&dossier.incident, reviewer));

  if !issues.is_empty() {
    return Err(ReviewError::Blocked(issues));
  }
  Ok(Transition { from, to, reviewer_id: reviewer.id, at: now })
}

/// Move a non-terminal incident to `rejected`.
pub fn reject(
  incident: &mut Incident,
  reviewer: &Reviewer,
  reason: &str,
  now: DateTime<Utc>,
) -> Result<(), ReviewError> {
  if let Some(issue) = permission_issue(reviewer) {
    return Err(ReviewError::Blocked(vec![issue]));
  }
  let status = incident.verification_status;
  if status.is_terminal() {
    return Err(ReviewError::Terminal(status));
  }
  incident.verification_status = VerificationStatus::Rejected;
  incident.rejection_reason = Some(reason.trim().to_owned()).filter(|r| !r.is_empty());
  incident.updated_at = now;
  Ok(())
}
