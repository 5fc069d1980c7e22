//! The duplicate-detection gate on the guest submission path.
//!
//! Given a candidate identity (name, date, facility, source URLs), the gate
//! reports existing incidents and sources that might describe the same case
//! and decides whether a new submission may go ahead.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::incident::VerificationStatus;

/// Pending guest submissions for one identity at which new submissions are
/// refused outright.
pub const MAX_PENDING_GUEST_SUBMISSIONS: u32 = 10;

// ─── Query ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateQuery {
  #[serde(default)]
  pub victim_name:   Option<String>,
  #[serde(default)]
  pub date_of_death: Option<NaiveDate>,
  #[serde(default)]
  pub facility:      Option<String>,
  #[serde(default)]
  pub source_urls:   Vec<String>,
}

impl DuplicateQuery {
  /// The trimmed victim name, if one was given.
  pub fn name(&self) -> Option<&str> {
    self.victim_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
  }

  pub fn facility(&self) -> Option<&str> {
    self.facility.as_deref().map(str::trim).filter(|f| !f.is_empty())
  }

  pub fn urls(&self) -> impl Iterator<Item = &str> {
    self.source_urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty())
  }

  /// Whether there is nothing to match against. A facility on its own does
  /// not identify anyone.
  pub fn is_empty(&self) -> bool {
    self.name().is_none() && self.date_of_death.is_none() && self.urls().next().is_none()
  }
}

// ─── Matches ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseMatch {
  pub id:                  i64,
  pub incident_id:         Uuid,
  pub victim_name:         Option<String>,
  pub incident_date:       Option<NaiveDate>,
  pub facility:            Option<String>,
  pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMatch {
  pub id:          i64,
  /// Row id of the incident the source is attached to.
  pub incident_id: i64,
  pub url:         String,
  pub title:       Option<String>,
}

/// Raw lookup results, before policy is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateMatches {
  pub cases:                     Vec<CaseMatch>,
  pub sources:                   Vec<SourceMatch>,
  pub pending_guest_submissions: u32,
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
  pub existing_cases:           Vec<CaseMatch>,
  pub existing_sources:         Vec<SourceMatch>,
  pub guest_submission_count:   u32,
  pub has_potential_duplicates: bool,
  pub has_verified_match:       bool,
  pub allow_submission:         bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reason:                   Option<String>,
}

impl DuplicateReport {
  /// The report for a query with nothing to match against.
  pub fn skipped() -> Self {
    Self {
      existing_cases:           Vec::new(),
      existing_sources:         Vec::new(),
      guest_submission_count:   0,
      has_potential_duplicates: false,
      has_verified_match:       false,
      allow_submission:         true,
      reason:                   None,
    }
  }

  /// Apply the gate policy to lookup results.
  pub fn assess(matches: DuplicateMatches) -> Self {
    let has_verified_match = matches
      .cases
      .iter()
      .any(|c| c.verification_status == VerificationStatus::Verified);
    let has_potential_duplicates = !matches.cases.is_empty() || !matches.sources.is_empty();
    let count = matches.pending_guest_submissions;

    let (allow_submission, reason) = if count >= MAX_PENDING_GUEST_SUBMISSIONS {
      (
        false,
        Some(format!(
          "{count} reports about this person are already awaiting review; \
           new submissions are paused until they are triaged"
        )),
      )
    } else if has_verified_match {
      (
        true,
        Some("a verified incident already documents this person; consider suggesting an edit"
          .to_owned()),
      )
    } else if has_potential_duplicates {
      (true, Some("possible duplicates are awaiting review".to_owned()))
    } else {
      (true, None)
    };

    Self {
      existing_cases: matches.cases,
      existing_sources: matches.sources,
      guest_submission_count: count,
      has_potential_duplicates,
      has_verified_match,
      allow_submission,
      reason,
    }
  }

  /// Decide what the submitter may do given their confirmation checkboxes.
  pub fn decide(&self, confirmations: Confirmations) -> GateDecision {
    if !self.allow_submission {
      return GateDecision::Blocked {
        reason: self.reason.clone().unwrap_or_default(),
      };
    }
    if self.has_verified_match {
      if confirmations.different_incident {
        return GateDecision::Proceed;
      }
      let incident_ids = self
        .existing_cases
        .iter()
        .filter(|c| c.verification_status == VerificationStatus::Verified)
        .map(|c| c.incident_id)
        .collect();
      return GateDecision::SuggestEdit { incident_ids };
    }
    if self.has_potential_duplicates && !confirmations.acknowledged_unverified {
      return GateDecision::NeedsAcknowledgement;
    }
    GateDecision::Proceed
  }
}

/// The submitter's answers to the gate's confirmation checkboxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Confirmations {
  /// "This is a different incident": overrides a verified match.
  pub different_incident:      bool,
  /// "I understand similar reports are pending": clears the soft warning.
  pub acknowledged_unverified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
  Proceed,
  /// Steer the submitter toward editing the existing verified record(s).
  SuggestEdit { incident_ids: Vec<Uuid> },
  /// Unverified matches exist; the submitter must acknowledge them.
  NeedsAcknowledgement,
  Blocked { reason: String },
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Anything that can answer a duplicate query: the HTTP API, a store.
pub trait DuplicateLookup: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn lookup<'a>(
    &'a self,
    query: &'a DuplicateQuery,
  ) -> impl Future<Output = Result<DuplicateReport, Self::Error>> + Send + 'a;
}

/// Run the gate against `lookup`.
///
/// A query without identifying fields is allowed without a lookup. A failed
/// lookup fails open: reporting must not be blocked by infrastructure.
pub async fn check_duplicates<L: DuplicateLookup>(
  lookup: &L,
  query: &DuplicateQuery,
) -> DuplicateReport {
  if query.is_empty() {
    return DuplicateReport::skipped();
  }
  match lookup.lookup(query).await {
    Ok(report) => report,
    Err(e) => {
      tracing::warn!(error = %e, "duplicate check failed; allowing submission");
      DuplicateReport::skipped()
    }
  }
}
