//! Plain-text rendering of API results for the terminal.

use std::fmt::Write as _;

use witness_core::{
  duplicate::{DuplicateReport, GateDecision},
  incident::{Incident, LINKABLE_FIELDS},
  legal::LegalReference,
  review::ReviewIssue,
};

use crate::client::VerifyView;

const NONE: &str = "—";

/// One line of the review queue.
pub fn queue_line(incident: &Incident) -> String {
  let f = &incident.fields;
  format!(
    "{:>5}  {:<13}  {:<10}  {:<28}  {}",
    incident.id,
    incident.verification_status.to_string(),
    f.incident_date.map_or_else(|| NONE.to_owned(), |d| d.to_string()),
    f.victim_name.as_deref().unwrap_or(NONE),
    f.facility.as_deref().unwrap_or(NONE),
  )
}

pub fn issues(issues: &[ReviewIssue]) -> String {
  issues.iter().map(|i| format!("  ✗ {i}\n")).collect()
}

/// The dossier as a reviewer reads it: populated fields with the quote
/// backing each, then evidence counts and outstanding issues.
pub fn dossier(view: &VerifyView) -> String {
  let d = &view.dossier;
  let incident = &d.incident;
  let map = d.field_quote_map();
  let mut out = String::new();

  let _ = writeln!(
    out,
    "Incident {} ({}) — {}",
    incident.id,
    incident.incident_id,
    incident.verification_status.to_string()
  );
  for field in LINKABLE_FIELDS {
    let Some(value) = incident.fields.value(*field) else {
      continue;
    };
    let backing = map
      .get((*field).into())
      .and_then(|id| d.quote(id))
      .map_or_else(|| "unlinked".to_owned(), |q| format!("“{}”", q.value.quote_text));
    let _ = writeln!(out, "  {:<20} {:<30} {}", field.to_string(), value, backing);
  }
  let _ = writeln!(
    out,
    "  {} agencies, {} violations, {} sources, {} quotes, {} media, {} timeline entries",
    d.agencies.len(),
    d.violations.len(),
    d.sources.len(),
    d.quotes.len(),
    d.media.len(),
    d.timeline.len()
  );
  if view.validation_issues.is_empty() {
    out.push_str("  ready for review\n");
  } else {
    out.push_str(&issues(&view.validation_issues));
  }
  out
}

pub fn duplicate_report(report: &DuplicateReport) -> String {
  let mut out = String::new();
  for case in &report.existing_cases {
    let _ = writeln!(
      out,
      "  case {} {} ({}) {}",
      case.id,
      case.victim_name.as_deref().unwrap_or(NONE),
      case.verification_status,
      case.incident_date.map_or_else(String::new, |d| d.to_string()),
    );
  }
  for source in &report.existing_sources {
    let _ = writeln!(out, "  source {} on incident {}", source.url, source.incident_id);
  }
  if report.guest_submission_count > 0 {
    let _ = writeln!(out, "  {} pending guest report(s)", report.guest_submission_count);
  }
  if let Some(reason) = &report.reason {
    let _ = writeln!(out, "{reason}");
  }
  if !report.has_potential_duplicates && report.reason.is_none() {
    out.push_str("no duplicates found\n");
  }
  out
}

pub fn decision(decision: &GateDecision) -> String {
  match decision {
    GateDecision::Proceed => "submitting".to_owned(),
    GateDecision::SuggestEdit { incident_ids } => {
      let ids: Vec<_> = incident_ids.iter().map(ToString::to_string).collect();
      format!(
        "a verified incident already documents this person ({}); suggest an edit there, \
         or pass --different-incident",
        ids.join(", ")
      )
    }
    GateDecision::NeedsAcknowledgement => {
      "similar reports are awaiting review; pass --acknowledge to submit anyway".to_owned()
    }
    GateDecision::Blocked { reason } => format!("submission blocked: {reason}"),
  }
}

pub fn legal(reference: &LegalReference) -> String {
  let mut out = format!("{}\n  {}\n", reference.amendment, reference.constitutional_text);
  for case in reference.cases {
    let _ = writeln!(out, "  • {}: {}", case.label(), case.holding);
  }
  out
}

#[cfg(test)]
mod tests {
  use witness_core::{
    duplicate::{CaseMatch, DuplicateMatches},
    incident::VerificationStatus,
    tags::ViolationKind,
  };

  use super::*;

  #[test]
  fn blocked_report_shows_reason() {
    let report = DuplicateReport::assess(DuplicateMatches {
      pending_guest_submissions: 12,
      ..Default::default()
    });
    let text = duplicate_report(&report);
    assert!(text.contains("12 pending guest report(s)"));
    assert!(text.contains("awaiting review"));
  }

  #[test]
  fn empty_report_says_so() {
    assert_eq!(duplicate_report(&DuplicateReport::skipped()), "no duplicates found\n");
  }

  #[test]
  fn suggest_edit_names_the_incident() {
    let report = DuplicateReport::assess(DuplicateMatches {
      cases: vec![CaseMatch {
        id:                  3,
        incident_id:         uuid_like(),
        victim_name:         Some("Jane Doe".into()),
        incident_date:       None,
        facility:            None,
        verification_status: VerificationStatus::Verified,
      }],
      ..Default::default()
    });
    let text = decision(&report.decide(Default::default()));
    assert!(text.contains(&uuid_like().to_string()));
    assert!(text.contains("--different-incident"));
  }

  #[test]
  fn legal_lists_citations() {
    let text = legal(witness_core::legal::reference(ViolationKind::MedicalNeglect));
    assert!(text.starts_with("Eighth Amendment"));
    assert!(text.contains("Estelle v. Gamble, 429 U.S. 97 (1976)"));
  }

  fn uuid_like() -> uuid::Uuid { "6f1c2a9e-4a4b-4c55-9a57-0c1b6d3e2f10".parse().unwrap() }
}
