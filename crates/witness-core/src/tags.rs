//! Agency and violation tags attached to an incident.
//!
//! Both are set-valued: an incident carries at most one row per
//! [`AgencyKind`] and at most one row per [`ViolationKind`]. For violations the
//! existence of the row *is* the "checked" state.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

// ─── Agencies ────────────────────────────────────────────────────────────────

/// The fixed vocabulary of agencies an incident can involve.
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
pub enum AgencyKind {
  Ice,
  Cbp,
  LocalPolice,
  StatePolice,
  UsMarshals,
  FederalBureauOfPrisons,
  PrivateContractor,
  Other,
}

/// An agency involved in an incident, with a free-text description of its
/// role (e.g. "arresting agency", "operated the facility").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
  pub agency: AgencyKind,
  #[serde(default)]
  pub role:   Option<String>,
}

impl Agency {
  pub fn new(agency: AgencyKind) -> Self { Self { agency, role: None } }
}

// ─── Violations ──────────────────────────────────────────────────────────────

/// Constitutional or legal categories a violation can fall under.
///
/// See [`crate::legal`] for the constitutional text and case law behind each.
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
pub enum ViolationKind {
  ExcessiveForce,
  MedicalNeglect,
  UnlawfulDetention,
  DueProcess,
  UnreasonableSearch,
  FirstAmendmentRetaliation,
  EqualProtection,
  ConditionsOfConfinement,
}

/// A documented violation. `constitutional_basis` is either one of the case
/// citations from [`crate::legal::reference`] or free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
  pub violation_type:       ViolationKind,
  #[serde(default)]
  pub description:          Option<String>,
  #[serde(default)]
  pub constitutional_basis: Option<String>,
}

impl Violation {
  pub fn new(violation_type: ViolationKind) -> Self {
    Self { violation_type, description: None, constitutional_basis: None }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn agency_kind_string_forms_agree_with_serde() {
    let json = serde_json::to_string(&AgencyKind::LocalPolice).unwrap();
    assert_eq!(json, "\"local_police\"");
    assert_eq!(AgencyKind::LocalPolice.to_string(), "local_police");
    assert_eq!(AgencyKind::from_str("us_marshals").unwrap(), AgencyKind::UsMarshals);
  }

  #[test]
  fn unknown_violation_kind_is_rejected() {
    assert!(ViolationKind::from_str("jaywalking").is_err());
  }
}
