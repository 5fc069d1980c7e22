//! [`FieldKey`]: the closed set of things a quote can substantiate.
//!
//! On the wire a key is a plain string: the incident field name
//! (`victim_name`), or an agency/violation tag prefixed with its kind
//! (`agency_ice`, `violation_excessive_force`).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
  Error,
  incident::IncidentField,
  tags::{AgencyKind, ViolationKind},
};

const AGENCY_PREFIX: &str = "agency_";
const VIOLATION_PREFIX: &str = "violation_";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum FieldKey {
  Field(IncidentField),
  Agency(AgencyKind),
  Violation(ViolationKind),
}

impl fmt::Display for FieldKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Field(field) => write!(f, "{field}"),
      Self::Agency(kind) => write!(f, "{AGENCY_PREFIX}{kind}"),
      Self::Violation(kind) => write!(f, "{VIOLATION_PREFIX}{kind}"),
    }
  }
}

impl FromStr for FieldKey {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let unknown = || Error::UnknownFieldKey(s.to_owned());
    if let Some(rest) = s.strip_prefix(AGENCY_PREFIX) {
      return rest.parse().map(Self::Agency).map_err(|_| unknown());
    }
    if let Some(rest) = s.strip_prefix(VIOLATION_PREFIX) {
      return rest.parse().map(Self::Violation).map_err(|_| unknown());
    }
    s.parse().map(Self::Field).map_err(|_| unknown())
  }
}

impl TryFrom<String> for FieldKey {
  type Error = Error;

  fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<FieldKey> for String {
  fn from(key: FieldKey) -> Self { key.to_string() }
}

impl From<IncidentField> for FieldKey {
  fn from(field: IncidentField) -> Self { Self::Field(field) }
}

impl From<AgencyKind> for FieldKey {
  fn from(kind: AgencyKind) -> Self { Self::Agency(kind) }
}

impl From<ViolationKind> for FieldKey {
  fn from(kind: ViolationKind) -> Self { Self::Violation(kind) }
}
