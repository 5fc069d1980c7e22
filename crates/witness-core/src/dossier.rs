//! [`Dossier`]: an incident together with every attachment a reviewer works
//! on.

use serde::{Deserialize, Serialize};

use crate::{
  evidence::{Media, Quote, Source, TimelineEntry},
  field::FieldKey,
  incident::{Incident, LINKABLE_FIELDS},
  linking::FieldQuoteMap,
  record::Persisted,
  tags::{Agency, Violation},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dossier {
  pub incident:   Incident,
  pub agencies:   Vec<Persisted<Agency>>,
  pub violations: Vec<Persisted<Violation>>,
  pub sources:    Vec<Persisted<Source>>,
  pub quotes:     Vec<Persisted<Quote>>,
  pub media:      Vec<Persisted<Media>>,
  /// Ordered by `sequence_order`.
  pub timeline:   Vec<Persisted<TimelineEntry>>,
}

impl Dossier {
  pub fn new(incident: Incident) -> Self {
    Self {
      incident,
      agencies: Vec::new(),
      violations: Vec::new(),
      sources: Vec::new(),
      quotes: Vec::new(),
      media: Vec::new(),
      timeline: Vec::new(),
    }
  }

  /// Every field key that currently holds a claim needing evidence: populated
  /// linkable fields, then one key per agency and per violation.
  pub fn fields_with_data(&self) -> Vec<FieldKey> {
    let fields = LINKABLE_FIELDS
      .iter()
      .filter(|f| self.incident.fields.has_data(**f))
      .map(|f| FieldKey::Field(*f));
    let agencies = self.agencies.iter().map(|a| FieldKey::Agency(a.value.agency));
    let violations = self
      .violations
      .iter()
      .map(|v| FieldKey::Violation(v.value.violation_type));
    fields.chain(agencies).chain(violations).collect()
  }

  pub fn field_quote_map(&self) -> FieldQuoteMap { FieldQuoteMap::from_quotes(&self.quotes) }

  pub fn quote(&self, id: i64) -> Option<&Persisted<Quote>> {
    self.quotes.iter().find(|q| q.id == id)
  }
}
