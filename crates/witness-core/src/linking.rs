//! Quote ↔ field linking.
//!
//! A field is backed by at most one quote at a time; a quote may back many
//! fields. The association is stored on the quote (`linked_fields`) and the
//! field → quote direction is derived from it.

use std::{
  collections::BTreeMap,
  time::{Duration, Instant},
};

use serde::Serialize;

use crate::{
  Error, Result,
  evidence::Quote,
  field::FieldKey,
  record::{AttachmentKind, Persisted},
};

// ─── Field → quote map ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldQuoteMap(BTreeMap<FieldKey, i64>);

impl FieldQuoteMap {
  /// Derive the map from quotes. If stored data links a field to several
  /// quotes, the lowest quote id wins.
  pub fn from_quotes(quotes: &[Persisted<Quote>]) -> Self {
    let mut sorted: Vec<&Persisted<Quote>> = quotes.iter().collect();
    sorted.sort_by_key(|q| q.id);

    let mut map = BTreeMap::new();
    for quote in sorted {
      for field in &quote.value.linked_fields {
        map.entry(*field).or_insert(quote.id);
      }
    }
    Self(map)
  }

  pub fn get(&self, field: FieldKey) -> Option<i64> { self.0.get(&field).copied() }

  pub fn contains(&self, field: FieldKey) -> bool { self.0.contains_key(&field) }

  pub fn iter(&self) -> impl Iterator<Item = (FieldKey, i64)> + '_ {
    self.0.iter().map(|(k, v)| (*k, *v))
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

// ─── Link / unlink ───────────────────────────────────────────────────────────

/// Link `field` to quote `quote_id`, detaching it from any other quote.
///
/// Returns the ids of quotes whose `linked_fields` changed, so callers only
/// persist those.
pub fn link_quote(
  quotes: &mut [Persisted<Quote>],
  field: FieldKey,
  quote_id: i64,
) -> Result<Vec<i64>> {
  if !quotes.iter().any(|q| q.id == quote_id) {
    return Err(Error::AttachmentNotFound {
      kind:        AttachmentKind::Quote,
      id:          quote_id,
      incident_id: quotes.first().map_or(0, |q| q.incident_id),
    });
  }

  let mut changed = Vec::new();
  for quote in quotes.iter_mut() {
    let modified = if quote.id == quote_id {
      quote.value.linked_fields.insert(field)
    } else {
      quote.value.linked_fields.remove(&field)
    };
    if modified {
      changed.push(quote.id);
    }
  }
  Ok(changed)
}

/// Remove `field` from whichever quote backs it. The quote itself is kept
/// even if it no longer backs anything.
pub fn unlink_quote(quotes: &mut [Persisted<Quote>], field: FieldKey) -> Vec<i64> {
  quotes
    .iter_mut()
    .filter_map(|q| q.value.linked_fields.remove(&field).then_some(q.id))
    .collect()
}

// ─── Suggestions ─────────────────────────────────────────────────────────────

/// Quotes whose text contains `typed`, case-insensitively. An empty search
/// suggests nothing.
pub fn suggest_quotes<'a>(quotes: &'a [Persisted<Quote>], typed: &str) -> Vec<&'a Persisted<Quote>> {
  let needle = typed.trim().to_lowercase();
  if needle.is_empty() {
    return Vec::new();
  }
  quotes
    .iter()
    .filter(|q| q.value.quote_text.to_lowercase().contains(&needle))
    .collect()
}

/// Inactivity window after which a reviewer is no longer "typing".
pub const DEBOUNCE: Duration = Duration::from_secs(2);

/// Tracks keystrokes in a linkable field so suggestions appear only after
/// the reviewer pauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypingState {
  last_input: Option<Instant>,
}

impl TypingState {
  pub fn record_input(&mut self, at: Instant) { self.last_input = Some(at); }

  pub fn is_typing(&self, now: Instant) -> bool {
    self
      .last_input
      .is_some_and(|last| now.saturating_duration_since(last) < DEBOUNCE)
  }

  /// Whether suggestions should be shown: input happened and has settled.
  pub fn should_suggest(&self, now: Instant) -> bool {
    self.last_input.is_some() && !self.is_typing(now)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{incident::IncidentField, tags::AgencyKind};

  fn quote(id: i64, text: &str) -> Persisted<Quote> {
    Persisted { id, incident_id: 4, value: Quote::new(text) }
  }

  const NAME: FieldKey = FieldKey::Field(IncidentField::VictimName);

  #[test]
  fn linking_moves_field_between_quotes() {
    let mut quotes = vec![quote(1, "a"), quote(2, "b")];
    assert_eq!(link_quote(&mut quotes, NAME, 1).unwrap(), vec![1]);
    assert_eq!(FieldQuoteMap::from_quotes(&quotes).get(NAME), Some(1));

    let changed = link_quote(&mut quotes, NAME, 2).unwrap();
    assert_eq!(changed, vec![1, 2]);
    assert_eq!(FieldQuoteMap::from_quotes(&quotes).get(NAME), Some(2));
    assert!(quotes[0].value.linked_fields.is_empty());
  }

  #[test]
  fn relinking_same_quote_changes_nothing() {
    let mut quotes = vec![quote(1, "a")];
    link_quote(&mut quotes, NAME, 1).unwrap();
    assert!(link_quote(&mut quotes, NAME, 1).unwrap().is_empty());
  }

  #[test]
  fn one_quote_backs_many_fields() {
    let mut quotes = vec![quote(1, "a")];
    link_quote(&mut quotes, NAME, 1).unwrap();
    link_quote(&mut quotes, AgencyKind::Ice.into(), 1).unwrap();
    let map = FieldQuoteMap::from_quotes(&quotes);
    assert_eq!(map.len(), 2);
    assert!(map.iter().all(|(_, q)| q == 1));
  }

  #[test]
  fn unlink_keeps_orphaned_quote() {
    let mut quotes = vec![quote(1, "a")];
    link_quote(&mut quotes, NAME, 1).unwrap();
    assert_eq!(unlink_quote(&mut quotes, NAME), vec![1]);
    assert_eq!(quotes.len(), 1);
    assert!(FieldQuoteMap::from_quotes(&quotes).is_empty());
  }

  #[test]
  fn link_to_missing_quote_fails() {
    let mut quotes = vec![quote(1, "a")];
    assert!(link_quote(&mut quotes, NAME, 99).is_err());
  }

  #[test]
  fn suggestions_are_case_insensitive_substrings() {
    let quotes = vec![
      quote(1, "Officers said Jane Doe resisted."),
      quote(2, "The facility declined to comment."),
    ];
    let hits = suggest_quotes(&quotes, "jane DOE");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 1);
    assert!(suggest_quotes(&quotes, "   ").is_empty());
  }

  #[test]
  fn typing_ends_after_debounce() {
    let start = Instant::now();
    let mut typing = TypingState::default();
    assert!(!typing.should_suggest(start));

    typing.record_input(start);
    assert!(typing.is_typing(start + Duration::from_millis(1500)));
    assert!(!typing.should_suggest(start + Duration::from_millis(1500)));
    assert!(typing.should_suggest(start + DEBOUNCE));
  }
}
