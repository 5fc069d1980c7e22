//! Record filters: a map of field name to clause, all clauses AND-ed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
  Record,
  coerce::{js_equal, to_number},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(BTreeMap<String, FilterClause>);

impl Filter {
  pub fn new() -> Self { Self::default() }

  pub fn with(mut self, field: impl Into<String>, clause: FilterClause) -> Self {
    self.0.insert(field.into(), clause);
    self
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterClause {
  /// Membership: the field equals one of the listed values.
  OneOf(Vec<Value>),
  /// Inclusive numeric range on whichever bounds are present.
  Range(RangeClause),
  Equals(Value),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeClause {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max: Option<f64>,
}

impl FilterClause {
  pub fn range(min: Option<f64>, max: Option<f64>) -> Self { Self::Range(RangeClause { min, max }) }

  pub fn matches(&self, value: Option<&Value>) -> bool {
    match self {
      Self::OneOf(options) => options.iter().any(|o| js_equal(value, o)),
      Self::Range(RangeClause { min, max }) => {
        let n = to_number(value);
        // NaN fails every comparison, so non-numeric values never match.
        min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi) && !n.is_nan()
      }
      Self::Equals(expected) => js_equal(value, expected),
    }
  }
}

pub fn matches_filter(record: &Record, filter: &Filter) -> bool {
  filter.0.iter().all(|(field, clause)| clause.matches(record.get(field)))
}

/// The records that satisfy every clause of `filter`, in input order.
pub fn apply_filter<'a, I>(records: I, filter: &Filter) -> Vec<&'a Record>
where
  I: IntoIterator<Item = &'a Record>,
{
  records.into_iter().filter(|r| matches_filter(r, filter)).collect()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn records() -> Vec<Record> {
    [
      json!({"state": "TX", "age": 34}),
      json!({"state": "GA", "age": "51"}),
      json!({"state": "TX", "age": "unknown"}),
      json!({"state": "CA", "age": null}),
      json!({"state": "TX"}),
    ]
    .into_iter()
    .filter_map(|v| v.as_object().cloned())
    .collect()
  }

  #[test]
  fn clauses_deserialize_by_shape() {
    let filter: Filter =
      serde_json::from_value(json!({"state": ["TX", "GA"], "age": {"min": 18}, "city": "Austin"}))
        .unwrap();
    assert_eq!(filter.0["state"], FilterClause::OneOf(vec![json!("TX"), json!("GA")]));
    assert_eq!(filter.0["age"], FilterClause::range(Some(18.0), None));
    assert_eq!(filter.0["city"], FilterClause::Equals(json!("Austin")));
  }

  #[test]
  fn clauses_are_anded() {
    let records = records();
    let filter = Filter::new()
      .with("state", FilterClause::OneOf(vec![json!("TX")]))
      .with("age", FilterClause::range(Some(30.0), Some(60.0)));
    let hits = apply_filter(&records, &filter);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["age"], json!(34));
  }

  #[test]
  fn range_coerces_and_excludes_nan() {
    let records = records();
    let filter = Filter::new().with("age", FilterClause::range(None, Some(100.0)));
    let ages: Vec<_> = apply_filter(&records, &filter).iter().map(|r| r.get("age").cloned()).collect();
    // "unknown" and the missing age are NaN; null coerces to 0.
    assert_eq!(ages, vec![Some(json!(34)), Some(json!("51")), Some(json!(null))]);
  }

  #[test]
  fn range_filtering_is_idempotent() {
    let records = records();
    let filter = Filter::new().with("age", FilterClause::range(Some(20.0), Some(40.0)));
    let once = apply_filter(&records, &filter);
    let twice = apply_filter(once.iter().copied(), &filter);
    assert_eq!(once, twice);
  }

  #[test]
  fn empty_filter_keeps_everything() {
    let records = records();
    assert_eq!(apply_filter(&records, &Filter::new()).len(), records.len());
  }
}
