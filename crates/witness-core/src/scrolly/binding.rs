//! Data bindings: what number or record set a scene shows, computed from
//! the filtered records.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::{
  Record,
  coerce::{canonical_number, to_js_string, to_number},
  filter::{Filter, apply_filter},
};

/// Group key for records whose field is null or missing.
pub const UNKNOWN_KEY: &str = "Unknown";

/// A declarative aggregate over a record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DataBinding {
  Count {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
  },
  Sum {
    field:  String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
  },
  Average {
    field:  String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
  },
  GroupBy {
    field:  String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
  },
  Records {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit:  Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
  },
  /// Number of distinct values of `field`.
  Field {
    field:  String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
  },
}

impl DataBinding {
  pub fn filter(&self) -> Option<&Filter> {
    match self {
      Self::Count { filter }
      | Self::Sum { filter, .. }
      | Self::Average { filter, .. }
      | Self::GroupBy { filter, .. }
      | Self::Records { filter, .. }
      | Self::Field { filter, .. } => filter.as_ref(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group<'a> {
  pub key:     String,
  pub value:   usize,
  pub records: Vec<&'a Record>,
}

/// A resolved binding. Every variant keeps the records it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResolvedBinding<'a> {
  Scalar { value: f64, records: Vec<&'a Record> },
  Groups { groups: Vec<Group<'a>> },
  Records { records: Vec<&'a Record> },
}

impl<'a> ResolvedBinding<'a> {
  /// The binding as a single number: the scalar itself, the number of
  /// records, or the total across groups.
  pub fn as_number(&self) -> f64 {
    match self {
      Self::Scalar { value, .. } => *value,
      Self::Groups { groups } => groups.iter().map(|g| g.value as f64).sum(),
      Self::Records { records } => records.len() as f64,
    }
  }

  pub fn groups(&self) -> Option<&[Group<'a>]> {
    match self {
      Self::Groups { groups } => Some(groups),
      _ => None,
    }
  }

  pub fn records(&self) -> Vec<&'a Record> {
    match self {
      Self::Scalar { records, .. } | Self::Records { records } => records.clone(),
      Self::Groups { groups } => groups.iter().flat_map(|g| g.records.iter().copied()).collect(),
    }
  }
}

pub fn resolve_data_binding<'a, I>(binding: &DataBinding, records: I) -> ResolvedBinding<'a>
where
  I: IntoIterator<Item = &'a Record>,
{
  let records: Vec<&'a Record> = match binding.filter() {
    Some(filter) => apply_filter(records, filter),
    None => records.into_iter().collect(),
  };

  match binding {
    DataBinding::Count { .. } => ResolvedBinding::Scalar { value: records.len() as f64, records },
    DataBinding::Sum { field, .. } => ResolvedBinding::Scalar { value: sum(&records, field), records },
    DataBinding::Average { field, .. } => {
      let value = if records.is_empty() { 0.0 } else { sum(&records, field) / records.len() as f64 };
      ResolvedBinding::Scalar { value, records }
    }
    DataBinding::GroupBy { field, .. } => ResolvedBinding::Groups { groups: group_by(records, field) },
    DataBinding::Records { limit, .. } => {
      let mut records = records;
      if let Some(limit) = limit {
        records.truncate(*limit);
      }
      ResolvedBinding::Records { records }
    }
    DataBinding::Field { field, .. } => {
      // Keyed by canonical JSON; a missing field is distinct from null.
      let distinct: BTreeSet<Option<String>> = records
        .iter()
        .map(|r| r.get(field).map(|v| canonical_number(v).to_string()))
        .collect();
      ResolvedBinding::Scalar { value: distinct.len() as f64, records }
    }
  }
}

fn sum(records: &[&Record], field: &str) -> f64 {
  records
    .iter()
    .map(|r| to_number(r.get(field)))
    .filter(|n| !n.is_nan())
    .sum()
}

fn group_by<'a>(records: Vec<&'a Record>, field: &str) -> Vec<Group<'a>> {
  let mut index: HashMap<String, usize> = HashMap::new();
  let mut groups: Vec<Group<'a>> = Vec::new();

  for record in records {
    let key = match record.get(field) {
      None | Some(serde_json::Value::Null) => UNKNOWN_KEY.to_owned(),
      value => to_js_string(value),
    };
    let slot = *index.entry(key.clone()).or_insert_with(|| {
      groups.push(Group { key, value: 0, records: Vec::new() });
      groups.len() - 1
    });
    groups[slot].value += 1;
    groups[slot].records.push(record);
  }

  // Stable: ties keep first-seen order.
  groups.sort_by(|a, b| b.value.cmp(&a.value));
  groups
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::scrolly::FilterClause;

  fn records(values: &[serde_json::Value]) -> Vec<Record> {
    values.iter().filter_map(|v| v.as_object().cloned()).collect()
  }

  fn binding(value: serde_json::Value) -> DataBinding { serde_json::from_value(value).unwrap() }

  #[test]
  fn count_equals_length() {
    let count = binding(json!({"type": "count"}));
    for n in [0, 1, 7] {
      let rs = records(&vec![json!({"a": 1}); n]);
      assert_eq!(resolve_data_binding(&count, &rs).as_number(), n as f64);
    }
  }

  #[test]
  fn sum_skips_non_numeric_and_average_handles_empty() {
    let rs = records(&[json!({"n": 2}), json!({"n": "3"}), json!({"n": "x"}), json!({})]);
    let sum = binding(json!({"type": "sum", "field": "n"}));
    assert_eq!(resolve_data_binding(&sum, &rs).as_number(), 5.0);

    let avg = binding(json!({"type": "average", "field": "n"}));
    assert_eq!(resolve_data_binding(&avg, &rs).as_number(), 1.25);
    let empty: Vec<Record> = Vec::new();
    assert_eq!(resolve_data_binding(&avg, &empty).as_number(), 0.0);
  }

  #[test]
  fn group_by_sorts_descending_and_totals_the_count() {
    let rs = records(&[
      json!({"state": "GA"}),
      json!({"state": "TX"}),
      json!({"state": null}),
      json!({"state": "TX"}),
      json!({}),
      json!({"state": "TX"}),
    ]);
    let resolved = resolve_data_binding(&binding(json!({"type": "groupBy", "field": "state"})), &rs);
    let groups = resolved.groups().unwrap();
    let keys: Vec<_> = groups.iter().map(|g| (g.key.as_str(), g.value)).collect();
    assert_eq!(keys, vec![("TX", 3), ("Unknown", 2), ("GA", 1)]);
    assert_eq!(groups.iter().map(|g| g.value).sum::<usize>(), rs.len());
    assert!(groups.windows(2).all(|w| w[0].value >= w[1].value));
  }

  #[test]
  fn group_keys_use_string_coercion() {
    let rs = records(&[json!({"age": 30}), json!({"age": "30"}), json!({"age": true})]);
    let resolved = resolve_data_binding(&binding(json!({"type": "groupBy", "field": "age"})), &rs);
    let keys: Vec<_> = resolved.groups().unwrap().iter().map(|g| g.key.clone()).collect();
    assert_eq!(keys, vec!["30", "true"]);
  }

  #[test]
  fn records_binding_truncates() {
    let rs = records(&[json!({"i": 1}), json!({"i": 2}), json!({"i": 3})]);
    let resolved = resolve_data_binding(&binding(json!({"type": "records", "limit": 2})), &rs);
    assert_eq!(resolved.records().len(), 2);
    assert_eq!(resolved.records()[1]["i"], json!(2));
  }

  #[test]
  fn field_counts_distinct_values() {
    let rs = records(&[
      json!({"city": "Austin"}),
      json!({"city": "Austin"}),
      json!({"city": null}),
      json!({}),
      json!({"city": "Macon"}),
    ]);
    let resolved = resolve_data_binding(&binding(json!({"type": "field", "field": "city"})), &rs);
    assert_eq!(resolved.as_number(), 4.0);
  }

  #[test]
  fn field_treats_integer_forms_of_a_number_as_one_value() {
    let rs = records(&[json!({"n": 1}), json!({"n": 1.0}), json!({"n": -0.0}), json!({"n": 0})]);
    let resolved = resolve_data_binding(&binding(json!({"type": "field", "field": "n"})), &rs);
    assert_eq!(resolved.as_number(), 2.0);

    let mixed = records(&[json!({"n": 1}), json!({"n": "1"})]);
    let resolved = resolve_data_binding(&binding(json!({"type": "field", "field": "n"})), &mixed);
    assert_eq!(resolved.as_number(), 2.0);
  }

  #[test]
  fn binding_filter_narrows_before_aggregating() {
    let rs = records(&[json!({"t": "death"}), json!({"t": "injury"}), json!({"t": "death"})]);
    let count = DataBinding::Count {
      filter: Some(Filter::new().with("t", FilterClause::Equals(json!("death")))),
    };
    let resolved = resolve_data_binding(&count, &rs);
    assert_eq!(resolved.as_number(), 2.0);
    assert_eq!(resolved.records().len(), 2);
  }
}
