//! Timeline ordering. `sequence_order` is always the dense sequence 1..N.

use crate::{Error, Result, evidence::TimelineEntry, record::Persisted};

/// Sort entries by their current order (id breaks ties) and reassign
/// `sequence_order` as 1..N.
pub fn renumber(entries: &mut [Persisted<TimelineEntry>]) {
  entries.sort_by_key(|e| (e.value.sequence_order, e.id));
  for (i, entry) in entries.iter_mut().enumerate() {
    entry.value.sequence_order = position(i);
  }
}

/// Move the entry at index `from` to index `to`, then renumber.
pub fn reorder(entries: &mut Vec<Persisted<TimelineEntry>>, from: usize, to: usize) -> Result<()> {
  let len = entries.len();
  for index in [from, to] {
    if index >= len {
      return Err(Error::PositionOutOfRange { position: index, len });
    }
  }

  renumber(entries);
  let moved = entries.remove(from);
  entries.insert(to, moved);
  for (i, entry) in entries.iter_mut().enumerate() {
    entry.value.sequence_order = position(i);
  }
  Ok(())
}

/// The entry ids in their current order.
pub fn order_of(entries: &[Persisted<TimelineEntry>]) -> Vec<i64> {
  let mut sorted: Vec<_> = entries.iter().map(|e| (e.value.sequence_order, e.id)).collect();
  sorted.sort_unstable();
  sorted.into_iter().map(|(_, id)| id).collect()
}

/// Check that `order` is a permutation of the ids in `entries`.
pub fn validate_order(entries: &[Persisted<TimelineEntry>], order: &[i64]) -> Result<()> {
  let mut expected: Vec<i64> = entries.iter().map(|e| e.id).collect();
  let mut given = order.to_vec();
  expected.sort_unstable();
  given.sort_unstable();
  if expected == given { Ok(()) } else { Err(Error::IncompleteTimelineOrder) }
}

fn position(index: usize) -> u32 { u32::try_from(index + 1).unwrap_or(u32::MAX) }

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(id: i64, sequence_order: u32) -> Persisted<TimelineEntry> {
    Persisted {
      id,
      incident_id: 1,
      value: TimelineEntry {
        event_date: None,
        description: format!("event {id}"),
        sequence_order,
        quote_id: None,
      },
    }
  }

  fn orders(entries: &[Persisted<TimelineEntry>]) -> Vec<u32> {
    entries.iter().map(|e| e.value.sequence_order).collect()
  }

  #[test]
  fn renumber_closes_gaps_and_duplicates() {
    let mut entries = vec![entry(1, 4), entry(2, 4), entry(3, 9), entry(4, 0)];
    renumber(&mut entries);
    assert_eq!(orders(&entries), vec![1, 2, 3, 4]);
    assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![4, 1, 2, 3]);
  }

  #[test]
  fn reorder_yields_dense_sequence() {
    let mut entries = vec![entry(10, 1), entry(11, 2), entry(12, 3), entry(13, 4)];
    reorder(&mut entries, 3, 0).unwrap();
    assert_eq!(order_of(&entries), vec![13, 10, 11, 12]);
    assert_eq!(orders(&entries), vec![1, 2, 3, 4]);

    reorder(&mut entries, 0, 3).unwrap();
    assert_eq!(order_of(&entries), vec![10, 11, 12, 13]);
    assert_eq!(orders(&entries), vec![1, 2, 3, 4]);
  }

  #[test]
  fn reorder_out_of_range_is_rejected() {
    let mut entries = vec![entry(1, 1)];
    assert!(matches!(
      reorder(&mut entries, 0, 1),
      Err(Error::PositionOutOfRange { position: 1, len: 1 })
    ));
  }

  #[test]
  fn order_must_be_a_permutation() {
    let entries = vec![entry(1, 1), entry(2, 2)];
    assert!(validate_order(&entries, &[2, 1]).is_ok());
    assert!(validate_order(&entries, &[1]).is_err());
    assert!(validate_order(&entries, &[1, 1]).is_err());
  }
}
