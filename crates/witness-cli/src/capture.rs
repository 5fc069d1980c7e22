//! Loading browser-extension captures from disk.
//!
//! A capture file is either a saved [`CaptureSession`] (`.json`) or a log of
//! [`CaptureAction`]s, one JSON object per line (`.jsonl`), replayed onto a
//! fresh session.

use std::path::Path;

use anyhow::{Context, Result};
use witness_core::capture::{CaptureAction, CaptureSession};

pub fn load(path: &Path) -> Result<CaptureSession> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading capture file {}", path.display()))?;
  if path.extension().is_some_and(|e| e == "jsonl") {
    replay(&raw)
  } else {
    serde_json::from_str(&raw).context("parsing capture session")
  }
}

/// Apply every action in `log` in order.
pub fn replay(log: &str) -> Result<CaptureSession> {
  let mut session = CaptureSession::new();
  for (n, line) in log.lines().enumerate() {
    let line = line.trim();
    if line.is_empty() {
      continue;
    }
    let action: CaptureAction =
      serde_json::from_str(line).with_context(|| format!("line {}: invalid action", n + 1))?;
    session
      .apply(action)
      .with_context(|| format!("line {}: action rejected", n + 1))?;
  }
  Ok(session)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn replay_builds_a_reportable_session() {
    let log = r#"
      {"action":"set_field","field":"victim_name","value":"Jane Doe"}
      {"action":"toggle_agency","agency":"ice"}
      {"action":"add_quote","text":"Jane Doe died on Jan 1.","source_url":"https://news.example/jane"}
      {"action":"add_source","url":"https://news.example/jane","title":"Obituary"}
    "#;
    let session = replay(log).unwrap();
    assert_eq!(session.quotes.len(), 1);

    let report = session.into_guest_report();
    assert_eq!(report.victim_name.as_deref(), Some("Jane Doe"));
    assert_eq!(report.agencies.get("ice"), Some(&true));
    assert_eq!(report.source_urls, vec!["https://news.example/jane".to_string()]);
  }

  #[test]
  fn replay_stops_at_a_rejected_action() {
    let log = "{\"action\":\"close\"}\n{\"action\":\"add_quote\",\"text\":\"x\",\"source_url\":null}";
    let err = replay(log).unwrap_err();
    assert!(format!("{err:#}").contains("line 2"));
  }
}
