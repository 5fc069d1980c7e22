//! The browser extension's capture session: a draft case assembled from
//! quotes and sources highlighted on news pages, submitted as a guest report.
//!
//! All session state lives in [`CaptureSession`] and changes only through
//! [`CaptureSession::apply`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  evidence::normalize_url,
  field::FieldKey,
  guest::{GuestQuote, GuestReport},
  incident::{IncidentField, IncidentFields},
  tags::AgencyKind,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedQuote {
  pub text:         String,
  #[serde(default)]
  pub source_url:   Option<String>,
  #[serde(default)]
  pub linked_field: Option<FieldKey>,
  /// Whether the quote is still highlighted on the page it came from.
  #[serde(default)]
  pub highlighted:  bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedSource {
  pub url:   String,
  #[serde(default)]
  pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureSession {
  #[serde(default)]
  pub case:     IncidentFields,
  #[serde(default)]
  pub agencies: BTreeSet<AgencyKind>,
  #[serde(default)]
  pub quotes:   Vec<CapturedQuote>,
  #[serde(default)]
  pub sources:  Vec<CapturedSource>,
  #[serde(default)]
  pub open:     bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CaptureAction {
  Open,
  Close,
  SetField { field: IncidentField, value: String },
  ToggleAgency { agency: AgencyKind },
  AddQuote { text: String, source_url: Option<String> },
  RemoveQuote { index: usize },
  LinkQuote { index: usize, field: Option<FieldKey> },
  AddSource { url: String, title: Option<String> },
  RemoveSource { index: usize },
  Reset,
}

impl CaptureSession {
  pub fn new() -> Self { Self { open: true, ..Self::default() } }

  pub fn apply(&mut self, action: CaptureAction) -> Result<()> {
    if !self.open && !matches!(action, CaptureAction::Open) {
      return Err(Error::SessionClosed);
    }

    match action {
      CaptureAction::Open => self.open = true,
      CaptureAction::Close => self.open = false,
      CaptureAction::SetField { field, value } => self.case.set(field, &value)?,
      CaptureAction::ToggleAgency { agency } => {
        if !self.agencies.remove(&agency) {
          self.agencies.insert(agency);
        }
      }
      CaptureAction::AddQuote { text, source_url } => {
        let text = text.trim().to_owned();
        if text.is_empty() {
          return Ok(());
        }
        if let Some(url) = source_url.as_deref() {
          self.add_source(url, None);
        }
        self.quotes.push(CapturedQuote { text, source_url, linked_field: None, highlighted: true });
      }
      CaptureAction::RemoveQuote { index } => {
        if index >= self.quotes.len() {
          return Err(Error::NoSuchCapture(index));
        }
        self.quotes.remove(index);
      }
      CaptureAction::LinkQuote { index, field } => {
        // A field is backed by one quote at a time.
        if let Some(field) = field {
          for quote in &mut self.quotes {
            if quote.linked_field == Some(field) {
              quote.linked_field = None;
            }
          }
        }
        let quote = self.quotes.get_mut(index).ok_or(Error::NoSuchCapture(index))?;
        quote.linked_field = field;
      }
      CaptureAction::AddSource { url, title } => self.add_source(&url, title),
      CaptureAction::RemoveSource { index } => {
        if index >= self.sources.len() {
          return Err(Error::NoSuchCapture(index));
        }
        self.sources.remove(index);
      }
      CaptureAction::Reset => *self = Self::new(),
    }
    Ok(())
  }

  fn add_source(&mut self, url: &str, title: Option<String>) {
    let url = url.trim();
    if url.is_empty() {
      return;
    }
    let key = normalize_url(url);
    match self.sources.iter_mut().find(|s| normalize_url(&s.url) == key) {
      Some(existing) => {
        if existing.title.is_none() {
          existing.title = title;
        }
      }
      None => self.sources.push(CapturedSource { url: url.to_owned(), title }),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.case == IncidentFields::default()
      && self.agencies.is_empty()
      && self.quotes.is_empty()
      && self.sources.is_empty()
  }

  /// Clear page highlights, returning how many were removed.
  pub fn remove_highlights(&mut self) -> usize {
    let mut count = 0;
    for quote in self.quotes.iter_mut().filter(|q| q.highlighted) {
      quote.highlighted = false;
      count += 1;
    }
    count
  }

  /// The guest report this session submits.
  pub fn into_guest_report(self) -> GuestReport {
    let agencies: BTreeMap<String, bool> =
      self.agencies.iter().map(|a| (a.to_string(), true)).collect();
    let CaptureSession { case, sources, quotes, .. } = self;

    GuestReport {
      victim_name: case.victim_name,
      date_of_death: case.incident_date,
      incident_type: Some(case.incident_type),
      facility: case.facility,
      city: case.city,
      state: case.state,
      summary: case.summary,
      agencies,
      source_urls: sources.into_iter().map(|s| s.url).collect(),
      media_urls: Vec::new(),
      quotes: quotes
        .into_iter()
        .map(|q| GuestQuote { text: q.text, source_url: q.source_url, linked_field: q.linked_field })
        .collect(),
      submitter_email: None,
    }
  }

  /// Answer a message from another part of the extension.
  pub fn respond(&mut self, request: ExtensionRequest) -> ExtensionResponse {
    match request {
      ExtensionRequest::GetState => ExtensionResponse::State { session: self.clone() },
      ExtensionRequest::Ping => ExtensionResponse::Pong { open: self.open },
      ExtensionRequest::RemoveHighlights => {
        ExtensionResponse::HighlightsRemoved { count: self.remove_highlights() }
      }
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionRequest {
  GetState,
  Ping,
  RemoveHighlights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionResponse {
  State { session: CaptureSession },
  Pong { open: bool },
  HighlightsRemoved { count: usize },
}

/// Persisted extension settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtensionSettings {
  pub api_key:          Option<String>,
  /// Extra CSS selectors for article bodies on sites the defaults miss.
  pub custom_selectors: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::incident::IncidentType;

  fn add_quote(text: &str, url: Option<&str>) -> CaptureAction {
    CaptureAction::AddQuote { text: text.into(), source_url: url.map(Into::into) }
  }

  #[test]
  fn closed_session_rejects_actions_until_reopened() {
    let mut s = CaptureSession::new();
    s.apply(CaptureAction::Close).unwrap();
    assert!(matches!(s.apply(add_quote("x", None)), Err(Error::SessionClosed)));
    s.apply(CaptureAction::Open).unwrap();
    s.apply(add_quote("x", None)).unwrap();
    assert_eq!(s.quotes.len(), 1);
  }

  #[test]
  fn quotes_register_their_source_once() {
    let mut s = CaptureSession::new();
    s.apply(add_quote("first", Some("https://News.example/a/"))).unwrap();
    s.apply(add_quote("second", Some("https://news.example/a"))).unwrap();
    s.apply(CaptureAction::AddSource {
      url:   "https://news.example/a".into(),
      title: Some("Death at Stewart".into()),
    })
    .unwrap();
    assert_eq!(s.sources.len(), 1);
    assert_eq!(s.sources[0].title.as_deref(), Some("Death at Stewart"));
  }

  #[test]
  fn linking_moves_field_between_captured_quotes() {
    let name = FieldKey::Field(IncidentField::VictimName);
    let mut s = CaptureSession::new();
    s.apply(add_quote("a", None)).unwrap();
    s.apply(add_quote("b", None)).unwrap();
    s.apply(CaptureAction::LinkQuote { index: 0, field: Some(name) }).unwrap();
    s.apply(CaptureAction::LinkQuote { index: 1, field: Some(name) }).unwrap();
    assert_eq!(s.quotes[0].linked_field, None);
    assert_eq!(s.quotes[1].linked_field, Some(name));
    assert!(matches!(
      s.apply(CaptureAction::LinkQuote { index: 5, field: None }),
      Err(Error::NoSuchCapture(5))
    ));
  }

  #[test]
  fn session_becomes_guest_report() {
    let mut s = CaptureSession::new();
    s.apply(CaptureAction::SetField { field: IncidentField::VictimName, value: "Jane Doe".into() })
      .unwrap();
    s.apply(CaptureAction::SetField {
      field: IncidentField::IncidentDate,
      value: "2026-01-01".into(),
    })
    .unwrap();
    s.apply(CaptureAction::SetField { field: IncidentField::IncidentType, value: "death".into() })
      .unwrap();
    s.apply(CaptureAction::ToggleAgency { agency: AgencyKind::Ice }).unwrap();
    s.apply(CaptureAction::ToggleAgency { agency: AgencyKind::Cbp }).unwrap();
    s.apply(CaptureAction::ToggleAgency { agency: AgencyKind::Cbp }).unwrap();
    s.apply(add_quote("She died in custody.", Some("https://news.example/jane"))).unwrap();
    s.apply(CaptureAction::LinkQuote {
      index: 0,
      field: Some(IncidentField::VictimName.into()),
    })
    .unwrap();

    let report = s.into_guest_report();
    assert_eq!(report.victim_name.as_deref(), Some("Jane Doe"));
    assert_eq!(report.incident_type, Some(IncidentType::Death));
    assert_eq!(report.agencies, BTreeMap::from([("ice".to_owned(), true)]));
    assert_eq!(report.source_urls, vec!["https://news.example/jane".to_owned()]);
    assert_eq!(report.quotes, vec![GuestQuote {
      text:         "She died in custody.".into(),
      source_url:   Some("https://news.example/jane".into()),
      linked_field: Some(IncidentField::VictimName.into()),
    }]);
    assert!(!report.duplicate_query().is_empty());
  }

  #[test]
  fn messages_use_screaming_type_tags() {
    let req: ExtensionRequest = serde_json::from_str(r#"{"type":"REMOVE_HIGHLIGHTS"}"#).unwrap();
    let mut s = CaptureSession::new();
    s.apply(add_quote("a", None)).unwrap();
    s.apply(add_quote("b", None)).unwrap();
    let response = s.respond(req);
    assert_eq!(response, ExtensionResponse::HighlightsRemoved { count: 2 });
    assert_eq!(s.respond(ExtensionRequest::RemoveHighlights), ExtensionResponse::HighlightsRemoved {
      count: 0,
    });
    let pong = serde_json::to_value(s.respond(ExtensionRequest::Ping)).unwrap();
    assert_eq!(pong, serde_json::json!({"type": "PONG", "open": true}));
  }

  #[test]
  fn settings_use_storage_key_names() {
    let settings: ExtensionSettings =
      serde_json::from_str(r#"{"apiKey":"k","customSelectors":["article .body"]}"#).unwrap();
    assert_eq!(settings.api_key.as_deref(), Some("k"));
    assert_eq!(settings.custom_selectors.len(), 1);
  }
}
