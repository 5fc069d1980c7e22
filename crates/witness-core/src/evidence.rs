//! Evidentiary records attached to an incident: sources, the quotes drawn
//! from them, media, and the event timeline.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::field::FieldKey;

// ─── Sources ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
  News,
  Official,
  CourtRecord,
  NgoReport,
  SocialMedia,
  #[default]
  Other,
}

/// How directly a source witnessed the events it reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcePriority {
  Primary,
  #[default]
  Secondary,
  Tertiary,
}

/// A published document. Sources are the evidentiary root: every quote must
/// trace back to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
  pub url:             String,
  #[serde(default)]
  pub title:           Option<String>,
  #[serde(default)]
  pub publication:     Option<String>,
  #[serde(default)]
  pub source_type:     SourceType,
  #[serde(default)]
  pub source_priority: SourcePriority,
}

impl Source {
  pub fn from_url(url: impl Into<String>) -> Self {
    let url = url.into();
    let publication = host_of(&url).map(|h| h.trim_start_matches("www.").to_owned());
    Self {
      url,
      title: None,
      publication,
      source_type: SourceType::default(),
      source_priority: SourcePriority::default(),
    }
  }
}

/// Normalise a URL for duplicate matching: lowercase scheme and host, no
/// default port, no trailing slash on the path, no fragment. The query is
/// kept. Text that does not parse as a URL is only trimmed.
pub fn normalize_url(raw: &str) -> String {
  let trimmed = raw.trim();
  let Ok(url) = Url::parse(trimmed) else {
    return trimmed.trim_end_matches('/').to_owned();
  };

  let mut key = format!("{}://", url.scheme());
  if let Some(host) = url.host_str() {
    key.push_str(&host.to_lowercase());
  }
  if let Some(port) = url.port() {
    key.push_str(&format!(":{port}"));
  }
  key.push_str(url.path().trim_end_matches('/'));
  if let Some(query) = url.query() {
    key.push('?');
    key.push_str(query);
  }
  key
}

fn host_of(raw: &str) -> Option<String> {
  let url = Url::parse(raw.trim()).ok()?;
  url.host_str().filter(|h| !h.is_empty()).map(str::to_lowercase)
}

// ─── Quotes ──────────────────────────────────────────────────────────────────

/// A passage of source text that substantiates one or more incident fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
  pub quote_text:    String,
  #[serde(default)]
  pub source_id:     Option<i64>,
  #[serde(default)]
  pub category:      Option<String>,
  #[serde(default)]
  pub verified:      bool,
  #[serde(default)]
  pub linked_fields: BTreeSet<FieldKey>,
}

impl Quote {
  pub fn new(quote_text: impl Into<String>) -> Self {
    Self {
      quote_text:    quote_text.into(),
      source_id:     None,
      category:      None,
      verified:      false,
      linked_fields: BTreeSet::new(),
    }
  }
}

// ─── Media ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
  #[default]
  Image,
  Video,
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "m4v", "avi", "mkv"];
const VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be", "vimeo.com"];

impl MediaType {
  /// Guess the media type from a URL's extension or host.
  pub fn infer(url: &str) -> Self {
    let parsed = Url::parse(url.trim()).ok();
    let path = parsed.as_ref().map_or_else(
      || url.split(['?', '#']).next().unwrap_or(url).to_lowercase(),
      |u| u.path().to_lowercase(),
    );
    let by_extension = path
      .rsplit_once('.')
      .is_some_and(|(_, ext)| VIDEO_EXTENSIONS.contains(&ext));
    let by_host = host_of(url)
      .is_some_and(|h| VIDEO_HOSTS.iter().any(|v| h.trim_start_matches("www.") == *v));
    if by_extension || by_host { Self::Video } else { Self::Image }
  }
}

/// An image or video. Media is verified on its own and does not need quote
/// backing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
  pub url:         String,
  #[serde(default)]
  pub media_type:  MediaType,
  #[serde(default)]
  pub description: Option<String>,
}

impl Media {
  pub fn from_url(url: impl Into<String>) -> Self {
    let url = url.into();
    Self { media_type: MediaType::infer(&url), url, description: None }
  }
}

// ─── Timeline ────────────────────────────────────────────────────────────────

/// One event in an incident's chronology. `sequence_order` is dense (1..N)
/// across the incident and is reassigned by the store on insert, removal and
/// reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
  #[serde(default)]
  pub event_date:     Option<NaiveDate>,
  pub description:    String,
  #[serde(default)]
  pub sequence_order: u32,
  #[serde(default)]
  pub quote_id:       Option<i64>,
}
