//! Async HTTP client wrapping the Witness JSON API.

use std::{future::Future, time::Duration};

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use witness_core::{
  dossier::Dossier,
  duplicate::{DuplicateLookup, DuplicateQuery, DuplicateReport},
  guest::{GuestReport, GuestSubmission},
  incident::{Incident, VerificationStatus},
  review::{ReviewChecklist, ReviewIssue},
  scrolly::{Record, Scene},
};

/// Connection settings for the Witness API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the Witness JSON REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// The verification screen's view of an incident.
#[derive(Debug, Deserialize)]
pub struct VerifyView {
  #[serde(flatten)]
  pub dossier:           Dossier,
  pub validation_issues: Vec<ReviewIssue>,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  error:  String,
  #[serde(default)]
  issues: Vec<ReviewIssue>,
}

#[derive(Debug, Deserialize)]
pub struct Accepted {
  pub incident: Incident,
  pub message:  String,
}

/// How the server answered a review submission.
#[derive(Debug)]
pub enum ReviewOutcome {
  Accepted(Accepted),
  Blocked { status: StatusCode, error: String, issues: Vec<ReviewIssue> },
}

/// How the server answered a guest report.
#[derive(Debug)]
pub enum SubmitOutcome {
  Created(GuestSubmission),
  Refused(String),
}

#[derive(Debug, Deserialize)]
struct Created {
  submission: GuestSubmission,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// Decode a successful response or turn the API's error body into an
  /// error.
  async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
      let message = resp
        .json::<ErrorBody>()
        .await
        .map(|b| b.error)
        .unwrap_or_else(|_| status.to_string());
      return Err(anyhow!("{what} → {status}: {message}"));
    }
    resp.json().await.with_context(|| format!("deserialising {what}"))
  }

  // ── Incidents ─────────────────────────────────────────────────────────────

  /// `GET /api/incidents[?status=<status>]`
  pub async fn list_incidents(&self, status: Option<VerificationStatus>) -> Result<Vec<Incident>> {
    let mut req = self.auth(self.client.get(self.url("/incidents")));
    if let Some(status) = status {
      req = req.query(&[("status", status.as_ref())]);
    }
    let resp = req.send().await.context("GET /incidents failed")?;
    Self::decode(resp, "incidents").await
  }

  /// `GET /api/incidents/<id>/verify-field`
  pub async fn verify_view(&self, id: i64) -> Result<VerifyView> {
    let path = format!("/incidents/{id}/verify-field");
    let resp = self
      .auth(self.client.get(self.url(&path)))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    Self::decode(resp, "incident dossier").await
  }

  // ── Review ────────────────────────────────────────────────────────────────

  /// `POST /api/incidents/<id>/review`
  pub async fn review(
    &self,
    id: i64,
    user_id: i64,
    checklist: &ReviewChecklist,
  ) -> Result<ReviewOutcome> {
    let path = format!("/incidents/{id}/review");
    let resp = self
      .auth(self.client.post(self.url(&path)))
      .json(&serde_json::json!({ "user_id": user_id, "checklist": checklist }))
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;

    let status = resp.status();
    if matches!(status, StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY) {
      let body: ErrorBody = resp.json().await.context("deserialising review issues")?;
      return Ok(ReviewOutcome::Blocked { status, error: body.error, issues: body.issues });
    }
    Self::decode(resp, "review").await.map(ReviewOutcome::Accepted)
  }

  /// `POST /api/incidents/<id>/reject`
  pub async fn reject(&self, id: i64, user_id: i64, reason: &str) -> Result<Incident> {
    let path = format!("/incidents/{id}/reject");
    let resp = self
      .auth(self.client.post(self.url(&path)))
      .json(&serde_json::json!({ "user_id": user_id, "reason": reason }))
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    Self::decode(resp, "rejection").await
  }

  // ── Guest reports ─────────────────────────────────────────────────────────

  /// `POST /api/guest-submissions`
  pub async fn submit_report(&self, report: &GuestReport) -> Result<SubmitOutcome> {
    let resp = self
      .auth(self.client.post(self.url("/guest-submissions")))
      .json(report)
      .send()
      .await
      .context("POST /guest-submissions failed")?;

    if resp.status() == StatusCode::CONFLICT {
      let body: ErrorBody = resp.json().await.context("deserialising refusal")?;
      return Ok(SubmitOutcome::Refused(body.error));
    }
    let created: Created = Self::decode(resp, "guest submission").await?;
    Ok(SubmitOutcome::Created(created.submission))
  }

  // ── Scenes ────────────────────────────────────────────────────────────────

  /// `POST /api/scenes/resolve` against the published incidents.
  pub async fn resolve_scene(&self, scene: &Scene) -> Result<Record> {
    let resp = self
      .auth(self.client.post(self.url("/scenes/resolve")))
      .json(&serde_json::json!({ "scene": scene }))
      .send()
      .await
      .context("POST /scenes/resolve failed")?;
    Self::decode(resp, "resolved scene").await
  }
}

impl DuplicateLookup for ApiClient {
  type Error = reqwest::Error;

  /// `POST /api/check-duplicates`
  fn lookup<'a>(
    &'a self,
    query: &'a DuplicateQuery,
  ) -> impl Future<Output = Result<DuplicateReport, reqwest::Error>> + Send + 'a {
    async move {
      self
        .auth(self.client.post(self.url("/check-duplicates")))
        .json(query)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
    }
  }
}
