//! HTTP server for Witness: the JSON API behind an optional operator
//! Basic-auth gate, with request tracing.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, middleware, routing::get};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use witness_core::store::IncidentStore;

use auth::{AuthConfig, require_auth};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `WITNESS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  #[serde(default)]
  pub auth_username:      Option<String>,
  #[serde(default)]
  pub auth_password_hash: Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/witness/witness.db") }

impl ServerConfig {
  /// The operator credentials, or `None` to serve without auth. Setting only
  /// one of the two keys is an error.
  pub fn auth(&self) -> Result<Option<AuthConfig>, Error> {
    match (&self.auth_username, &self.auth_password_hash) {
      (Some(username), Some(password_hash)) => Ok(Some(AuthConfig {
        username:      username.clone(),
        password_hash: password_hash.clone(),
      })),
      (None, None) => Ok(None),
      _ => Err(Error::Config(
        "auth_username and auth_password_hash must be set together".into(),
      )),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the server router: `/api` (behind `auth` when given) and an
/// unauthenticated `/health`.
pub fn router<S>(store: Arc<S>, auth: Option<AuthConfig>) -> Router
where
  S: IncidentStore + 'static,
{
  let mut app = Router::new().nest("/api", witness_api::api_router(store));
  if let Some(auth) = auth {
    app = app.layer(middleware::from_fn_with_state(Arc::new(auth), require_auth));
  }
  app
    .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use rand_core::OsRng;
  use tower::ServiceExt as _;
  use witness_store_sqlite::SqliteStore;

  use super::*;

  fn auth_config() -> AuthConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(b"secret", &salt)
      .unwrap()
      .to_string();
    AuthConfig { username: "operator".into(), password_hash: hash }
  }

  async fn app(auth: Option<AuthConfig>) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(Arc::new(store), auth)
  }

  fn request(method: Method, uri: &str, authorization: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
      builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
  }

  fn basic(user: &str, pass: &str) -> String { format!("Basic {}", B64.encode(format!("{user}:{pass}"))) }

  #[tokio::test]
  async fn operator_routes_require_credentials() {
    let app = app(Some(auth_config())).await;

    let resp = app
      .clone()
      .oneshot(request(Method::GET, "/api/incidents", None, ""))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
      resp.headers()[header::WWW_AUTHENTICATE],
      "Basic realm=\"witness\""
    );

    let creds = basic("operator", "secret");
    let resp = app
      .oneshot(request(Method::GET, "/api/incidents", Some(&creds), ""))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn guests_report_without_credentials() {
    let app = app(Some(auth_config())).await;
    let resp = app
      .clone()
      .oneshot(request(
        Method::POST,
        "/api/guest-submissions",
        None,
        r#"{"victim_name":"Jane Doe"}"#,
      ))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
      .oneshot(request(Method::GET, "/health", None, ""))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn no_auth_configured_serves_everything() {
    let app = app(None).await;
    let resp = app
      .oneshot(request(Method::GET, "/api/reviewers", None, ""))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[test]
  fn half_configured_auth_is_rejected() {
    let config = ServerConfig {
      host:               default_host(),
      port:               default_port(),
      store_path:         PathBuf::from(":memory:"),
      auth_username:      Some("operator".into()),
      auth_password_hash: None,
    };
    assert!(matches!(config.auth(), Err(Error::Config(_))));
  }
}
