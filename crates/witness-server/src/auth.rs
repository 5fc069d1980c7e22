//! HTTP Basic-auth gate for operator endpoints.
//!
//! Guests may report and check for duplicates without credentials, and
//! published material (scenes, legal references) is open. Everything else
//! under `/api` requires the configured operator account.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, Method},
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

use crate::error::Error;

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Verify Basic credentials in `headers` against `config`.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val.strip_prefix("Basic ").ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  if username != config.username {
    return Err(Error::Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash).map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(())
}

/// Requests that never need credentials.
pub fn is_public(method: &Method, path: &str) -> bool {
  match *method {
    Method::POST => matches!(
      path,
      "/api/guest-submissions" | "/api/check-duplicates" | "/api/scenes/resolve"
    ),
    Method::GET => path == "/api/legal" || path.starts_with("/api/legal/"),
    _ => false,
  }
}

/// Middleware rejecting non-public requests without valid credentials.
pub async fn require_auth(
  State(config): State<Arc<AuthConfig>>,
  req: Request,
  next: Next,
) -> Result<Response, Error> {
  if !is_public(req.method(), req.uri().path()) {
    verify_auth(req.headers(), &config).inspect_err(|_| {
      tracing::debug!(method = %req.method(), path = req.uri().path(), "rejected unauthenticated request");
    })?;
  }
  Ok(next.run(req).await)
}
