//! HTTP Basic admin auth. The verified username becomes the audit actor.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// The single administrator account.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// An authenticated administrator; holds the username.
#[derive(Debug, Clone)]
pub struct Admin(pub String);

/// Check the `Authorization` header against `config`, returning the username.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<String, ApiError> {
  let encoded = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;
  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  if username != config.username {
    return Err(ApiError::Unauthorized);
  }

  let parsed = PasswordHash::new(&config.password_hash).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(username.to_owned())
}

impl<S, E, X> FromRequestParts<AppState<S, E, X>> for Admin
where
  S: Send + Sync,
  E: Send + Sync,
  X: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, E, X>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth).map(Admin)
  }
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::HeaderValue;
  use rand_core::OsRng;

  use super::*;

  fn config(password: &str) -> AuthConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AuthConfig { username: "coach".into(), password_hash: hash }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[test]
  fn correct_credentials_yield_username() {
    let cfg = config("secret");
    assert_eq!(verify_auth(&headers(&basic("coach", "secret")), &cfg).unwrap(), "coach");
  }

  #[test]
  fn password_may_contain_colons() {
    let cfg = config("a:b:c");
    assert!(verify_auth(&headers(&basic("coach", "a:b:c")), &cfg).is_ok());
  }

  #[test]
  fn rejects_bad_credentials() {
    let cfg = config("secret");
    for value in [
      basic("coach", "wrong"),
      basic("scout", "secret"),
      "Basic !!!not-base64!!!".to_owned(),
      "Bearer abc".to_owned(),
    ] {
      assert!(
        matches!(verify_auth(&headers(&value), &cfg), Err(ApiError::Unauthorized)),
        "accepted {value}"
      );
    }
    assert!(matches!(verify_auth(&HeaderMap::new(), &cfg), Err(ApiError::Unauthorized)));
  }
}
