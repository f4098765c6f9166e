//! Bearer-token extractor.

use std::sync::Arc;

use axum::{
  extract::{FromRef, FromRequestParts},
  http::{HeaderMap, header, request::Parts},
};

use crate::{
  error::{ApiError, TokenError},
  tokens::{MemoryTokenIssuer, TokenInfo, TokenIssuer},
};

/// A validated bearer token. Present in a handler means the request carried
/// a live token.
#[derive(Debug, Clone)]
pub struct Bearer(pub TokenInfo);

impl Bearer {
  /// The participant the token was issued to.
  pub fn participant_id(&self) -> Result<i64, ApiError> {
    self
      .0
      .user_id
      .parse()
      .map_err(|_| ApiError::Token(TokenError::Unknown))
  }
}

/// The raw token from an `Authorization: Bearer …` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(TokenError::Missing)?;

  let (scheme, token) = value.split_once(' ').ok_or(TokenError::Missing)?;
  if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
    return Err(TokenError::Missing);
  }
  Ok(token.trim())
}

impl<S> FromRequestParts<S> for Bearer
where
  S: Send + Sync,
  Arc<MemoryTokenIssuer>: FromRef<S>,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let tokens = Arc::<MemoryTokenIssuer>::from_ref(state);
    let token = bearer_token(&parts.headers)?;
    Ok(Bearer(tokens.validate(token).await?))
  }
}
