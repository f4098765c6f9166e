//! Error types and axum `IntoResponse` implementation.
//!
//! The gate keeps transport failures, unreadable stored data and credential
//! mismatches apart, and the HTTP mapping preserves that split: only a
//! mismatch is reported to the client as bad credentials.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ─── Identity service ─────────────────────────────────────────────────────────

/// A failed call to the identity service.
#[derive(Debug, Error)]
pub enum IdentityError {
  #[error("identity service unreachable: {0}")]
  Unreachable(#[source] BoxError),

  #[error("identity service returned an unusable participant: {0}")]
  InvalidResponse(String),
}

// ─── Provisioning ─────────────────────────────────────────────────────────────

/// A failure while provisioning a first-time username.
///
/// Every variant is final for the attempt; nothing is retried.
#[derive(Debug, Error)]
pub enum ProvisionError {
  #[error("cannot create participant: {0}")]
  CreateParticipant(#[source] BoxError),

  #[error("create participant returned an invalid response: {0}")]
  InvalidResponse(String),

  #[error("cannot register oauth client {client_id}: {source}")]
  RegisterClient {
    client_id: String,
    #[source]
    source:    BoxError,
  },

  #[error("cannot encode credential record: {0}")]
  EncodeCredential(#[source] newsfeed_core::Error),

  #[error("cannot write credential record: {0}")]
  CredentialWrite(#[source] BoxError),
}

impl From<IdentityError> for ProvisionError {
  fn from(e: IdentityError) -> Self {
    match e {
      IdentityError::Unreachable(source) => Self::CreateParticipant(source),
      IdentityError::InvalidResponse(msg) => Self::InvalidResponse(msg),
    }
  }
}

// ─── Credential gate ──────────────────────────────────────────────────────────

/// Why a password grant was refused.
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("credential cache unavailable: {0}")]
  CacheUnavailable(#[source] BoxError),

  #[error("stored credential is unusable: {0}")]
  InvalidStoredCredential(#[source] newsfeed_core::Error),

  #[error("incorrect username or password")]
  IncorrectPassword,

  #[error("provisioning failed: {0}")]
  Provisioning(#[from] ProvisionError),
}

impl AuthError {
  pub(crate) fn cache(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::CacheUnavailable(Box::new(e))
  }
}

// ─── Registry, tokens, upstream ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("client {0} is already registered")]
  DuplicateClient(String),
}

#[derive(Debug, Error)]
pub enum TokenError {
  #[error("missing bearer token")]
  Missing,

  #[error("unknown bearer token")]
  Unknown,

  #[error("bearer token has expired")]
  Expired,
}

/// A failed call to the feed service.
#[derive(Debug, Error)]
pub enum FeedError {
  #[error("feed request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("feed returned {status} for {path}")]
  Status { path: String, status: u16 },
}

// ─── HTTP ─────────────────────────────────────────────────────────────────────

/// An error returned by an edge handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  #[error("unsupported grant type {0:?}")]
  UnsupportedGrantType(String),

  #[error("client authentication failed")]
  InvalidClient,

  #[error(transparent)]
  Auth(#[from] AuthError),

  #[error(transparent)]
  Token(#[from] TokenError),

  #[error(transparent)]
  Registry(#[from] RegistryError),

  #[error(transparent)]
  Feed(#[from] FeedError),
}

impl ApiError {
  fn status_and_code(&self) -> (StatusCode, &'static str) {
    match self {
      ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
      ApiError::UnsupportedGrantType(_) => (StatusCode::BAD_REQUEST, "unsupported_grant_type"),
      ApiError::InvalidClient => (StatusCode::UNAUTHORIZED, "invalid_client"),
      ApiError::Auth(AuthError::IncorrectPassword) => (StatusCode::UNAUTHORIZED, "invalid_grant"),
      ApiError::Auth(AuthError::InvalidStoredCredential(_)) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "server_error")
      }
      ApiError::Auth(AuthError::CacheUnavailable(_)) => {
        (StatusCode::SERVICE_UNAVAILABLE, "temporarily_unavailable")
      }
      ApiError::Auth(AuthError::Provisioning(_)) => (StatusCode::BAD_GATEWAY, "server_error"),
      ApiError::Token(_) => (StatusCode::UNAUTHORIZED, "invalid_token"),
      ApiError::Registry(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
      ApiError::Feed(FeedError::Status { status: 404, .. }) => (StatusCode::NOT_FOUND, "not_found"),
      ApiError::Feed(_) => (StatusCode::BAD_GATEWAY, "bad_gateway"),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code) = self.status_and_code();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let body = Json(json!({ "error": code, "error_description": self.to_string() }));
    let mut res = (status, body).into_response();
    if matches!(self, ApiError::Token(_)) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Bearer realm=\"newsfeed\""),
      );
    }
    res
  }
}
