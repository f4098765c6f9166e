//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A failure of the friend cache-aside layer.
///
/// Store and cache failures are transport failures; a corrupt cache entry is
/// a data failure. An empty friend list is not an error.
#[derive(Debug, Error)]
pub enum FriendError {
  #[error("invalid friend edge {from} -> {to}")]
  InvalidEdge { from: i64, to: i64 },

  #[error("friend graph unavailable: {0}")]
  Graph(#[source] BoxError),

  #[error("friend cache unavailable: {0}")]
  Cache(#[source] BoxError),

  #[error("corrupt friend cache entry {key}: {source}")]
  CorruptCacheEntry {
    key:    String,
    #[source]
    source: newsfeed_core::Error,
  },

  #[error("cannot encode friend list: {0}")]
  Encode(#[source] newsfeed_core::Error),
}

impl FriendError {
  pub(crate) fn graph(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Graph(Box::new(e))
  }

  pub(crate) fn cache(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Cache(Box::new(e))
  }
}

/// An error returned by a feed handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error(transparent)]
  Friends(#[from] FriendError),
}

impl ApiError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Friends(FriendError::InvalidEdge { .. }) => StatusCode::BAD_REQUEST,
      ApiError::Store(_) | ApiError::Friends(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
