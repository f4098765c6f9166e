//! Token endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/token` | Form: `grant_type=password&username=..&password=..`; optional `client_id`/`client_secret` |
//! | `GET`  | `/test`  | Describes the presented bearer token |

use axum::{
  Form, Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use newsfeed_core::store::KeyValueCache;
use serde::Deserialize;

use crate::{
  AppState,
  bearer::Bearer,
  clients::ClientRegistry,
  error::ApiError,
  tokens::{TokenInfo, TokenIssuer},
};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
  pub grant_type:    String,
  #[serde(default)]
  pub username:      String,
  #[serde(default)]
  pub password:      String,
  pub client_id:     Option<String>,
  pub client_secret: Option<String>,
}

/// `POST /token`
///
/// Without a `client_id` the token is issued to the participant's own client.
pub async fn token<C>(
  State(state): State<AppState<C>>,
  Form(req): Form<TokenRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  C: KeyValueCache + 'static,
{
  if req.grant_type != "password" {
    return Err(ApiError::UnsupportedGrantType(req.grant_type));
  }
  if req.username.trim().is_empty() {
    return Err(ApiError::InvalidRequest("username is required".into()));
  }

  if let Some(client_id) = &req.client_id {
    let client = state.clients.get(client_id).await?.ok_or(ApiError::InvalidClient)?;
    if let Some(secret) = &req.client_secret
      && *secret != client.secret
    {
      return Err(ApiError::InvalidClient);
    }
  }

  let user_id = state.gate.validate(&req.username, &req.password).await?;
  let client_id = req.client_id.unwrap_or_else(|| user_id.clone());
  let token = state.tokens.issue(&client_id, &user_id).await?;

  tracing::info!(username = %req.username, %user_id, %client_id, "issued access token");
  Ok(([(header::CACHE_CONTROL, "no-store")], Json(token)))
}

/// `GET /test`
pub async fn test(Bearer(info): Bearer) -> Json<TokenInfo> { Json(info) }
