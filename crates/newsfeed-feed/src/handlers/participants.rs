//! Handlers for the identity endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/participant` | Body: `{"name":"..","link":".."}`; returns 201 + participant |
//! | `GET`  | `/participant/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use newsfeed_core::{participant::Participant, store::KeyValueCache};

use crate::{AppState, FeedStore, error::ApiError};

/// `POST /participant`
pub async fn create<S, C>(
  State(state): State<AppState<S, C>>,
  Json(body): Json<Participant>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FeedStore,
  C: KeyValueCache + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("participant name is required".into()));
  }

  let participant = state
    .store
    .create_participant(body.name, body.link)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(id = participant.id, "created participant");
  Ok((StatusCode::CREATED, Json(participant)))
}

/// `GET /participant/{id}`
pub async fn get_one<S, C>(
  State(state): State<AppState<S, C>>,
  Path(id): Path<i64>,
) -> Result<Json<Participant>, ApiError>
where
  S: FeedStore,
  C: KeyValueCache + 'static,
{
  let participant = state
    .store
    .get_participant(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("participant {id} not found")))?;
  Ok(Json(participant))
}
