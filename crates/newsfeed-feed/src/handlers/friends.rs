//! Handlers for friend edges.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/participant/friends` | Body: `{"from":..,"to":..}`; returns the stored edge |
//! | `GET`  | `/participant/{id}/friends` | The cached JSON list, verbatim |

use axum::{
  Json,
  extract::{Path, State},
  http::header,
  response::IntoResponse,
};
use newsfeed_core::{friend::Friend, store::KeyValueCache};

use crate::{AppState, FeedStore, error::ApiError};

/// `POST /participant/friends`
pub async fn create<S, C>(
  State(state): State<AppState<S, C>>,
  Json(body): Json<Friend>,
) -> Result<Json<Friend>, ApiError>
where
  S: FeedStore,
  C: KeyValueCache + 'static,
{
  let edge = state.friends.add_friend(body.from, body.to).await?;
  Ok(Json(edge))
}

/// `GET /participant/{id}/friends`
pub async fn list<S, C>(
  State(state): State<AppState<S, C>>,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FeedStore,
  C: KeyValueCache + 'static,
{
  let list = state.friends.get_friends(id).await?;
  Ok(([(header::CONTENT_TYPE, "application/json; charset=utf-8")], list.json))
}
