//! Handlers for inbound and outbound events.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/participant/inbound` | Body: `{"to":..,"from":..,"subject":..,"story":..}` |
//! | `GET`  | `/participant/{id}/inbound` | Newest first; `[]` when empty |
//! | `POST` | `/participant/outbound` | Body: `{"from":..,"subject":..,"story":..}`; delivered to friends |
//! | `GET`  | `/participant/{id}/outbound` | Newest first |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use newsfeed_core::{
  event::{Inbound, NewInbound, NewOutbound, Outbound},
  store::KeyValueCache,
};

use crate::{AppState, FeedStore, error::ApiError, timeline};

/// `POST /participant/inbound`
pub async fn append_inbound<S, C>(
  State(state): State<AppState<S, C>>,
  Json(body): Json<NewInbound>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FeedStore,
  C: KeyValueCache + 'static,
{
  let event = state
    .store
    .append_inbound(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /participant/{id}/inbound`
pub async fn list_inbound<S, C>(
  State(state): State<AppState<S, C>>,
  Path(id): Path<i64>,
) -> Result<Json<Vec<Inbound>>, ApiError>
where
  S: FeedStore,
  C: KeyValueCache + 'static,
{
  let events = state.store.get_inbound(id).await.map_err(ApiError::store)?;
  Ok(Json(events))
}

/// `POST /participant/outbound`
pub async fn append_outbound<S, C>(
  State(state): State<AppState<S, C>>,
  Json(body): Json<NewOutbound>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FeedStore,
  C: KeyValueCache + 'static,
{
  let event = timeline::publish(state.store.as_ref(), &state.friends, body).await?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /participant/{id}/outbound`
pub async fn list_outbound<S, C>(
  State(state): State<AppState<S, C>>,
  Path(id): Path<i64>,
) -> Result<Json<Vec<Outbound>>, ApiError>
where
  S: FeedStore,
  C: KeyValueCache + 'static,
{
  let events = state.store.get_outbound(id).await.map_err(ApiError::store)?;
  Ok(Json(events))
}
