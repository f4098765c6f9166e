//! The bearer's own view of the feed, proxied to the feed service.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me`       | The bearer's participant |
//! | `GET`  | `/friends`  | |
//! | `POST` | `/friends`  | Body: `{"to":..}` |
//! | `GET`  | `/inbound`  | Newest first |
//! | `GET`  | `/outbound` | Newest first |
//! | `POST` | `/outbound` | Body: `{"subject":..,"story":..}` |

use axum::{Json, extract::State, http::StatusCode};
use newsfeed_core::{
  event::{Inbound, NewOutbound, Outbound},
  friend::Friend,
  participant::Participant,
};
use serde::Deserialize;

use crate::{bearer::Bearer, error::ApiError, feed_client::FeedClient};

#[derive(Debug, Deserialize)]
pub struct AddFriend {
  pub to: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewStory {
  #[serde(default)]
  pub subject: String,
  #[serde(default)]
  pub story:   String,
}

/// `GET /me`
pub async fn me(
  State(feed): State<FeedClient>,
  bearer: Bearer,
) -> Result<Json<Participant>, ApiError> {
  Ok(Json(feed.participant(bearer.participant_id()?).await?))
}

/// `GET /friends`
pub async fn friends(
  State(feed): State<FeedClient>,
  bearer: Bearer,
) -> Result<Json<Vec<Friend>>, ApiError> {
  Ok(Json(feed.friends(bearer.participant_id()?).await?))
}

/// `POST /friends`
pub async fn add_friend(
  State(feed): State<FeedClient>,
  bearer: Bearer,
  Json(body): Json<AddFriend>,
) -> Result<Json<Friend>, ApiError> {
  let me = bearer.participant_id()?;
  if body.to <= 0 || body.to == me {
    return Err(ApiError::InvalidRequest(format!("cannot befriend {}", body.to)));
  }
  Ok(Json(feed.add_friend(me, body.to).await?))
}

/// `GET /inbound`
pub async fn inbound(
  State(feed): State<FeedClient>,
  bearer: Bearer,
) -> Result<Json<Vec<Inbound>>, ApiError> {
  Ok(Json(feed.inbound(bearer.participant_id()?).await?))
}

/// `GET /outbound`
pub async fn outbound(
  State(feed): State<FeedClient>,
  bearer: Bearer,
) -> Result<Json<Vec<Outbound>>, ApiError> {
  Ok(Json(feed.outbound(bearer.participant_id()?).await?))
}

/// `POST /outbound`
pub async fn post_story(
  State(feed): State<FeedClient>,
  bearer: Bearer,
  Json(body): Json<NewStory>,
) -> Result<(StatusCode, Json<Outbound>), ApiError> {
  let story = NewOutbound {
    from:    bearer.participant_id()?,
    subject: body.subject,
    story:   body.story,
  };
  Ok((StatusCode::CREATED, Json(feed.post(&story).await?)))
}
