//! Async HTTP client for the feed service.

use std::time::Duration;

use newsfeed_core::{
  event::{Inbound, NewOutbound, Outbound},
  friend::Friend,
  participant::Participant,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::{
  error::{FeedError, IdentityError},
  provision::IdentityService,
};

/// Typed access to the feed service's JSON API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct FeedClient {
  client:   Client,
  base_url: String,
}

impl FeedClient {
  pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url.trim_end_matches('/'), path)
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FeedError> {
    let resp = self.client.get(self.url(path)).send().await?;
    expect_json(resp, path).await
  }

  // ── Participants ──────────────────────────────────────────────────────────

  /// `GET /participant/{id}`
  pub async fn participant(&self, id: i64) -> Result<Participant, FeedError> {
    self.get_json(&format!("/participant/{id}")).await
  }

  // ── Friends ───────────────────────────────────────────────────────────────

  /// `GET /participant/{id}/friends`
  pub async fn friends(&self, id: i64) -> Result<Vec<Friend>, FeedError> {
    self.get_json(&format!("/participant/{id}/friends")).await
  }

  /// `POST /participant/friends`
  pub async fn add_friend(&self, from: i64, to: i64) -> Result<Friend, FeedError> {
    let path = "/participant/friends";
    let resp = self
      .client
      .post(self.url(path))
      .json(&Friend { id: 0, from, to })
      .send()
      .await?;
    expect_json(resp, path).await
  }

  // ── Events ────────────────────────────────────────────────────────────────

  /// `GET /participant/{id}/inbound`
  pub async fn inbound(&self, id: i64) -> Result<Vec<Inbound>, FeedError> {
    self.get_json(&format!("/participant/{id}/inbound")).await
  }

  /// `GET /participant/{id}/outbound`
  pub async fn outbound(&self, id: i64) -> Result<Vec<Outbound>, FeedError> {
    self.get_json(&format!("/participant/{id}/outbound")).await
  }

  /// `POST /participant/outbound`
  pub async fn post(&self, story: &NewOutbound) -> Result<Outbound, FeedError> {
    let path = "/participant/outbound";
    let resp = self.client.post(self.url(path)).json(story).send().await?;
    expect_json(resp, path).await
  }
}

async fn expect_json<T: DeserializeOwned>(resp: Response, path: &str) -> Result<T, FeedError> {
  let status = resp.status();
  if !status.is_success() {
    return Err(FeedError::Status { path: path.to_owned(), status: status.as_u16() });
  }
  Ok(resp.json().await?)
}

impl IdentityService for FeedClient {
  /// `POST /participant`. Any 2xx reply is accepted as long as its body is a
  /// participant.
  async fn create_participant(&self, request: Participant) -> Result<Participant, IdentityError> {
    let path = "/participant";
    let resp = self
      .client
      .post(self.url(path))
      .json(&request)
      .send()
      .await
      .map_err(|e| IdentityError::Unreachable(Box::new(e)))?;

    let status = resp.status();
    if !status.is_success() {
      let e = FeedError::Status { path: path.to_owned(), status: status.as_u16() };
      return Err(IdentityError::Unreachable(Box::new(e)));
    }

    let body = resp
      .bytes()
      .await
      .map_err(|e| IdentityError::Unreachable(Box::new(e)))?;
    serde_json::from_slice(&body).map_err(|e| IdentityError::InvalidResponse(e.to_string()))
  }
}
