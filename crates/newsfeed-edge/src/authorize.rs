//! Resource-owner check for the authorization endpoint.
//!
//! Session storage is abstracted behind [`SessionState`]; how the session is
//! carried between requests is the caller's concern.

use std::collections::HashMap;

use axum::{
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

/// Session key set by the login form once the user has signed in.
pub const LOGGED_IN_USER_ID: &str = "LoggedInUserID";

/// Session key holding the authorization request to resume after login.
pub const RETURN_URI: &str = "ReturnUri";

/// Request-scoped session values.
pub trait SessionState {
  fn get(&self, key: &str) -> Option<String>;
  fn set(&mut self, key: &str, value: String);
  fn remove(&mut self, key: &str) -> Option<String>;
}

impl SessionState for HashMap<String, String> {
  fn get(&self, key: &str) -> Option<String> { HashMap::get(self, key).cloned() }

  fn set(&mut self, key: &str, value: String) { self.insert(key.to_owned(), value); }

  fn remove(&mut self, key: &str) -> Option<String> { HashMap::remove(self, key) }
}

/// The user is not signed in; they are sent to the login page.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("login required")]
pub struct LoginRequired;

impl IntoResponse for LoginRequired {
  fn into_response(self) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/login")]).into_response()
  }
}

/// Return the signed-in user id, consuming it from the session.
///
/// Without a signed-in user, `return_form` (the encoded authorization
/// request) is saved under [`RETURN_URI`] so it can be replayed after login.
pub fn authorize_resource_owner(
  session: &mut impl SessionState,
  return_form: &str,
) -> Result<String, LoginRequired> {
  match session.remove(LOGGED_IN_USER_ID) {
    Some(user_id) => Ok(user_id),
    None => {
      session.set(RETURN_URI, return_form.to_owned());
      Err(LoginRequired)
    }
  }
}
