//! Core types and trait definitions for the newsfeed services.
//!
//! No HTTP or database dependencies live here. The feed and edge services
//! depend on this crate; storage backends implement its traits.

pub mod credential;
pub mod error;
pub mod event;
pub mod friend;
pub mod participant;
pub mod store;

pub use error::{Error, Result};
