pub mod account;
pub mod oauth;
