//! Core domain + application logic for the postbox relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and SQLite live
//! behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod moderation;
pub mod relay;
pub mod router;
pub mod store;
pub mod sweep;
pub mod utils;

pub use errors::{Error, Result};

#[cfg(test)]
pub(crate) mod test_support;
