//! Cross-platform relay abstractions (Telegram today).

pub mod port;
pub mod types;
