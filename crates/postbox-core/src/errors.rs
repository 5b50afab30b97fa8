/// Core error type for the relay bot.
///
/// Adapter crates map their specific errors into this type so the bot core
/// can handle failures consistently. A store failure is a distinct variant
/// rather than an empty result, so callers can tell "not found" apart from
/// "store unreachable".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
