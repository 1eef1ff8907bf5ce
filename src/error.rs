// Error type shared by the remote client, the access layer and the auth
// chain. The UI turns these into text; the binary wraps them in `anyhow`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced a usable response (connect, timeout, body read).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// A response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The write was accepted but no record came back. The row may still
    /// exist remotely if a visibility policy hid it from the echo.
    #[error("{table} insert succeeded but no record was returned")]
    EmptyResult { table: &'static str },

    #[error("no {table} record with id {id}")]
    NotFound { table: &'static str, id: i64 },

    #[error("an issue needs an owning user id")]
    MissingOwner,

    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse buckets used when surfacing an error to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Transport,
    EmptyResult,
    NotFound,
    Invalid,
}

impl Error {
    pub fn category(&self) -> Category {
        match self {
            Error::Transport(_) | Error::Service { .. } | Error::Decode(_) => Category::Transport,
            Error::EmptyResult { .. } => Category::EmptyResult,
            Error::NotFound { .. } => Category::NotFound,
            Error::MissingOwner | Error::Config(_) => Category::Invalid,
        }
    }
}
