//! Error types for the community archiver

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected page structure: {0}")]
    PageFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Upstream-format misses and failed page fetches end the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::PageFormat(_) | Error::HttpStatus { .. } | Error::Transport(_)
        )
    }
}
