//! Error types for the Conductor client.
//!
//! The client never interprets server-side failures. A non-2xx response is
//! reported as [`Error::Transport`] with the status code and raw body, and
//! the caller decides what it means.

use thiserror::Error;

/// Errors that can occur while issuing a request against the Conductor API.
#[derive(Error, Debug)]
pub enum Error {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Transport {
        /// HTTP status code returned by the server
        status: u16,
        /// Raw response body, uninterpreted
        body: String,
    },

    /// The request never produced a response (refused, reset, TLS, timeout).
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// The base URL or a derived request URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A configured or middleware-supplied header is not a valid HTTP header.
    #[error("Invalid header '{name}': {message}")]
    InvalidHeader {
        /// Header name as supplied
        name: String,
        /// Why it was rejected
        message: String,
    },

    /// A request body could not be encoded or a response body decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A middleware rejected the request or response.
    #[error("Middleware error: {0}")]
    Middleware(String),
}

impl Error {
    /// HTTP status code, if the server produced a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            Self::Connection(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw response body of a non-2xx response.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Transport { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns `true` if the server answered with a non-2xx status.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(format!("TOML parse error: {}", err))
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
