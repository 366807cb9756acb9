//! Typed error hierarchy for the board client.
//!
//! Two top-level enums cover the two network-facing subsystems:
//! - `ApiError` — REST collaborator failures (task status confirmation,
//!   sprint and task loading)
//! - `ChannelError` — realtime transport failures
//!
//! `RouteError` is reported by route table validation only; matching itself
//! never fails.
//!
//! Neither escapes the core on the paths the board cares about: a failed
//! confirmation becomes a rollback, a failed transport becomes a retry.

use thiserror::Error;

/// Errors from the REST collaborator.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request failed {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid API base URL '{0}'")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// True when the server answered 404, which several endpoints use to
    /// signal "nothing here" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// Errors from the realtime transport.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Invalid realtime endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),

    #[error("WebSocket transport error: {0}")]
    Transport(String),

    #[error("Failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Problems found when validating a route table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Duplicate route path '{0}'")]
    Duplicate(String),

    #[error("Route path '{0}' must start with '/' and must not end with '/'")]
    Malformed(String),

    #[error("Route path '{path}' is outside the router prefix '{prefix}'")]
    OutsidePrefix { path: String, prefix: String },
}
