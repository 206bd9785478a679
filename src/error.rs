//! Error types for the spotitags library.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the Spotify Web API or the
/// accounts service.
///
/// Display strings never contain token material.
#[derive(Error, Debug)]
pub enum Error {
    /// No credential is stored; the user has to authorize first
    #[error("not authenticated")]
    Unauthenticated,

    /// The refresh-token exchange was rejected; a new login is required
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The authorization-code exchange was rejected
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The API answered with a status the operation did not expect
    #[error("unexpected status {status}")]
    Http { status: StatusCode },

    /// Playlist creation did not answer 201 Created
    #[error("playlist creation failed with status {status}")]
    CreateFailed { status: StatusCode },

    /// Playlist deletion did not answer 200 OK
    #[error("playlist deletion failed with status {status}")]
    DeleteFailed { status: StatusCode },

    /// Transport-level failure from the HTTP client
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Credential storage could not be read or written
    #[error("credential storage error: {0}")]
    Storage(String),

    /// A configured endpoint does not form a valid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The pagination cursor returned by the API could not be parsed
    #[error("invalid pagination cursor: {0}")]
    Cursor(String),
}

/// Result type for spotitags operations.
pub type Result<T> = std::result::Result<T, Error>;
