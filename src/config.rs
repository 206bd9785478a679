//! Client configuration.
//!
//! All endpoint roots live in one injectable struct so that tests and
//! embedders can point the client at a different server. `ApiConfig::default()`
//! targets the real Spotify services.

/// Base URL of the Spotify Web API.
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Base URL of the Spotify accounts service (authorization and token
/// endpoints).
pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// OAuth scopes the tag workflow needs.
pub const SPOTIFY_SCOPE: &str =
    "user-read-currently-playing playlist-read-private playlist-modify-private playlist-modify-public";

/// Endpoint roots and application registration values.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Web API root, e.g. `https://api.spotify.com/v1`.
    pub api_base_url: String,
    /// Accounts service root, e.g. `https://accounts.spotify.com`.
    pub accounts_base_url: String,
    /// Client ID of the registered Spotify application.
    pub client_id: String,
    /// Redirect URI registered for the application.
    pub redirect_uri: String,
    /// Space-separated OAuth scopes requested on authorization.
    pub scope: String,
}

impl ApiConfig {
    /// Configuration for the real Spotify services with the given
    /// application registration.
    pub fn new(client_id: &str, redirect_uri: &str) -> Self {
        ApiConfig {
            client_id: client_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            ..ApiConfig::default()
        }
    }

    /// Full URL for a Web API endpoint path such as `/me/playlists`.
    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_base_url, endpoint)
    }

    /// Token exchange endpoint on the accounts service.
    pub fn token_endpoint(&self) -> String {
        format!("{}/api/token", self.accounts_base_url)
    }

    /// User-facing authorization endpoint on the accounts service.
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/authorize", self.accounts_base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            api_base_url: SPOTIFY_API_URL.to_string(),
            accounts_base_url: SPOTIFY_ACCOUNTS_URL.to_string(),
            client_id: String::new(),
            redirect_uri: String::new(),
            scope: SPOTIFY_SCOPE.to_string(),
        }
    }
}
