//! Tag-playlist core for Spotify.
//!
//! Tags are ordinary private playlists whose names start with `#`. The
//! modules here cover everything a front end needs to work with them:
//! OAuth 2.0 PKCE authorization and token upkeep, paginated Web API access,
//! tag and track operations, pure set combination of tag contents, and a
//! poller for the currently playing track.
//!
//! # Modules
//!
//! - `auth` - OAuth 2.0 PKCE authorization and token exchanges
//! - `client` - authenticated Web API client with pagination and 401 retry
//! - `combine` - pure union/intersection combination of track lists
//! - `config` - endpoint and application configuration
//! - `error` - error types
//! - `player` - currently-playing lookup and the background poller
//! - `playlists` - playlist creation and batch track adds
//! - `tags` - tag repository built on hidden playlists
//! - `token` - credential storage and the refresh gate
//! - `types` - data structures and type definitions
//! - `utils` - PKCE helpers
//!
//! # Example
//!
//! ```
//! use spotitags::{client::SpotifyClient, config::ApiConfig, token::TokenStore};
//!
//! #[tokio::main]
//! async fn main() -> spotitags::error::Result<()> {
//!     let config = ApiConfig::new("client-id", "http://127.0.0.1:8080/callback");
//!     let client = SpotifyClient::new(config.clone(), TokenStore::persistent(config));
//!
//!     for tag in client.list_tags().await? {
//!         println!("{}", tag.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod combine;
pub mod config;
pub mod error;
pub mod player;
pub mod playlists;
pub mod tags;
pub mod token;
pub mod types;
pub mod utils;
