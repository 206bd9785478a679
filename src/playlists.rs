//! Ordinary playlist creation.
//!
//! Combination results become regular, visible playlists; tag playlists are
//! created through the same calls with the sentinel name.

use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::{
    client::SpotifyClient,
    error::{Error, Result},
    types::{CreatePlaylistRequest, CreatePlaylistResponse, Track, TrackUrisRequest, UserProfile},
};

impl SpotifyClient {
    /// Id of the authenticated user.
    pub async fn current_user_id(&self) -> Result<String> {
        let response = self.get("/me", None).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http { status });
        }

        let profile: UserProfile = response.json().await?;
        Ok(profile.id)
    }

    /// Creates a private playlist and returns its id.
    ///
    /// Anything but 201 Created maps to [`Error::CreateFailed`].
    pub async fn create_playlist(&self, name: &str) -> Result<String> {
        let user_id = self.current_user_id().await?;
        let request = CreatePlaylistRequest {
            name: name.to_string(),
            public: false,
        };

        let response = self
            .request(
                Method::POST,
                &format!("/users/{}/playlists", user_id),
                None,
                Some(&request),
            )
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(Error::CreateFailed {
                status: response.status(),
            });
        }

        let created: CreatePlaylistResponse = response.json().await?;
        Ok(created.id)
    }

    /// Adds all tracks to a playlist in one request.
    ///
    /// An empty list performs no call at all. The API caps one addition at
    /// 100 URIs; longer lists are not chunked here.
    pub async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        tracks: &[Track],
    ) -> Result<()> {
        if tracks.is_empty() {
            return Ok(());
        }

        let request = TrackUrisRequest {
            uris: tracks.iter().map(Track::uri).collect(),
        };
        let response = self
            .request(
                Method::POST,
                &format!("/playlists/{}/tracks", playlist_id),
                None,
                Some(&request),
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http { status });
        }
        Ok(())
    }

    /// Creates a playlist holding exactly the given tracks and returns its
    /// id.
    pub async fn create_playlist_from_tracks(
        &self,
        name: &str,
        tracks: &[Track],
    ) -> Result<String> {
        let playlist_id = self.create_playlist(name).await?;
        self.add_tracks_to_playlist(&playlist_id, tracks).await?;

        debug!(%playlist_id, tracks = tracks.len(), "playlist created");
        Ok(playlist_id)
    }
}
