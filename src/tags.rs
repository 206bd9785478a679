//! Tag repository built on hidden playlists.
//!
//! A tag is an ordinary private playlist whose name starts with [`TAG_PREFIX`];
//! membership of a track in a tag is its membership in that playlist. Nothing
//! is cached: every question about tags goes to the API.

use std::collections::HashMap;

use futures_util::future::try_join_all;
use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::{
    client::SpotifyClient,
    error::{Error, Result},
    types::{PlaylistItem, PlaylistTrackItem, Tag, Track, TrackUrisRequest},
};

/// Name prefix that marks a playlist as a tag.
pub const TAG_PREFIX: &str = "#";

impl SpotifyClient {
    /// All tags of the current user.
    ///
    /// Pages through the user's playlists, keeps those whose name carries
    /// the sentinel prefix and sorts them by name ascending,
    /// case-insensitively.
    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let playlists: Vec<PlaylistItem> = self.request_paginated("/me/playlists", None).await?;

        let mut tags: Vec<Tag> = playlists
            .into_iter()
            .filter(|playlist| playlist.name.starts_with(TAG_PREFIX))
            .map(|playlist| Tag {
                name: playlist.name,
                playlist_id: playlist.id,
            })
            .collect();

        tags.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(tags)
    }

    /// Tracks carried by a tag, in playlist order.
    ///
    /// Playlist entries whose track is gone from the catalog, or carries no
    /// id (local files), are skipped.
    pub async fn tracks_for_tag(&self, tag: &Tag) -> Result<Vec<Track>> {
        let endpoint = format!("/playlists/{}/tracks", tag.playlist_id);
        let entries: Vec<PlaylistTrackItem> = self.request_paginated(&endpoint, None).await?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| entry.track)
            .filter_map(|track| track.into_track())
            .collect())
    }

    /// Creates a tag named `#<name>` backed by a fresh private playlist.
    pub async fn create_tag(&self, name: &str) -> Result<Tag> {
        let tag_name = format!("{}{}", TAG_PREFIX, name);
        let playlist_id = self.create_playlist(&tag_name).await?;

        debug!(%playlist_id, "tag created");
        Ok(Tag {
            name: tag_name,
            playlist_id,
        })
    }

    /// Deletes a tag by unfollowing its playlist.
    ///
    /// The backing playlist disappears from the user's library; any
    /// confirmation happens before this call.
    pub async fn delete_tag(&self, tag: &Tag) -> Result<()> {
        let endpoint = format!("/playlists/{}/followers", tag.playlist_id);
        let response = self
            .request::<()>(Method::DELETE, &endpoint, None, None)
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Error::DeleteFailed {
                status: response.status(),
            });
        }

        debug!(playlist_id = %tag.playlist_id, "tag deleted");
        Ok(())
    }

    /// Puts a track into a tag.
    pub async fn add_track_to_tag(&self, tag: &Tag, track: &Track) -> Result<()> {
        self.modify_membership(Method::POST, tag, track).await
    }

    /// Takes a track out of a tag.
    pub async fn remove_track_from_tag(&self, tag: &Tag, track: &Track) -> Result<()> {
        self.modify_membership(Method::DELETE, tag, track).await
    }

    async fn modify_membership(&self, method: Method, tag: &Tag, track: &Track) -> Result<()> {
        let endpoint = format!("/playlists/{}/tracks", tag.playlist_id);
        let request = TrackUrisRequest {
            uris: vec![track.uri()],
        };
        let response = self.request(method, &endpoint, None, Some(&request)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http { status });
        }
        Ok(())
    }

    /// Whether a tag carries a track.
    ///
    /// Answered by listing the tag's tracks; the API offers no direct
    /// membership lookup.
    pub async fn has_track(&self, tag: &Tag, track: &Track) -> Result<bool> {
        let tracks = self.tracks_for_tag(tag).await?;
        Ok(tracks.iter().any(|candidate| candidate.id == track.id))
    }

    /// Adds the track to the tag when absent, removes it when present.
    ///
    /// Read-then-act without coordination; a concurrent editor can
    /// interleave between the two steps. Returns whether the track is
    /// tagged afterwards.
    pub async fn toggle_tag(&self, tag: &Tag, track: &Track) -> Result<bool> {
        if self.has_track(tag, track).await? {
            self.remove_track_from_tag(tag, track).await?;
            Ok(false)
        } else {
            self.add_track_to_tag(tag, track).await?;
            Ok(true)
        }
    }

    /// Which of the given tags carry the track, keyed by the tag's playlist
    /// id. All tags are checked concurrently.
    pub async fn tag_states(
        &self,
        track: &Track,
        tags: &[Tag],
    ) -> Result<HashMap<String, bool>> {
        let lookups = tags.iter().map(|tag| self.has_track(tag, track));
        let states = try_join_all(lookups).await?;

        Ok(tags
            .iter()
            .zip(states)
            .map(|(tag, tagged)| (tag.playlist_id.clone(), tagged))
            .collect())
    }
}
