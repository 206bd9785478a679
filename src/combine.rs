//! Pure set combination of track lists.
//!
//! Identity is the track id throughout; everything else on a track is
//! metadata that rides along with the first instance seen.

use std::collections::{HashMap, HashSet};

use futures_util::future::try_join_all;

use crate::{
    client::SpotifyClient,
    error::Result,
    types::{Tag, Track},
};

/// Union of several track lists, deduplicated by track id.
///
/// Order is first occurrence across the lists in the given order; the first
/// instance seen supplies the metadata.
pub fn union_by_id(lists: &[Vec<Track>]) -> Vec<Track> {
    let mut seen_ids = HashSet::new();
    let mut union = Vec::new();

    for track in lists.iter().flatten() {
        if seen_ids.insert(track.id.clone()) {
            union.push(track.clone());
        }
    }
    union
}

/// Tracks present in every list, as the first list's instances in its
/// order. No lists means no tracks.
pub fn intersection_by_id(lists: &[Vec<Track>]) -> Vec<Track> {
    let (first, rest) = match lists.split_first() {
        Some(split) => split,
        None => return Vec::new(),
    };

    let mut intersection = first.clone();
    for list in rest {
        let ids: HashSet<&str> = list.iter().map(|track| track.id.as_str()).collect();
        intersection.retain(|track| ids.contains(track.id.as_str()));
    }
    intersection
}

/// Source lists OR-combined, then AND-filtered by the required lists.
///
/// No source lists yields nothing, even when required lists are given. No
/// required lists yields the plain union of the sources.
pub fn matching_tracks(source_lists: &[Vec<Track>], required_lists: &[Vec<Track>]) -> Vec<Track> {
    if source_lists.is_empty() {
        return Vec::new();
    }
    if required_lists.is_empty() {
        return union_by_id(source_lists);
    }

    let required_ids: HashSet<String> = intersection_by_id(required_lists)
        .into_iter()
        .map(|track| track.id)
        .collect();

    let filtered: Vec<Vec<Track>> = source_lists
        .iter()
        .map(|list| {
            list.iter()
                .filter(|track| required_ids.contains(track.id.as_str()))
                .cloned()
                .collect()
        })
        .collect();

    union_by_id(&filtered)
}

/// Combination role of one tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagFlags {
    pub source: bool,
    pub required: bool,
}

/// Selection state for building a combination, keyed by tag identity.
///
/// Flags survive reordering or refreshing of the tag list, unlike flags
/// kept in an array parallel to it.
#[derive(Debug, Clone, Default)]
pub struct TagSelection {
    flags: HashMap<String, TagFlags>,
}

impl TagSelection {
    pub fn new() -> Self {
        TagSelection::default()
    }

    pub fn flags(&self, tag: &Tag) -> TagFlags {
        self.flags
            .get(&tag.playlist_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn is_source(&self, tag: &Tag) -> bool {
        self.flags(tag).source
    }

    pub fn is_required(&self, tag: &Tag) -> bool {
        self.flags(tag).required
    }

    pub fn toggle_source(&mut self, tag: &Tag) {
        let entry = self.flags.entry(tag.playlist_id.clone()).or_default();
        entry.source = !entry.source;
    }

    pub fn toggle_required(&mut self, tag: &Tag) {
        let entry = self.flags.entry(tag.playlist_id.clone()).or_default();
        entry.required = !entry.required;
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }

    /// Splits a tag list into its source and required tags per the current
    /// flags, keeping the list's order. A tag may appear in both.
    pub fn partition(&self, tags: &[Tag]) -> (Vec<Tag>, Vec<Tag>) {
        let source = tags
            .iter()
            .filter(|tag| self.is_source(tag))
            .cloned()
            .collect();
        let required = tags
            .iter()
            .filter(|tag| self.is_required(tag))
            .cloned()
            .collect();
        (source, required)
    }
}

impl SpotifyClient {
    /// Tracks matching a tag combination: the union of all source tags'
    /// tracks, narrowed to those carried by every required tag.
    ///
    /// All track lists are fetched concurrently; the combination itself is
    /// [`matching_tracks`].
    pub async fn tracks_matching(
        &self,
        source_tags: &[Tag],
        required_tags: &[Tag],
    ) -> Result<Vec<Track>> {
        if source_tags.is_empty() {
            return Ok(Vec::new());
        }

        let fetches = source_tags
            .iter()
            .chain(required_tags.iter())
            .map(|tag| self.tracks_for_tag(tag));
        let mut lists = try_join_all(fetches).await?;

        let required_lists = lists.split_off(source_tags.len());
        Ok(matching_tracks(&lists, &required_lists))
    }
}
