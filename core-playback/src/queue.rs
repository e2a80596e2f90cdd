//! # Playback Queue
//!
//! Ordered list of tracks plus an optional selection pointer.
//!
//! The selected track is always a member of the queue. Tracks are matched by
//! id and, when the same id appears twice, the first occurrence wins for
//! position and neighbor lookups.

use core_library::{Track, TrackId};
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    tracks: Vec<Track>,
    selected: Option<TrackId>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Append a single track.
    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Append tracks in order.
    pub fn extend<I>(&mut self, tracks: I)
    where
        I: IntoIterator<Item = Track>,
    {
        self.tracks.extend(tracks);
    }

    /// Replace the whole queue. The selection is dropped.
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.selected = None;
    }

    /// Remove every track and the selection.
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.selected = None;
    }

    /// Reset the queue to exactly `track`.
    ///
    /// The selection survives only if it pointed at that track.
    pub fn retain_only(&mut self, track: Track) {
        if self.selected != Some(track.id) {
            self.selected = None;
        }
        self.tracks = vec![track];
    }

    /// Randomly permute the queue. The selection pointer is unchanged.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.tracks.shuffle(rng);
    }

    /// Zero-based index of the first track with `id`.
    pub fn position(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|track| track.id == id)
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    pub fn first(&self) -> Option<&Track> {
        self.tracks.first()
    }

    /// Point the selection at `id`. Returns `false` (and changes nothing)
    /// when the track is not queued.
    pub fn select(&mut self, id: TrackId) -> bool {
        if self.contains(id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<&Track> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<TrackId> {
        self.selected
    }

    /// Track immediately after the first occurrence of `id`.
    pub fn next_after(&self, id: TrackId) -> Option<&Track> {
        self.position(id).and_then(|index| self.tracks.get(index + 1))
    }

    /// Track immediately before the first occurrence of `id`.
    pub fn previous_before(&self, id: TrackId) -> Option<&Track> {
        self.position(id)
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| self.tracks.get(index))
    }

    /// Whether the selected track has a successor.
    pub fn has_next(&self) -> bool {
        self.selected
            .map(|id| self.next_after(id).is_some())
            .unwrap_or(false)
    }

    /// Whether the selected track has a predecessor.
    pub fn has_previous(&self) -> bool {
        self.selected
            .map(|id| self.previous_before(id).is_some())
            .unwrap_or(false)
    }

    /// Whether the queue holds anything, optionally ignoring the selected track.
    pub fn has_tracks(&self, count_selected: bool) -> bool {
        if count_selected {
            return !self.tracks.is_empty();
        }
        self.tracks
            .iter()
            .any(|track| Some(track.id) != self.selected)
    }
}
