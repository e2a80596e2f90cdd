//! Domain models for catalog entities
//!
//! Identifiers are UUID newtypes matching the server's item ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an album
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub Uuid);

impl AlbumId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AlbumId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Domain Models
// =============================================================================

/// A playable track as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier
    pub id: TrackId,
    /// Owning album
    pub album_id: AlbumId,
    /// Track title
    pub name: String,
    /// Track artist
    pub artist: String,
    /// Album name, denormalized for display
    pub album: String,
    /// Position on the album
    pub number: u32,
    /// Runtime, when the server knows it
    pub runtime: Option<Duration>,
    pub has_lyrics: bool,
    pub has_artwork: bool,
}

impl Track {
    /// Create a track with a fresh id and empty display fields.
    pub fn new(album_id: AlbumId, number: u32, name: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(),
            album_id,
            name: name.into(),
            artist: String::new(),
            album: String::new(),
            number,
            runtime: None,
            has_lyrics: false,
            has_artwork: false,
        }
    }

    pub fn with_id(mut self, id: TrackId) -> Self {
        self.id = id;
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    pub fn with_runtime(mut self, runtime: Duration) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_lyrics(mut self, has_lyrics: bool) -> Self {
        self.has_lyrics = has_lyrics;
        self
    }

    pub fn with_artwork(mut self, has_artwork: bool) -> Self {
        self.has_artwork = has_artwork;
        self
    }

    /// Title prefixed with the zero-padded track number, e.g. `03. Name`.
    pub fn display_title(&self) -> String {
        format!("{:02}. {}", self.number, self.name)
    }
}

/// Album metadata as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    /// Unique identifier
    pub id: AlbumId,
    /// Album artist
    pub artist: String,
    /// Album name
    pub name: String,
    /// Release year
    pub year: Option<i32>,
    /// Total runtime
    pub runtime: Option<Duration>,
    pub has_artwork: bool,
}

impl Album {
    /// Create an album with a fresh id.
    pub fn new(artist: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: AlbumId::new(),
            artist: artist.into(),
            name: name.into(),
            year: None,
            runtime: None,
            has_artwork: false,
        }
    }

    pub fn with_id(mut self, id: AlbumId) -> Self {
        self.id = id;
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_runtime(mut self, runtime: Duration) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_artwork(mut self, has_artwork: bool) -> Self {
        self.has_artwork = has_artwork;
        self
    }

    /// Build a track belonging to this album, inheriting artist and album name.
    pub fn track(&self, number: u32, name: impl Into<String>) -> Track {
        Track::new(self.id, number, name)
            .with_artist(self.artist.clone())
            .with_album(self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip_through_string() {
        let id = TrackId::new();
        let parsed = TrackId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);

        assert!(AlbumId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_album_track_inherits_display_fields() {
        let album = Album::new("Boards of Canada", "Geogaddi").with_year(2002);
        let track = album.track(3, "Music Is Math");

        assert_eq!(track.album_id, album.id);
        assert_eq!(track.artist, "Boards of Canada");
        assert_eq!(track.album, "Geogaddi");
        assert_eq!(track.display_title(), "03. Music Is Math");
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = AlbumId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
