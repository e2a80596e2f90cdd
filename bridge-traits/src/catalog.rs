//! Catalog Abstraction
//!
//! Read-only lookups against the media server's library.

use async_trait::async_trait;
use bytes::Bytes;
use core_library::{Album, AlbumId, Track, TrackId};

use crate::error::Result;

/// Catalog fetch interface.
///
/// Lookups that find nothing return `Ok(None)` rather than an error, so the
/// caller decides whether absence is fatal. Transport failures are reported as
/// `BridgeError::Network`.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::catalog::CatalogClient;
///
/// async fn album_title(catalog: &dyn CatalogClient, id: AlbumId) -> Option<String> {
///     catalog.get_album(id).await.ok().flatten().map(|album| album.name)
/// }
/// ```
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch album metadata.
    async fn get_album(&self, album_id: AlbumId) -> Result<Option<Album>>;

    /// Fetch the full, ordered track list of an album.
    async fn get_tracks(&self, album_id: AlbumId) -> Result<Vec<Track>>;

    /// Fetch a single track.
    async fn get_track(&self, track_id: TrackId) -> Result<Option<Track>>;

    /// Fetch the album's primary artwork image bytes.
    async fn get_primary_art(&self, album_id: AlbumId) -> Result<Option<Bytes>>;
}
