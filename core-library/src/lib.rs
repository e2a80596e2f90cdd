//! # Catalog Domain Models
//!
//! Value records describing the remote catalog entities the player works with.
//!
//! ## Overview
//!
//! Tracks and albums are fetched from the media server through the
//! `CatalogClient` bridge and are never mutated afterwards. The playback queue
//! stores clones of these records, so they are cheap to copy around and
//! compare by value.

pub mod models;

pub use models::{Album, AlbumId, Track, TrackId};
