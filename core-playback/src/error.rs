//! # Playback Error Types
//!
//! Error types for the playback engine and its command executor.

use bridge_traits::BridgeError;
use core_library::{AlbumId, TrackId};
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Catalog Errors
    // ========================================================================
    /// Track was not found in the queue or the catalog.
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Album metadata could not be found; aborts the start attempt.
    #[error("Album not found: {0}")]
    AlbumNotFound(AlbumId),

    /// Catalog request failed.
    #[error("Catalog request failed: {0}")]
    Catalog(#[source] BridgeError),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The stream URL could not be resolved.
    #[error("Stream unavailable: {0}")]
    StreamUnavailable(#[source] BridgeError),

    /// The audio output rejected an operation.
    #[error("Audio device error: {0}")]
    AudioDevice(#[source] BridgeError),

    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    // ========================================================================
    // Service Errors
    // ========================================================================
    /// Player configuration failed validation.
    #[error("Invalid player configuration: {0}")]
    InvalidConfig(String),

    /// The executor task has shut down.
    #[error("Player service is not running")]
    ServiceClosed,

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::StreamUnavailable(_) => true,
            PlaybackError::Catalog(err) | PlaybackError::AudioDevice(err) => {
                err.is_network_error()
            }
            _ => false,
        }
    }

    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        match self {
            PlaybackError::StreamUnavailable(err)
            | PlaybackError::Catalog(err)
            | PlaybackError::AudioDevice(err) => err.is_network_error(),
            _ => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_errors_are_transient() {
        let err = PlaybackError::StreamUnavailable(BridgeError::OperationFailed("503".into()));
        assert!(err.is_transient());
        assert!(!err.is_network_error());

        let err = PlaybackError::Catalog(BridgeError::Network("reset".into()));
        assert!(err.is_transient());
        assert!(err.is_network_error());
    }

    #[test]
    fn test_lookup_failures_are_permanent() {
        assert!(!PlaybackError::AlbumNotFound(AlbumId::new()).is_transient());
        assert!(!PlaybackError::InvalidVolume(2.0).is_transient());
    }

    #[test]
    fn test_messages_name_the_entity() {
        let id = TrackId::new();
        let message = PlaybackError::TrackNotFound(id).to_string();
        assert!(message.contains(&id.to_string()));
    }
}
