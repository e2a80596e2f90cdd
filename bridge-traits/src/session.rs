//! Remote Session Abstraction
//!
//! The media server keeps a "now playing" session per continuous listening
//! run. The engine reports transport changes through this contract and asks
//! it for stream URLs.

use async_trait::async_trait;
use core_library::TrackId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Server-issued identifier correlating a listening run across tracks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote playback session client.
///
/// The notification calls (`resume`, `pause`, `stop`, `seek`) are advisory.
/// The engine never lets their failure affect local playback, and any retry
/// policy belongs to the implementation.
///
/// The engine calls `start_session` at most once per continuous run: a new
/// session is only requested after a full stop has discarded the previous
/// token.
#[async_trait]
pub trait RemoteSessionClient: Send + Sync {
    /// Open a session for the first track of a listening run.
    async fn start_session(&self, track_id: TrackId) -> Result<SessionToken>;

    async fn resume_session(
        &self,
        token: &SessionToken,
        track_id: TrackId,
        position: Option<Duration>,
    ) -> Result<()>;

    async fn pause_session(
        &self,
        token: &SessionToken,
        track_id: TrackId,
        position: Option<Duration>,
    ) -> Result<()>;

    async fn stop_session(&self, token: &SessionToken, track_id: TrackId) -> Result<()>;

    async fn seek_session(
        &self,
        token: &SessionToken,
        track_id: TrackId,
        position: Option<Duration>,
    ) -> Result<()>;

    /// Resolve a stream URL for `track_id`.
    ///
    /// Must be callable repeatedly for the same track (after a reconnect, for
    /// example) and should honour `position` as the resume point. `token` is
    /// `None` when no session could be opened.
    async fn resolve_stream_url(
        &self,
        token: Option<&SessionToken>,
        track_id: TrackId,
        position: Option<Duration>,
    ) -> Result<String>;
}
