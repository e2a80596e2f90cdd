//! # Player Engine
//!
//! Owns the queue, the album context, the remote session and the audible
//! stream, and implements every player operation on top of them.
//!
//! ## State
//!
//! - **Queue**: ordered tracks plus an optional selection (always a member).
//! - **Audible track**: the track whose stream is bound to the output, playing
//!   or paused. It may differ from the selection after a skip while paused.
//! - **Transport**: mirror of the sink state (`None`, `Stopped`, `Playing`,
//!   `Paused`). The sink is never asked for it.
//! - **Session**: opened on the first start, kept across track switches and
//!   network recovery, closed by a full stop.
//! - **Network-lost flag**: set when connectivity drops, cleared when a fresh
//!   stream is bound. While set, resuming the audible track rebuilds its
//!   stream from the last known position instead of resuming in place.
//!
//! All operations take `&mut self`; [`crate::service::PlayerService`] runs the
//! engine on a single task so commands, end-of-stream signals and network
//! signals never interleave.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{AudioOutput, CatalogClient, NetworkStatus, RemoteSessionClient, StreamRequest};
use bytes::Bytes;
use core_library::{Album, AlbumId, Track, TrackId};
use core_runtime::events::{CoreEvent, EventBus, NetworkEvent, PlayerEvent, SessionEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::config::PlayerConfig;
use crate::error::{PlaybackError, Result};
use crate::queue::PlaybackQueue;
use crate::session::{PlaybackSession, SessionOperation, SessionReporter};
use crate::state::{LoadPhase, PlayerState, TrackState, TransportState};
use crate::transport::ActiveStream;

/// Asynchronous inputs funneled into the engine next to user commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSignal {
    /// The stream bound with `generation` finished on its own.
    EndOfStream { generation: u64 },
    /// Connectivity changed.
    Network(NetworkStatus),
}

/// Collaborators the engine talks to.
#[derive(Clone)]
pub struct PlayerDependencies {
    pub catalog: Arc<dyn CatalogClient>,
    pub session_client: Arc<dyn RemoteSessionClient>,
    pub audio_output: Arc<dyn AudioOutput>,
}

pub struct PlayerEngine {
    catalog: Arc<dyn CatalogClient>,
    session_client: Arc<dyn RemoteSessionClient>,
    audio_output: Arc<dyn AudioOutput>,
    reporter: SessionReporter,
    events: EventBus,
    signals: mpsc::UnboundedSender<EngineSignal>,
    report_session: bool,

    queue: PlaybackQueue,
    album: Option<Album>,
    artwork: Option<Bytes>,
    session: Option<PlaybackSession>,
    active: Option<ActiveStream>,
    transport: TransportState,
    last_position: Option<Duration>,
    network_lost: bool,
    offline: bool,
    generation: u64,
    volume: f32,
    muted: bool,
}

impl PlayerEngine {
    /// Create an idle engine. Must be called inside a tokio runtime.
    pub fn new(
        deps: PlayerDependencies,
        events: EventBus,
        config: &PlayerConfig,
        signals: mpsc::UnboundedSender<EngineSignal>,
    ) -> Self {
        let reporter = SessionReporter::spawn(deps.session_client.clone(), events.clone());

        Self {
            catalog: deps.catalog,
            session_client: deps.session_client,
            audio_output: deps.audio_output,
            reporter,
            events,
            signals,
            report_session: config.report_session,
            queue: PlaybackQueue::new(),
            album: None,
            artwork: None,
            session: None,
            active: None,
            transport: TransportState::None,
            last_position: None,
            network_lost: false,
            offline: false,
            generation: 0,
            volume: config.initial_volume.clamp(0.0, 1.0),
            muted: config.initial_muted,
        }
    }

    // ========================================================================
    // Queue
    // ========================================================================

    /// Append a track. Starts it right away unless something is playing.
    #[instrument(skip(self, track), fields(track_id = %track.id))]
    pub async fn add_track(&mut self, track: Track) -> Result<()> {
        let track_id = track.id;
        self.queue.push(track);

        if self.transport == TransportState::Playing {
            return Ok(());
        }

        self.select_track(track_id);
        self.start_track(Some(track_id)).await
    }

    /// Append tracks without touching playback.
    pub fn add_tracks(&mut self, tracks: Vec<Track>) {
        debug!(count = tracks.len(), "Queueing tracks");
        self.queue.extend(tracks);
    }

    /// Drop every queued track except the audible one.
    pub fn clear_tracks(&mut self) {
        match &self.active {
            Some(active) => {
                let current = active.track().clone();
                self.queue.retain_only(current);
            }
            None => self.queue.clear(),
        }
        self.emit_state(self.transport.into());
    }

    pub fn shuffle_tracks(&mut self) {
        self.queue.shuffle(&mut rand::thread_rng());
    }

    /// Point the selection at a queued track. Unknown ids are ignored.
    pub fn select_track(&mut self, track_id: TrackId) {
        if self.queue.select(track_id) {
            self.emit_state(PlayerState::Selected);
        } else {
            debug!(%track_id, "Ignoring selection of unqueued track");
        }
    }

    /// Start `track` if it is queued.
    pub async fn play_track(&mut self, track: Track) -> Result<()> {
        if !self.queue.contains(track.id) {
            debug!(track_id = %track.id, "Ignoring play request for unqueued track");
            return Ok(());
        }
        self.start_track(Some(track.id)).await
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Make `track_id` (or the head of the queue) audible.
    ///
    /// Opens the album context first when the track is unknown or belongs to
    /// another album. Resuming the audible track continues in place unless the
    /// network was lost, in which case the stream is rebuilt at the last
    /// known position.
    #[instrument(skip(self))]
    pub async fn start_track(&mut self, track_id: Option<TrackId>) -> Result<()> {
        let target = match track_id.or_else(|| self.queue.first().map(|track| track.id))
        {
            Some(target) => target,
            None => {
                debug!("Nothing to start");
                return Ok(());
            }
        };

        let result = self.start_inner(target).await;
        if let Err(err) = &result {
            warn!(track_id = %target, error = %err, "Failed to start track");
            if self.active.is_none()
                && matches!(self.transport, TransportState::Playing | TransportState::Paused)
            {
                self.transport = TransportState::Stopped;
                self.emit_state(TransportState::Stopped.into());
            }
            self.emit_error(Some(target), err);
        }
        result
    }

    async fn start_inner(&mut self, target: TrackId) -> Result<()> {
        self.emit_state(PlayerState::Starting);
        self.ensure_album_context(target).await?;

        if !self.queue.select(target) {
            return Err(PlaybackError::TrackNotFound(target));
        }
        let track = self
            .queue
            .get(target)
            .cloned()
            .ok_or(PlaybackError::TrackNotFound(target))?;

        self.start_transport(track).await?;

        self.transport = TransportState::Playing;
        self.emit_state(TransportState::Playing.into());
        Ok(())
    }

    async fn ensure_album_context(&mut self, target: TrackId) -> Result<()> {
        if let Some(album_id) = self.queue.get(target).map(|track| track.album_id) {
            if self.album.as_ref().map(|album| album.id) == Some(album_id) {
                return Ok(());
            }
            self.emit_state(LoadPhase::Loading.into());
            return self.open_album(album_id, false).await;
        }

        self.emit_state(LoadPhase::Loading.into());
        let track = self
            .catalog
            .get_track(target)
            .await
            .map_err(PlaybackError::Catalog)?
            .ok_or(PlaybackError::TrackNotFound(target))?;

        self.open_album(track.album_id, true).await
    }

    async fn open_album(&mut self, album_id: AlbumId, replace_queue: bool) -> Result<()> {
        let album = self
            .catalog
            .get_album(album_id)
            .await
            .map_err(PlaybackError::Catalog)?
            .ok_or(PlaybackError::AlbumNotFound(album_id))?;

        if replace_queue {
            let tracks = self
                .catalog
                .get_tracks(album_id)
                .await
                .map_err(PlaybackError::Catalog)?;
            self.queue.replace(tracks);
        }

        info!(%album_id, album = %album.name, "Opened album");
        let has_artwork = album.has_artwork;
        self.album = Some(album);
        self.artwork = None;
        self.emit_state(LoadPhase::LoadedInfo.into());

        if !has_artwork {
            return Ok(());
        }
        match self.catalog.get_primary_art(album_id).await {
            Ok(Some(artwork)) => {
                self.artwork = Some(artwork);
                self.emit_state(LoadPhase::LoadedArtwork.into());
            }
            Ok(None) => debug!(%album_id, "Album artwork missing from catalog"),
            Err(err) => warn!(%album_id, error = %err, "Failed to fetch artwork"),
        }
        Ok(())
    }

    async fn start_transport(&mut self, track: Track) -> Result<()> {
        self.ensure_session(track.id).await;

        let mut resume_from = None;
        if let Some(active) = self.active.take() {
            if active.track_id() == track.id {
                let position = active.position().await.or(self.last_position);
                self.report(SessionOperation::Resume, track.id, position);

                if !self.network_lost {
                    let resumed = active.play().await;
                    self.active = Some(active);
                    return resumed;
                }

                info!(track_id = %track.id, ?position, "Rebuilding stream after network loss");
                resume_from = position;
            }

            // The session stays open across a track switch.
            active.release().await;
        }

        self.bind_stream(track, resume_from).await
    }

    async fn ensure_session(&mut self, track_id: TrackId) {
        if !self.report_session || self.session.is_some() {
            return;
        }

        match self.session_client.start_session(track_id).await {
            Ok(token) => {
                info!(%track_id, "Playback session started");
                self.session = Some(PlaybackSession::new(token, track_id));
                self.emit(CoreEvent::Session(SessionEvent::Started { track_id }));
            }
            Err(err) => {
                warn!(%track_id, error = %err, "Failed to start playback session");
                self.emit(CoreEvent::Session(SessionEvent::NotificationFailed {
                    operation: "start".to_string(),
                    track_id,
                    message: err.to_string(),
                }));
            }
        }
    }

    async fn bind_stream(&mut self, track: Track, start_position: Option<Duration>) -> Result<()> {
        let token = self.session.as_ref().map(PlaybackSession::token);
        let url = self
            .session_client
            .resolve_stream_url(token, track.id, start_position)
            .await
            .map_err(PlaybackError::StreamUnavailable)?;

        let request = StreamRequest::new(url)
            .with_start_position(start_position)
            .with_volume(self.effective_volume());

        self.generation += 1;
        let stream =
            ActiveStream::open(self.audio_output.as_ref(), track, request, self.generation).await?;

        if let Err(err) = stream.play().await {
            stream.release().await;
            return Err(err);
        }
        stream.watch_end_of_stream(self.signals.clone());

        debug!(
            track_id = %stream.track_id(),
            generation = stream.generation(),
            "Stream bound"
        );

        if let Some(session) = self.session.as_mut() {
            session.moved_to(stream.track_id(), start_position);
        }
        self.network_lost = false;
        self.last_position = start_position;
        self.active = Some(stream);
        Ok(())
    }

    /// Pause the audible track. No-op unless something is playing.
    #[instrument(skip(self))]
    pub async fn pause_track(&mut self) -> Result<()> {
        if self.transport != TransportState::Playing {
            debug!("Nothing playing to pause");
            return Ok(());
        }
        let Some(active) = self.active.as_ref() else {
            return Ok(());
        };

        active.pause().await?;
        let position = active.position().await;
        let track_id = active.track_id();

        if position.is_some() {
            self.last_position = position;
        }
        self.report(SessionOperation::Pause, track_id, position);

        self.transport = TransportState::Paused;
        self.emit_state(TransportState::Paused.into());
        Ok(())
    }

    /// Full stop: releases the stream and closes the session.
    #[instrument(skip(self))]
    pub async fn stop_track(&mut self) -> Result<()> {
        if self.active.is_none() && self.queue.selected_id().is_none() {
            debug!("Nothing to stop");
            return Ok(());
        }

        self.teardown().await;

        self.transport = TransportState::Stopped;
        self.emit_state(TransportState::Stopped.into());
        Ok(())
    }

    /// Pause when playing, otherwise start the selection (or the head of the
    /// queue when nothing is selected).
    pub async fn start_or_pause_track(&mut self) -> Result<()> {
        if self.transport == TransportState::Playing {
            return self.pause_track().await;
        }
        let selected = self.queue.selected_id();
        self.start_track(selected).await
    }

    /// Select the track after the selection, starting it if playback was
    /// running. Past the end of the queue playback stops.
    #[instrument(skip(self))]
    pub async fn next_track(&mut self) -> Result<()> {
        let Some(selected) = self.queue.selected_id() else {
            return Ok(());
        };
        let was_playing = self.transport == TransportState::Playing;

        let Some(next) = self.queue.next_after(selected).map(|track| track.id) else {
            info!("Reached end of queue");
            self.stop_track().await?;
            self.transport = TransportState::None;
            self.emit_state(TransportState::None.into());
            return Ok(());
        };

        self.queue.select(next);
        self.emit_state(PlayerState::SkipNext);

        if was_playing {
            self.start_track(Some(next)).await?;
        }
        Ok(())
    }

    /// Select the track before the selection, starting it if playback was
    /// running. No-op at the head of the queue.
    #[instrument(skip(self))]
    pub async fn previous_track(&mut self) -> Result<()> {
        let Some(selected) = self.queue.selected_id() else {
            return Ok(());
        };
        let was_playing = self.transport == TransportState::Playing;

        let Some(previous) = self.queue.previous_before(selected).map(|track| track.id) else {
            debug!("Already at start of queue");
            return Ok(());
        };

        self.queue.select(previous);
        self.emit_state(PlayerState::SkipPrevious);

        if was_playing {
            self.start_track(Some(previous)).await?;
        }
        Ok(())
    }

    /// Seek the audible track.
    #[instrument(skip(self))]
    pub async fn seek_track(&mut self, position: Duration) -> Result<()> {
        let Some(active) = self.active.as_ref() else {
            debug!("Nothing bound to seek");
            return Ok(());
        };

        active.seek(position).await?;
        let track_id = active.track_id();
        let runtime = active.track().runtime;

        self.last_position = Some(position);
        self.report(SessionOperation::Seek, track_id, Some(position));
        self.emit_position(track_id, position, runtime);
        Ok(())
    }

    // ========================================================================
    // Volume
    // ========================================================================

    /// Set the output volume (0.0-1.0).
    pub async fn set_volume(&mut self, volume: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }
        self.volume = volume;
        self.apply_volume().await
    }

    /// Set the output volume in percent. Values outside 0-100 are clamped.
    pub async fn set_volume_percent(&mut self, percent: f64) -> Result<()> {
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        self.set_volume((percent / 100.0) as f32).await
    }

    pub async fn set_muted(&mut self, muted: bool) -> Result<()> {
        self.muted = muted;
        self.apply_volume().await
    }

    async fn apply_volume(&mut self) -> Result<()> {
        if let Some(active) = &self.active {
            active.set_volume(self.effective_volume()).await?;
        }
        self.emit(CoreEvent::Player(PlayerEvent::VolumeChanged {
            volume_percent: self.volume_percent(),
            muted: self.muted,
        }));
        Ok(())
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    // ========================================================================
    // Signals
    // ========================================================================

    /// React to end-of-stream or connectivity changes.
    pub async fn handle_signal(&mut self, signal: EngineSignal) -> Result<()> {
        match signal {
            EngineSignal::EndOfStream { generation } => {
                let current = self.active.as_ref().map(ActiveStream::generation);
                if current != Some(generation) {
                    debug!(generation, ?current, "Ignoring stale end-of-stream");
                    return Ok(());
                }
                info!("Track finished");
                self.next_track().await
            }
            EngineSignal::Network(status) => {
                self.on_network_status(status);
                Ok(())
            }
        }
    }

    fn on_network_status(&mut self, status: NetworkStatus) {
        if status.is_lost() {
            self.network_lost = true;
            if !self.offline {
                self.offline = true;
                warn!("Network lost; the stream will be rebuilt on next resume");
                self.emit(CoreEvent::Network(NetworkEvent::Lost));
            }
            return;
        }

        if status == NetworkStatus::Connected && self.offline {
            self.offline = false;
            info!("Network restored");
            self.emit(CoreEvent::Network(NetworkEvent::Restored));
        }
    }

    /// Emit a position notification for the playing track.
    pub async fn publish_position(&mut self) {
        if self.transport != TransportState::Playing {
            return;
        }
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let Some(position) = active.position().await else {
            return;
        };
        let track_id = active.track_id();
        let runtime = active.track().runtime;

        self.last_position = Some(position);
        self.emit_position(track_id, position, runtime);
    }

    /// Release everything and close the session.
    pub async fn shutdown(&mut self) {
        let was_bound = self.active.is_some();
        self.teardown().await;
        if was_bound {
            self.transport = TransportState::Stopped;
            self.emit_state(TransportState::Stopped.into());
        }
        self.reporter.flush().await;
        info!("Player engine shut down");
    }

    /// Wait for queued session notifications to reach the server.
    pub async fn flush_session_reports(&self) {
        self.reporter.flush().await;
    }

    async fn teardown(&mut self) {
        let active = self.active.take();

        if let Some(session) = self.session.take() {
            let track_id = active
                .as_ref()
                .map(ActiveStream::track_id)
                .unwrap_or_else(|| session.track_id());
            self.reporter.stop(session.token(), track_id);
            info!(%track_id, "Playback session closed");
            self.emit(CoreEvent::Session(SessionEvent::Closed { track_id }));
        }

        if let Some(active) = active {
            active.release().await;
        }
        self.last_position = None;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn tracks(&self) -> &[Track] {
        self.queue.tracks()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.queue.selected()
    }

    pub fn selected_track_id(&self) -> Option<TrackId> {
        self.queue.selected_id()
    }

    /// With `None`, whether anything is selected.
    pub fn is_selected_track(&self, track_id: Option<TrackId>) -> bool {
        match track_id {
            Some(id) => self.queue.selected_id() == Some(id),
            None => self.queue.selected_id().is_some(),
        }
    }

    pub fn selected_album(&self) -> Option<&Album> {
        self.album.as_ref()
    }

    pub fn artwork(&self) -> Option<&Bytes> {
        self.artwork.as_ref()
    }

    /// The audible track, playing or paused.
    pub fn playing_track(&self) -> Option<&Track> {
        self.active.as_ref().map(ActiveStream::track)
    }

    /// Whether `track_id` is the audible track (and, if given, `album_id`
    /// is the open album).
    pub fn is_playing_track(&self, track_id: TrackId, album_id: Option<AlbumId>) -> bool {
        if self.active.as_ref().map(ActiveStream::track_id) != Some(track_id) {
            return false;
        }
        match album_id {
            Some(album_id) => self.album.as_ref().map(|album| album.id) == Some(album_id),
            None => true,
        }
    }

    pub fn track_state(&self, track_id: TrackId) -> TrackState {
        if self.active.as_ref().map(ActiveStream::track_id) == Some(track_id) {
            if self.transport == TransportState::Playing {
                return TrackState::Playing;
            }
            return TrackState::Paused;
        }
        if self.queue.selected_id() == Some(track_id) {
            return TrackState::Selected;
        }
        TrackState::None
    }

    pub fn has_next_track(&self) -> bool {
        self.queue.has_next()
    }

    pub fn has_previous_track(&self) -> bool {
        self.queue.has_previous()
    }

    pub fn has_tracks(&self, count_selected: bool) -> bool {
        self.queue.has_tracks(count_selected)
    }

    pub fn queue_position(&self, track_id: TrackId) -> Option<usize> {
        self.queue.position(track_id)
    }

    pub fn is_playing(&self) -> bool {
        self.transport == TransportState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.transport == TransportState::Paused
    }

    /// `Playing`, `Paused` or `Stopped`.
    pub fn playback_state(&self) -> TransportState {
        match self.transport {
            TransportState::Playing => TransportState::Playing,
            TransportState::Paused => TransportState::Paused,
            _ => TransportState::Stopped,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn volume_percent(&self) -> u8 {
        (self.volume * 100.0).round() as u8
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Whether a session token is held.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the next resume will rebuild the stream.
    pub fn is_network_lost(&self) -> bool {
        self.network_lost
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    fn report(&self, operation: SessionOperation, track_id: TrackId, position: Option<Duration>) {
        let Some(session) = &self.session else {
            return;
        };
        let token = session.token();
        match operation {
            SessionOperation::Resume => self.reporter.resume(token, track_id, position),
            SessionOperation::Pause => self.reporter.pause(token, track_id, position),
            SessionOperation::Seek => self.reporter.seek(token, track_id, position),
            SessionOperation::Stop => self.reporter.stop(token, track_id),
        }
    }

    fn emit(&self, event: CoreEvent) {
        // No subscribers is not an error.
        self.events.emit(event).ok();
    }

    fn emit_state(&self, state: PlayerState) {
        debug!(?state, transport = ?self.transport, "Player state changed");
        self.emit(CoreEvent::Player(PlayerEvent::StateChanged {
            state,
            transport: self.transport,
            album: self.album.clone(),
            tracks: self.queue.tracks().to_vec(),
            selected_track: self.queue.selected().cloned(),
        }));
    }

    fn emit_position(&self, track_id: TrackId, position: Duration, runtime: Option<Duration>) {
        self.emit(CoreEvent::Player(PlayerEvent::PositionChanged {
            track_id,
            position_ms: position.as_millis() as u64,
            duration_ms: runtime.map(|runtime| runtime.as_millis() as u64),
        }));
    }

    fn emit_error(&self, track_id: Option<TrackId>, err: &PlaybackError) {
        self.emit(CoreEvent::Player(PlayerEvent::Error {
            track_id,
            message: err.to_string(),
            recoverable: err.is_transient(),
        }));
    }
}

impl std::fmt::Debug for PlayerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerEngine")
            .field("tracks", &self.queue.len())
            .field("selected", &self.queue.selected_id())
            .field("active", &self.active)
            .field("transport", &self.transport)
            .field("network_lost", &self.network_lost)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::{AudioSink, SessionToken};
    use mockall::mock;

    mock! {
        Catalog {}

        #[async_trait]
        impl CatalogClient for Catalog {
            async fn get_album(&self, album_id: AlbumId) -> BridgeResult<Option<Album>>;
            async fn get_tracks(&self, album_id: AlbumId) -> BridgeResult<Vec<Track>>;
            async fn get_track(&self, track_id: TrackId) -> BridgeResult<Option<Track>>;
            async fn get_primary_art(&self, album_id: AlbumId) -> BridgeResult<Option<Bytes>>;
        }
    }

    /// Collaborator that must never be reached by the flows under test.
    struct Unreachable;

    #[async_trait]
    impl RemoteSessionClient for Unreachable {
        async fn start_session(&self, _track_id: TrackId) -> BridgeResult<SessionToken> {
            Err(BridgeError::NotAvailable("session".into()))
        }

        async fn resume_session(
            &self,
            _token: &SessionToken,
            _track_id: TrackId,
            _position: Option<Duration>,
        ) -> BridgeResult<()> {
            Err(BridgeError::NotAvailable("session".into()))
        }

        async fn pause_session(
            &self,
            _token: &SessionToken,
            _track_id: TrackId,
            _position: Option<Duration>,
        ) -> BridgeResult<()> {
            Err(BridgeError::NotAvailable("session".into()))
        }

        async fn stop_session(&self, _token: &SessionToken, _track_id: TrackId) -> BridgeResult<()> {
            Err(BridgeError::NotAvailable("session".into()))
        }

        async fn seek_session(
            &self,
            _token: &SessionToken,
            _track_id: TrackId,
            _position: Option<Duration>,
        ) -> BridgeResult<()> {
            Err(BridgeError::NotAvailable("session".into()))
        }

        async fn resolve_stream_url(
            &self,
            _token: Option<&SessionToken>,
            _track_id: TrackId,
            _position: Option<Duration>,
        ) -> BridgeResult<String> {
            Err(BridgeError::NotAvailable("session".into()))
        }
    }

    #[async_trait]
    impl AudioOutput for Unreachable {
        async fn open(&self, _request: StreamRequest) -> BridgeResult<Box<dyn AudioSink>> {
            Err(BridgeError::NotAvailable("audio".into()))
        }
    }

    fn engine_with(catalog: MockCatalog) -> (PlayerEngine, EventBus) {
        let events = EventBus::new(64);
        let (signals, _rx) = mpsc::unbounded_channel();
        let deps = PlayerDependencies {
            catalog: Arc::new(catalog),
            session_client: Arc::new(Unreachable),
            audio_output: Arc::new(Unreachable),
        };
        let engine = PlayerEngine::new(deps, events.clone(), &PlayerConfig::default(), signals);
        (engine, events)
    }

    #[tokio::test]
    async fn test_start_on_empty_queue_is_noop() {
        let (mut engine, events) = engine_with(MockCatalog::new());
        let mut stream = events.subscribe();

        engine.start_track(None).await.unwrap();

        assert!(stream.try_recv().is_err());
        assert_eq!(engine.playback_state(), TransportState::Stopped);
    }

    #[tokio::test]
    async fn test_selecting_unknown_track_changes_nothing() {
        let (mut engine, events) = engine_with(MockCatalog::new());
        let mut stream = events.subscribe();

        engine.select_track(TrackId::new());

        assert!(engine.selected_track_id().is_none());
        assert!(stream.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_pause_without_audible_track_is_noop() {
        let (mut engine, events) = engine_with(MockCatalog::new());
        let mut stream = events.subscribe();

        engine.pause_track().await.unwrap();

        assert!(stream.try_recv().is_err());
        assert!(!engine.is_paused());
    }

    #[tokio::test]
    async fn test_missing_album_aborts_start() {
        let album_id = AlbumId::new();
        let track = Track::new(album_id, 1, "Intro");
        let track_id = track.id;

        let mut catalog = MockCatalog::new();
        catalog
            .expect_get_track()
            .returning(move |_| Ok(Some(track.clone())));
        catalog.expect_get_album().returning(|_| Ok(None));

        let (mut engine, events) = engine_with(catalog);
        let mut stream = events.subscribe();

        let err = engine.start_track(Some(track_id)).await.unwrap_err();
        assert!(matches!(err, PlaybackError::AlbumNotFound(id) if id == album_id));

        let mut saw_error = false;
        while let Ok(event) = stream.try_recv() {
            if let CoreEvent::Player(PlayerEvent::Error { track_id: id, .. }) = event {
                assert_eq!(id, Some(track_id));
                saw_error = true;
            }
        }
        assert!(saw_error);
        assert!(engine.playing_track().is_none());
        assert!(!engine.has_session());
    }

    #[tokio::test]
    async fn test_catalog_failure_is_reported_as_transient_when_network() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_get_track()
            .returning(|_| Err(BridgeError::Network("timeout".into())));

        let (mut engine, _events) = engine_with(catalog);

        let err = engine.start_track(Some(TrackId::new())).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Catalog(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_volume_bounds() {
        let (mut engine, events) = engine_with(MockCatalog::new());
        let mut stream = events.subscribe();

        assert!(matches!(
            engine.set_volume(1.2).await,
            Err(PlaybackError::InvalidVolume(_))
        ));
        assert_eq!(engine.volume(), 1.0);

        engine.set_volume_percent(250.0).await.unwrap();
        assert_eq!(engine.volume_percent(), 100);

        engine.set_volume_percent(35.0).await.unwrap();
        assert_eq!(engine.volume_percent(), 35);

        engine.set_muted(true).await.unwrap();
        assert!(engine.is_muted());

        let changes: Vec<_> = std::iter::from_fn(|| stream.try_recv().ok()).collect();
        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes.last(),
            Some(&CoreEvent::Player(PlayerEvent::VolumeChanged {
                volume_percent: 35,
                muted: true
            }))
        );
    }

    #[tokio::test]
    async fn test_network_loss_is_reported_once() {
        let (mut engine, events) = engine_with(MockCatalog::new());
        let mut stream = events.subscribe();

        for _ in 0..3 {
            engine
                .handle_signal(EngineSignal::Network(NetworkStatus::Disconnected))
                .await
                .unwrap();
        }
        assert!(engine.is_network_lost());

        engine
            .handle_signal(EngineSignal::Network(NetworkStatus::Connected))
            .await
            .unwrap();

        // Recovery is lazy: the flag stays until a stream is rebuilt.
        assert!(engine.is_network_lost());
        assert_eq!(
            stream.try_recv().unwrap(),
            CoreEvent::Network(NetworkEvent::Lost)
        );
        assert_eq!(
            stream.try_recv().unwrap(),
            CoreEvent::Network(NetworkEvent::Restored)
        );
        assert!(stream.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stale_end_of_stream_is_ignored() {
        let (mut engine, events) = engine_with(MockCatalog::new());
        let mut stream = events.subscribe();

        engine
            .handle_signal(EngineSignal::EndOfStream { generation: 7 })
            .await
            .unwrap();

        assert!(stream.try_recv().is_err());
    }
}
