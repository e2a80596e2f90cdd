//! # Player Service
//!
//! Runs a [`PlayerEngine`] on its own tokio task and exposes it through a
//! cloneable [`PlayerHandle`].
//!
//! ## Architecture
//!
//! ```text
//! PlayerHandle ──PlayerCommand──┐
//!                               ▼
//! end-of-stream watchers ──► select! loop ──► PlayerEngine ──► EventBus
//!                               ▲
//! NetworkMonitor ──────status───┤
//! position interval ────tick────┘
//! ```
//!
//! The loop is the single serialization point: commands, end-of-stream
//! signals, network changes and position ticks are handled one at a time, in
//! arrival order.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::NetworkMonitor;
use bytes::Bytes;
use core_library::{Album, AlbumId, Track, TrackId};
use core_runtime::events::{CoreEvent, EventBus, EventStream, Receiver};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::PlayerConfig;
use crate::engine::{EngineSignal, PlayerDependencies, PlayerEngine};
use crate::error::{PlaybackError, Result};
use crate::state::{TrackState, TransportState};

type Reply = oneshot::Sender<Result<()>>;
type QueryFn = Box<dyn FnOnce(&PlayerEngine) + Send>;

enum PlayerCommand {
    Select(TrackId, Reply),
    Start(Option<TrackId>, Reply),
    Play(Track, Reply),
    Pause(Reply),
    Stop(Reply),
    StartOrPause(Reply),
    Next(Reply),
    Previous(Reply),
    Seek(Duration, Reply),
    AddTrack(Track, Reply),
    AddTracks(Vec<Track>, Reply),
    Clear(Reply),
    Shuffle(Reply),
    SetVolume(f32, Reply),
    SetVolumePercent(f64, Reply),
    SetMuted(bool, Reply),
    FlushReports(Reply),
    Query(QueryFn),
    Shutdown(Reply),
}

/// Spawns the executor task.
pub struct PlayerService;

impl PlayerService {
    /// Start the executor. Must be called inside a tokio runtime.
    ///
    /// When `network` is given, its change stream is forwarded to the engine.
    pub fn spawn(
        deps: PlayerDependencies,
        events: EventBus,
        config: PlayerConfig,
        network: Option<Arc<dyn NetworkMonitor>>,
    ) -> Result<PlayerHandle> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);

        if let Some(monitor) = network {
            tokio::spawn(forward_network_changes(monitor, signal_tx.clone()));
        }

        let engine = PlayerEngine::new(deps, events.clone(), &config, signal_tx);
        let task = tokio::spawn(run(engine, config, command_rx, signal_rx));

        info!("Player service started");
        Ok(PlayerHandle {
            commands: command_tx,
            events,
            task: Arc::new(std::sync::Mutex::new(Some(task))),
        })
    }
}

async fn run(
    mut engine: PlayerEngine,
    config: PlayerConfig,
    mut commands: mpsc::Receiver<PlayerCommand>,
    mut signals: mpsc::UnboundedReceiver<EngineSignal>,
) {
    let mut ticker = tokio::time::interval(config.position_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("All player handles dropped");
                    engine.shutdown().await;
                    break;
                };
                if dispatch(&mut engine, command).await {
                    break;
                }
            }
            Some(signal) = signals.recv() => {
                if let Err(err) = engine.handle_signal(signal).await {
                    warn!(?signal, error = %err, "Failed to handle engine signal");
                }
            }
            _ = ticker.tick(), if config.position_updates => {
                engine.publish_position().await;
            }
        }
    }

    info!("Player service stopped");
}

/// Execute one command. Returns `true` when the loop should exit.
async fn dispatch(engine: &mut PlayerEngine, command: PlayerCommand) -> bool {
    let (result, reply) = match command {
        PlayerCommand::Select(track_id, reply) => {
            engine.select_track(track_id);
            (Ok(()), reply)
        }
        PlayerCommand::Start(track_id, reply) => (engine.start_track(track_id).await, reply),
        PlayerCommand::Play(track, reply) => (engine.play_track(track).await, reply),
        PlayerCommand::Pause(reply) => (engine.pause_track().await, reply),
        PlayerCommand::Stop(reply) => (engine.stop_track().await, reply),
        PlayerCommand::StartOrPause(reply) => (engine.start_or_pause_track().await, reply),
        PlayerCommand::Next(reply) => (engine.next_track().await, reply),
        PlayerCommand::Previous(reply) => (engine.previous_track().await, reply),
        PlayerCommand::Seek(position, reply) => (engine.seek_track(position).await, reply),
        PlayerCommand::AddTrack(track, reply) => (engine.add_track(track).await, reply),
        PlayerCommand::AddTracks(tracks, reply) => {
            engine.add_tracks(tracks);
            (Ok(()), reply)
        }
        PlayerCommand::Clear(reply) => {
            engine.clear_tracks();
            (Ok(()), reply)
        }
        PlayerCommand::Shuffle(reply) => {
            engine.shuffle_tracks();
            (Ok(()), reply)
        }
        PlayerCommand::SetVolume(volume, reply) => (engine.set_volume(volume).await, reply),
        PlayerCommand::SetVolumePercent(percent, reply) => {
            (engine.set_volume_percent(percent).await, reply)
        }
        PlayerCommand::SetMuted(muted, reply) => (engine.set_muted(muted).await, reply),
        PlayerCommand::FlushReports(reply) => {
            engine.flush_session_reports().await;
            (Ok(()), reply)
        }
        PlayerCommand::Query(query) => {
            query(engine);
            return false;
        }
        PlayerCommand::Shutdown(reply) => {
            engine.shutdown().await;
            reply.send(Ok(())).ok();
            return true;
        }
    };

    // The caller may have stopped waiting.
    reply.send(result).ok();
    false
}

async fn forward_network_changes(
    monitor: Arc<dyn NetworkMonitor>,
    signals: mpsc::UnboundedSender<EngineSignal>,
) {
    let mut changes = match monitor.subscribe_changes().await {
        Ok(changes) => changes,
        Err(err) => {
            warn!(error = %err, "Network monitoring unavailable");
            return;
        }
    };

    while let Some(info) = changes.next().await {
        debug!(status = ?info.status, "Network status changed");
        if signals.send(EngineSignal::Network(info.status)).is_err() {
            break;
        }
    }
}

/// Cloneable handle to a running player.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    events: EventBus,
    task: Arc<std::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl PlayerHandle {
    /// Subscribe to every notification the player publishes.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Subscribe to player notifications only.
    pub fn player_events(&self) -> EventStream {
        self.events.player_events()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    pub async fn select_track(&self, track_id: TrackId) -> Result<()> {
        self.execute(|reply| PlayerCommand::Select(track_id, reply)).await
    }

    pub async fn start_track(&self, track_id: Option<TrackId>) -> Result<()> {
        self.execute(|reply| PlayerCommand::Start(track_id, reply)).await
    }

    pub async fn play_track(&self, track: Track) -> Result<()> {
        self.execute(|reply| PlayerCommand::Play(track, reply)).await
    }

    pub async fn pause_track(&self) -> Result<()> {
        self.execute(PlayerCommand::Pause).await
    }

    pub async fn stop_track(&self) -> Result<()> {
        self.execute(PlayerCommand::Stop).await
    }

    pub async fn start_or_pause_track(&self) -> Result<()> {
        self.execute(PlayerCommand::StartOrPause).await
    }

    pub async fn next_track(&self) -> Result<()> {
        self.execute(PlayerCommand::Next).await
    }

    pub async fn previous_track(&self) -> Result<()> {
        self.execute(PlayerCommand::Previous).await
    }

    pub async fn seek_track(&self, position: Duration) -> Result<()> {
        self.execute(|reply| PlayerCommand::Seek(position, reply)).await
    }

    pub async fn add_track(&self, track: Track) -> Result<()> {
        self.execute(|reply| PlayerCommand::AddTrack(track, reply)).await
    }

    pub async fn add_tracks(&self, tracks: Vec<Track>) -> Result<()> {
        self.execute(|reply| PlayerCommand::AddTracks(tracks, reply)).await
    }

    pub async fn clear_tracks(&self) -> Result<()> {
        self.execute(PlayerCommand::Clear).await
    }

    pub async fn shuffle_tracks(&self) -> Result<()> {
        self.execute(PlayerCommand::Shuffle).await
    }

    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        self.execute(|reply| PlayerCommand::SetVolume(volume, reply)).await
    }

    pub async fn set_volume_percent(&self, percent: f64) -> Result<()> {
        self.execute(|reply| PlayerCommand::SetVolumePercent(percent, reply))
            .await
    }

    pub async fn set_muted(&self, muted: bool) -> Result<()> {
        self.execute(|reply| PlayerCommand::SetMuted(muted, reply)).await
    }

    /// Wait until queued session notifications have been sent.
    pub async fn flush_session_reports(&self) -> Result<()> {
        self.execute(PlayerCommand::FlushReports).await
    }

    /// Stop playback, close the session and end the executor task.
    pub async fn shutdown(&self) -> Result<()> {
        let result = self.execute(PlayerCommand::Shutdown).await;
        let task = self.task.lock().ok().and_then(|mut task| task.take());
        if let Some(task) = task {
            task.await
                .map_err(|err| PlaybackError::Internal(err.to_string()))?;
        }
        match result {
            Err(PlaybackError::ServiceClosed) => Ok(()),
            other => other,
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Run `f` against the engine between two commands.
    pub async fn query<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&PlayerEngine) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let query: QueryFn = Box::new(move |engine: &PlayerEngine| {
            tx.send(f(engine)).ok();
        });
        self.commands
            .send(PlayerCommand::Query(query))
            .await
            .map_err(|_| PlaybackError::ServiceClosed)?;
        rx.await.map_err(|_| PlaybackError::ServiceClosed)
    }

    pub async fn tracks(&self) -> Result<Vec<Track>> {
        self.query(|engine| engine.tracks().to_vec()).await
    }

    pub async fn selected_track(&self) -> Result<Option<Track>> {
        self.query(|engine| engine.selected_track().cloned()).await
    }

    pub async fn selected_track_id(&self) -> Result<Option<TrackId>> {
        self.query(|engine| engine.selected_track_id()).await
    }

    pub async fn is_selected_track(&self, track_id: Option<TrackId>) -> Result<bool> {
        self.query(move |engine| engine.is_selected_track(track_id))
            .await
    }

    pub async fn selected_album(&self) -> Result<Option<Album>> {
        self.query(|engine| engine.selected_album().cloned()).await
    }

    pub async fn artwork(&self) -> Result<Option<Bytes>> {
        self.query(|engine| engine.artwork().cloned()).await
    }

    pub async fn track_state(&self, track_id: TrackId) -> Result<TrackState> {
        self.query(move |engine| engine.track_state(track_id)).await
    }

    pub async fn is_playing_track(
        &self,
        track_id: TrackId,
        album_id: Option<AlbumId>,
    ) -> Result<bool> {
        self.query(move |engine| engine.is_playing_track(track_id, album_id))
            .await
    }

    pub async fn has_next_track(&self) -> Result<bool> {
        self.query(|engine| engine.has_next_track()).await
    }

    pub async fn has_previous_track(&self) -> Result<bool> {
        self.query(|engine| engine.has_previous_track()).await
    }

    pub async fn has_tracks(&self, count_selected: bool) -> Result<bool> {
        self.query(move |engine| engine.has_tracks(count_selected))
            .await
    }

    pub async fn queue_position(&self, track_id: TrackId) -> Result<Option<usize>> {
        self.query(move |engine| engine.queue_position(track_id))
            .await
    }

    pub async fn is_playing(&self) -> Result<bool> {
        self.query(|engine| engine.is_playing()).await
    }

    pub async fn is_paused(&self) -> Result<bool> {
        self.query(|engine| engine.is_paused()).await
    }

    pub async fn playback_state(&self) -> Result<TransportState> {
        self.query(|engine| engine.playback_state()).await
    }

    pub async fn volume(&self) -> Result<f32> {
        self.query(|engine| engine.volume()).await
    }

    pub async fn volume_percent(&self) -> Result<u8> {
        self.query(|engine| engine.volume_percent()).await
    }

    pub async fn is_muted(&self) -> Result<bool> {
        self.query(|engine| engine.is_muted()).await
    }

    async fn execute<F>(&self, command: F) -> Result<()>
    where
        F: FnOnce(Reply) -> PlayerCommand,
    {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| PlaybackError::ServiceClosed)?;
        rx.await.map_err(|_| PlaybackError::ServiceClosed)?
    }
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("closed", &self.commands.is_closed())
            .finish()
    }
}
