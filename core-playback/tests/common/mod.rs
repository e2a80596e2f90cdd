//! Recording fakes for the playback collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{
    AudioOutput, AudioSink, CatalogClient, EndOfStream, RemoteSessionClient, SessionToken,
    StreamRequest,
};
use bytes::Bytes;
use core_library::{Album, AlbumId, Track, TrackId};
use core_playback::{EngineSignal, PlayerConfig, PlayerDependencies, PlayerEngine, PlayerState};
use core_runtime::events::{CoreEvent, EventBus, PlayerEvent, Receiver};
use tokio::sync::{mpsc, watch};

// ============================================================================
// Fixtures
// ============================================================================

pub fn album_with_tracks(count: u32) -> (Album, Vec<Track>) {
    let album = Album::new("Low Roar", "Once in a Long, Long While")
        .with_year(2017)
        .with_artwork(true);
    let tracks = (1..=count)
        .map(|n| {
            album
                .track(n, format!("Song {n}"))
                .with_runtime(Duration::from_secs(180 + u64::from(n)))
        })
        .collect();
    (album, tracks)
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Default)]
pub struct FakeCatalog {
    albums: Mutex<HashMap<AlbumId, (Album, Vec<Track>)>>,
    artwork: Mutex<HashMap<AlbumId, Bytes>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeCatalog {
    pub fn with_album(self, album: Album, tracks: Vec<Track>) -> Self {
        self.albums.lock().unwrap().insert(album.id, (album, tracks));
        self
    }

    pub fn with_artwork(self, album_id: AlbumId, artwork: &'static [u8]) -> Self {
        self.artwork
            .lock()
            .unwrap()
            .insert(album_id, Bytes::from_static(artwork));
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn get_album(&self, album_id: AlbumId) -> Result<Option<Album>> {
        self.record("get_album");
        Ok(self
            .albums
            .lock()
            .unwrap()
            .get(&album_id)
            .map(|(album, _)| album.clone()))
    }

    async fn get_tracks(&self, album_id: AlbumId) -> Result<Vec<Track>> {
        self.record("get_tracks");
        Ok(self
            .albums
            .lock()
            .unwrap()
            .get(&album_id)
            .map(|(_, tracks)| tracks.clone())
            .unwrap_or_default())
    }

    async fn get_track(&self, track_id: TrackId) -> Result<Option<Track>> {
        self.record("get_track");
        Ok(self
            .albums
            .lock()
            .unwrap()
            .values()
            .flat_map(|(_, tracks)| tracks.iter())
            .find(|track| track.id == track_id)
            .cloned())
    }

    async fn get_primary_art(&self, album_id: AlbumId) -> Result<Option<Bytes>> {
        self.record("get_primary_art");
        Ok(self.artwork.lock().unwrap().get(&album_id).cloned())
    }
}

// ============================================================================
// Remote session
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCall {
    Start(TrackId),
    Resume(TrackId, Option<Duration>),
    Pause(TrackId, Option<Duration>),
    Seek(TrackId, Option<Duration>),
    Stop(TrackId),
    Resolve {
        token: Option<String>,
        track_id: TrackId,
        position: Option<Duration>,
    },
}

#[derive(Default)]
pub struct RecordingSession {
    calls: Mutex<Vec<SessionCall>>,
    started: AtomicUsize,
    pub fail_start: AtomicBool,
    pub fail_resolve: AtomicBool,
}

impl RecordingSession {
    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Every call except URL resolution.
    pub fn notifications(&self) -> Vec<SessionCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, SessionCall::Resolve { .. }))
            .collect()
    }

    pub fn resolves(&self) -> Vec<SessionCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, SessionCall::Resolve { .. }))
            .collect()
    }

    pub fn sessions_started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    fn record(&self, call: SessionCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteSessionClient for RecordingSession {
    async fn start_session(&self, track_id: TrackId) -> Result<SessionToken> {
        self.record(SessionCall::Start(track_id));
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BridgeError::Network("connection refused".into()));
        }
        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SessionToken::new(format!("session-{n}")))
    }

    async fn resume_session(
        &self,
        _token: &SessionToken,
        track_id: TrackId,
        position: Option<Duration>,
    ) -> Result<()> {
        self.record(SessionCall::Resume(track_id, position));
        Ok(())
    }

    async fn pause_session(
        &self,
        _token: &SessionToken,
        track_id: TrackId,
        position: Option<Duration>,
    ) -> Result<()> {
        self.record(SessionCall::Pause(track_id, position));
        Ok(())
    }

    async fn stop_session(&self, _token: &SessionToken, track_id: TrackId) -> Result<()> {
        self.record(SessionCall::Stop(track_id));
        Ok(())
    }

    async fn seek_session(
        &self,
        _token: &SessionToken,
        track_id: TrackId,
        position: Option<Duration>,
    ) -> Result<()> {
        self.record(SessionCall::Seek(track_id, position));
        Ok(())
    }

    async fn resolve_stream_url(
        &self,
        token: Option<&SessionToken>,
        track_id: TrackId,
        position: Option<Duration>,
    ) -> Result<String> {
        self.record(SessionCall::Resolve {
            token: token.map(|token| token.as_str().to_string()),
            track_id,
            position,
        });
        if self.fail_resolve.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("503 Service Unavailable".into()));
        }
        Ok(format!("http://media.local/audio/{track_id}/stream"))
    }
}

// ============================================================================
// Audio output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkPhase {
    Idle,
    Playing,
    Paused,
    Ended,
    Released,
}

pub struct FakeSink {
    pub request: StreamRequest,
    phase: watch::Sender<SinkPhase>,
    position: Mutex<Duration>,
    volume: Mutex<f32>,
}

impl FakeSink {
    fn new(request: StreamRequest) -> Self {
        let (phase, _) = watch::channel(SinkPhase::Idle);
        let volume = request.volume;
        let position = request.start_position.unwrap_or_default();
        Self {
            request,
            phase,
            position: Mutex::new(position),
            volume: Mutex::new(volume),
        }
    }

    pub fn phase(&self) -> SinkPhase {
        *self.phase.borrow()
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock().unwrap()
    }

    pub fn set_position(&self, position: Duration) {
        *self.position.lock().unwrap() = position;
    }

    /// Simulate the stream playing through to its end.
    pub fn finish(&self) {
        self.phase.send_replace(SinkPhase::Ended);
    }
}

struct SinkHandle(Arc<FakeSink>);

#[async_trait]
impl AudioSink for SinkHandle {
    async fn play(&self) -> Result<()> {
        self.0.phase.send_replace(SinkPhase::Playing);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.0.phase.send_replace(SinkPhase::Paused);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.0.phase.send_replace(SinkPhase::Released);
        Ok(())
    }

    async fn seek(&self, position: Duration) -> Result<()> {
        self.0.set_position(position);
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        *self.0.volume.lock().unwrap() = volume;
        Ok(())
    }

    async fn position(&self) -> Result<Duration> {
        Ok(*self.0.position.lock().unwrap())
    }

    fn end_of_stream(&self) -> Box<dyn EndOfStream> {
        Box::new(EndWatch(self.0.phase.subscribe()))
    }
}

struct EndWatch(watch::Receiver<SinkPhase>);

#[async_trait]
impl EndOfStream for EndWatch {
    async fn wait(&mut self) -> bool {
        loop {
            let phase = *self.0.borrow_and_update();
            match phase {
                SinkPhase::Ended => return true,
                SinkPhase::Released => return false,
                _ => {}
            }
            if self.0.changed().await.is_err() {
                return false;
            }
        }
    }
}

#[derive(Default)]
pub struct FakeOutput {
    sinks: Mutex<Vec<Arc<FakeSink>>>,
    pub fail_open: AtomicBool,
}

impl FakeOutput {
    pub fn sinks(&self) -> Vec<Arc<FakeSink>> {
        self.sinks.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.sinks.lock().unwrap().len()
    }

    pub fn last_sink(&self) -> Arc<FakeSink> {
        self.sinks
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no sink opened")
    }
}

#[async_trait]
impl AudioOutput for FakeOutput {
    async fn open(&self, request: StreamRequest) -> Result<Box<dyn AudioSink>> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(BridgeError::NotAvailable("no output device".into()));
        }
        let sink = Arc::new(FakeSink::new(request));
        self.sinks.lock().unwrap().push(sink.clone());
        Ok(Box::new(SinkHandle(sink)))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub catalog: Arc<FakeCatalog>,
    pub session: Arc<RecordingSession>,
    pub output: Arc<FakeOutput>,
    pub events: EventBus,
    pub engine: PlayerEngine,
    pub signals: mpsc::UnboundedReceiver<EngineSignal>,
}

impl Harness {
    pub fn new(catalog: FakeCatalog) -> Self {
        Self::with_config(catalog, PlayerConfig::default())
    }

    pub fn with_config(catalog: FakeCatalog, config: PlayerConfig) -> Self {
        let catalog = Arc::new(catalog);
        let session = Arc::new(RecordingSession::default());
        let output = Arc::new(FakeOutput::default());
        let events = EventBus::new(256);
        let (signal_tx, signals) = mpsc::unbounded_channel();

        let engine = PlayerEngine::new(
            dependencies(&catalog, &session, &output),
            events.clone(),
            &config,
            signal_tx,
        );

        Self {
            catalog,
            session,
            output,
            events,
            engine,
            signals,
        }
    }

    /// Wait for the next end-of-stream or network signal from the watchers.
    pub async fn next_signal(&mut self) -> EngineSignal {
        tokio::time::timeout(Duration::from_secs(2), self.signals.recv())
            .await
            .expect("timed out waiting for engine signal")
            .expect("signal channel closed")
    }
}

pub fn dependencies(
    catalog: &Arc<FakeCatalog>,
    session: &Arc<RecordingSession>,
    output: &Arc<FakeOutput>,
) -> PlayerDependencies {
    PlayerDependencies {
        catalog: catalog.clone(),
        session_client: session.clone(),
        audio_output: output.clone(),
    }
}

// ============================================================================
// Event helpers
// ============================================================================

/// State reported by every buffered state-change notification.
pub fn drain_states(rx: &mut Receiver<CoreEvent>) -> Vec<PlayerState> {
    drain(rx)
        .into_iter()
        .filter_map(|event| match event {
            CoreEvent::Player(event) => event.state(),
            _ => None,
        })
        .collect()
}

pub fn drain(rx: &mut Receiver<CoreEvent>) -> Vec<CoreEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

/// Wait for the first event matching `predicate`.
pub async fn wait_for<F>(rx: &mut Receiver<CoreEvent>, predicate: F) -> CoreEvent
where
    F: Fn(&CoreEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(err) => panic!("event bus error: {err}"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

pub fn is_player_error(event: &CoreEvent) -> bool {
    matches!(event, CoreEvent::Player(PlayerEvent::Error { .. }))
}
