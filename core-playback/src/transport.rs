//! # Audio Transport
//!
//! Wraps the sink bound to the audible track together with its end-of-stream
//! watcher.
//!
//! Every bound stream carries a generation number. The watcher tags its
//! completion signal with that number so the engine can ignore signals from a
//! stream that has since been replaced.

use std::time::Duration;

use bridge_traits::{AudioOutput, AudioSink, StreamRequest};
use core_library::{Track, TrackId};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::engine::EngineSignal;
use crate::error::{PlaybackError, Result};

pub(crate) struct ActiveStream {
    track: Track,
    sink: Box<dyn AudioSink>,
    generation: u64,
    watcher: CancellationToken,
}

impl ActiveStream {
    /// Open a sink for `track` without starting it.
    pub(crate) async fn open(
        output: &dyn AudioOutput,
        track: Track,
        request: StreamRequest,
        generation: u64,
    ) -> Result<Self> {
        let sink = output
            .open(request)
            .await
            .map_err(PlaybackError::AudioDevice)?;

        Ok(Self {
            track,
            sink,
            generation,
            watcher: CancellationToken::new(),
        })
    }

    pub(crate) fn track(&self) -> &Track {
        &self.track
    }

    pub(crate) fn track_id(&self) -> TrackId {
        self.track.id
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Spawn the end-of-stream watcher. Natural completion is reported as
    /// [`EngineSignal::EndOfStream`]; release cancels the watcher.
    pub(crate) fn watch_end_of_stream(&self, signals: mpsc::UnboundedSender<EngineSignal>) {
        let mut end = self.sink.end_of_stream();
        let cancelled = self.watcher.clone();
        let generation = self.generation;
        let track_id = self.track.id;

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                reached = end.wait() => {
                    if reached {
                        debug!(%track_id, generation, "End of stream reached");
                        signals.send(EngineSignal::EndOfStream { generation }).ok();
                    }
                }
            }
        });
    }

    pub(crate) async fn play(&self) -> Result<()> {
        self.sink.play().await.map_err(PlaybackError::AudioDevice)
    }

    pub(crate) async fn pause(&self) -> Result<()> {
        self.sink.pause().await.map_err(PlaybackError::AudioDevice)
    }

    pub(crate) async fn seek(&self, position: Duration) -> Result<()> {
        self.sink
            .seek(position)
            .await
            .map_err(PlaybackError::AudioDevice)
    }

    pub(crate) async fn set_volume(&self, volume: f32) -> Result<()> {
        self.sink
            .set_volume(volume)
            .await
            .map_err(PlaybackError::AudioDevice)
    }

    /// Current position, or `None` when the sink cannot tell.
    pub(crate) async fn position(&self) -> Option<Duration> {
        match self.sink.position().await {
            Ok(position) => Some(position),
            Err(err) => {
                debug!(track_id = %self.track.id, error = %err, "Sink position unavailable");
                None
            }
        }
    }

    /// Unsubscribe from end-of-stream, then stop and drop the sink.
    pub(crate) async fn release(self) {
        self.watcher.cancel();
        if let Err(err) = self.sink.stop().await {
            warn!(track_id = %self.track.id, error = %err, "Failed to stop audio sink");
        }
    }
}

impl std::fmt::Debug for ActiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveStream")
            .field("track_id", &self.track.id)
            .field("generation", &self.generation)
            .finish()
    }
}
