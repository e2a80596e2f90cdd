//! Audio output bridge traits.
//!
//! The host owns the actual audio device and network stream provider. The
//! engine only asks it to open a URL-backed stream and then drives the
//! returned sink. Each sink wraps exactly one stream; switching tracks means
//! stopping the old sink and opening a new one.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Parameters for opening a network-backed stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    /// Fully resolved stream URL.
    pub url: String,
    /// Position to start from. `None` starts at the beginning.
    pub start_position: Option<Duration>,
    /// Initial gain (0.0 = silent, 1.0 = unity).
    pub volume: f32,
}

impl StreamRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            start_position: None,
            volume: 1.0,
        }
    }

    pub fn with_start_position(mut self, position: Option<Duration>) -> Self {
        self.start_position = position;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }
}

/// Audio output device plus stream provider.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Open a stream and bind it to the output device.
    ///
    /// The returned sink is idle; the engine calls [`AudioSink::play`] to start it.
    async fn open(&self, request: StreamRequest) -> Result<Box<dyn AudioSink>>;
}

/// Transport control for a single opened stream.
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Stop playback and release the stream and its device resources.
    ///
    /// The sink is not used again after this call.
    async fn stop(&self) -> Result<()>;

    async fn seek(&self, position: Duration) -> Result<()>;

    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Current playback position within the stream.
    async fn position(&self) -> Result<Duration>;

    /// Subscribe to the natural end of this stream.
    fn end_of_stream(&self) -> Box<dyn EndOfStream>;
}

/// Completion notification for one sink.
#[async_trait]
pub trait EndOfStream: Send {
    /// Wait for the stream to finish.
    ///
    /// Returns `true` when the stream played to its end and `false` when the
    /// sink was released first. Completes at most once.
    async fn wait(&mut self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_request_defaults_to_unity_gain_from_start() {
        let request = StreamRequest::new("http://server/audio/1");
        assert_eq!(request.start_position, None);
        assert_eq!(request.volume, 1.0);

        let request = request
            .with_start_position(Some(Duration::from_secs(42)))
            .with_volume(0.25);
        assert_eq!(request.start_position, Some(Duration::from_secs(42)));
        assert_eq!(request.volume, 0.25);
    }
}
