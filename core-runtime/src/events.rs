//! # Event Bus System
//!
//! Provides the notification fan-out for the playback core using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for player, session and network events
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ PlayerEngine ├──────────────>│           │     subscribe    ┌────────────┐
//! └──────────────┘               │ EventBus  ├─────────────────>│ UI layer   │
//!                                │ (broadcast│                  └────────────┘
//! ┌──────────────┐     emit      │  channel) │     subscribe    ┌────────────┐
//! │SessionReport ├──────────────>│           ├─────────────────>│ Desktop    │
//! └──────────────┘               └───────────┘                  │ integration│
//!                                                               └────────────┘
//! ```
//!
//! Events are published after a state mutation has completed, never from
//! inside one, and subscribers receive them in emission order.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, NetworkEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus.emit(CoreEvent::Network(NetworkEvent::Lost)).ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Network(NetworkEvent::Lost)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   Non-fatal; a player UI should re-query the engine state and continue.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.

use core_library::{Album, Track, TrackId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Player state, position and volume events
    Player(PlayerEvent),
    /// Remote session reporting events
    Session(SessionEvent),
    /// Connectivity events observed by the player
    Network(NetworkEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Player(e) => e.description(),
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Network(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Player(PlayerEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Session(SessionEvent::NotificationFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Network(NetworkEvent::Lost) => EventSeverity::Warning,
            CoreEvent::Player(PlayerEvent::StateChanged { .. }) => EventSeverity::Info,
            CoreEvent::Session(SessionEvent::Started { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Player State
// ============================================================================

/// Audio transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportState {
    /// Nothing bound and nothing to report (initial state, end of queue).
    None,
    Stopped,
    Playing,
    Paused,
}

/// Album metadata fetch progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadPhase {
    Loading,
    LoadedInfo,
    LoadedArtwork,
}

/// What a state-change notification reports.
///
/// Transport changes and metadata load phases travel through the same
/// notification so observers see them in the order they happened. The
/// remaining variants are transient transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    Transport(TransportState),
    Load(LoadPhase),
    Selected,
    Starting,
    SkipNext,
    SkipPrevious,
}

impl From<TransportState> for PlayerState {
    fn from(state: TransportState) -> Self {
        PlayerState::Transport(state)
    }
}

impl From<LoadPhase> for PlayerState {
    fn from(phase: LoadPhase) -> Self {
        PlayerState::Load(phase)
    }
}

// ============================================================================
// Player Events
// ============================================================================

/// Events emitted by the playback engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlayerEvent {
    /// Composite state-change notification.
    StateChanged {
        /// What happened.
        state: PlayerState,
        /// Transport state at the time of emission.
        transport: TransportState,
        /// Open album context.
        album: Option<Album>,
        /// Full queue snapshot.
        tracks: Vec<Track>,
        /// Selected track.
        selected_track: Option<Track>,
    },
    /// Playback position update. Informational only.
    PositionChanged {
        /// The audible track.
        track_id: TrackId,
        /// Elapsed time (milliseconds).
        position_ms: u64,
        /// Track runtime (milliseconds), when known.
        duration_ms: Option<u64>,
    },
    /// Output volume or mute changed.
    VolumeChanged {
        /// Volume in percent, 0-100.
        volume_percent: u8,
        /// Whether output is muted.
        muted: bool,
    },
    /// Playback error occurred.
    Error {
        /// The track ID if available.
        track_id: Option<TrackId>,
        /// Human-readable error message.
        message: String,
        /// Whether playback can be retried.
        recoverable: bool,
    },
}

impl PlayerEvent {
    fn description(&self) -> &str {
        match self {
            PlayerEvent::StateChanged { .. } => "Player state changed",
            PlayerEvent::PositionChanged { .. } => "Playback position changed",
            PlayerEvent::VolumeChanged { .. } => "Volume changed",
            PlayerEvent::Error { .. } => "Playback error",
        }
    }

    /// The reported state, if this is a state-change notification.
    pub fn state(&self) -> Option<PlayerState> {
        match self {
            PlayerEvent::StateChanged { state, .. } => Some(*state),
            _ => None,
        }
    }
}

// ============================================================================
// Session Events
// ============================================================================

/// Events about the remote "now playing" session.
///
/// Session tokens are never carried in events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A new session was opened on the server.
    Started {
        /// Track the session was opened for.
        track_id: TrackId,
    },
    /// A best-effort notification to the server failed.
    NotificationFailed {
        /// Operation name (`pause`, `resume`, `stop`, `seek`, `start`).
        operation: String,
        /// The track the notification was about.
        track_id: TrackId,
        /// Error message.
        message: String,
    },
    /// The session was closed by a full stop.
    Closed {
        /// Last track of the session.
        track_id: TrackId,
    },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::Started { .. } => "Playback session started",
            SessionEvent::NotificationFailed { .. } => "Session notification failed",
            SessionEvent::Closed { .. } => "Playback session closed",
        }
    }
}

// ============================================================================
// Network Events
// ============================================================================

/// Connectivity changes as seen by the player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NetworkEvent {
    /// Connectivity dropped; the open stream will be rebuilt on next resume.
    Lost,
    /// Connectivity came back.
    Restored,
}

impl NetworkEvent {
    fn description(&self) -> &str {
        match self {
            NetworkEvent::Lost => "Network connection lost",
            NetworkEvent::Restored => "Network connection restored",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future events.
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Creates a filtered stream of player events only.
    pub fn player_events(&self) -> EventStream {
        EventStream::new(self.subscribe()).filter(|event| matches!(event, CoreEvent::Player(_)))
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering capabilities.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent, EventSeverity};
///
/// let event_bus = EventBus::new(100);
/// let warnings = EventStream::new(event_bus.subscribe())
///     .filter(|event| event.severity() >= EventSeverity::Warning);
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains every event currently buffered that passes the filter.
    ///
    /// Lagged gaps are skipped.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.try_recv() {
            if let Ok(event) = result {
                events.push(event);
            }
        }
        events
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state_changed(state: PlayerState) -> CoreEvent {
        let album = Album::new("Artist", "Album");
        let track = album.track(1, "Opening");
        CoreEvent::Player(PlayerEvent::StateChanged {
            state,
            transport: TransportState::Playing,
            album: Some(album),
            tracks: vec![track.clone()],
            selected_track: Some(track),
        })
    }

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(CoreEvent::Network(NetworkEvent::Lost)).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = state_changed(PlayerState::Starting);
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_events_arrive_in_emission_order() {
        let bus = EventBus::new(16);
        let mut stream = bus.player_events();

        let order = [
            PlayerState::Starting,
            PlayerState::Load(LoadPhase::Loading),
            PlayerState::Load(LoadPhase::LoadedInfo),
            PlayerState::Transport(TransportState::Playing),
        ];
        for state in order {
            bus.emit(state_changed(state)).ok();
        }

        let received: Vec<PlayerState> = stream
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                CoreEvent::Player(player) => player.state(),
                _ => None,
            })
            .collect();
        assert_eq!(received, order);
    }

    #[tokio::test]
    async fn test_filtered_stream_skips_other_categories() {
        let bus = EventBus::new(10);
        let mut stream = bus.player_events();

        bus.emit(CoreEvent::Network(NetworkEvent::Lost)).ok();
        bus.emit(CoreEvent::Player(PlayerEvent::VolumeChanged {
            volume_percent: 40,
            muted: false,
        }))
        .ok();

        let event = stream.recv().await.unwrap();
        assert!(matches!(
            event,
            CoreEvent::Player(PlayerEvent::VolumeChanged { volume_percent: 40, .. })
        ));
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_event_severity() {
        let error = CoreEvent::Player(PlayerEvent::Error {
            track_id: None,
            message: "stream unavailable".to_string(),
            recoverable: true,
        });
        assert_eq!(error.severity(), EventSeverity::Error);

        let failed = CoreEvent::Session(SessionEvent::NotificationFailed {
            operation: "pause".to_string(),
            track_id: TrackId::new(),
            message: "timeout".to_string(),
        });
        assert_eq!(failed.severity(), EventSeverity::Warning);

        let position = CoreEvent::Player(PlayerEvent::PositionChanged {
            track_id: TrackId::new(),
            position_ms: 1_000,
            duration_ms: None,
        });
        assert_eq!(position.severity(), EventSeverity::Debug);
        assert_eq!(
            state_changed(PlayerState::Selected).severity(),
            EventSeverity::Info
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = state_changed(PlayerState::Load(LoadPhase::LoadedArtwork));

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Player\""));
        assert!(json.contains("\"event\":\"StateChanged\""));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_player_state_conversions() {
        assert_eq!(
            PlayerState::from(TransportState::Paused),
            PlayerState::Transport(TransportState::Paused)
        );
        assert_eq!(
            PlayerState::from(LoadPhase::Loading),
            PlayerState::Load(LoadPhase::Loading)
        );
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());
    }
}
