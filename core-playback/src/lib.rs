//! # Playback Session Engine
//!
//! Drives a single audio output from a track queue while keeping a remote
//! "now playing" session informed.
//!
//! ## Overview
//!
//! This crate handles:
//! - Queue management with a selection pointer (`queue`)
//! - The player state machine and album context loading (`engine`)
//! - Best-effort remote session reporting (`session`)
//! - Binding streams to the injected audio output (`transport`)
//! - Lazy recovery after network loss: the stream is rebuilt at the last
//!   known position on the next resume
//! - A single-task executor serializing commands, end-of-stream signals,
//!   network changes and position ticks (`service`)
//!
//! Collaborators (catalog, session server, audio output, network monitor)
//! are injected as `bridge_traits` trait objects. Notifications are published
//! on the `core_runtime` event bus.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_playback::{PlayerConfig, PlayerDependencies, PlayerService};
//! use core_runtime::events::EventBus;
//!
//! let deps = PlayerDependencies { catalog, session_client, audio_output };
//! let player = PlayerService::spawn(deps, EventBus::default(), PlayerConfig::default(), None)?;
//!
//! player.start_track(Some(track_id)).await?;
//! player.pause_track().await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod queue;
pub mod service;
pub mod session;
pub mod state;
mod transport;

pub use config::PlayerConfig;
pub use engine::{EngineSignal, PlayerDependencies, PlayerEngine};
pub use error::{PlaybackError, Result};
pub use queue::PlaybackQueue;
pub use service::{PlayerHandle, PlayerService};
pub use session::{PlaybackSession, SessionOperation, SessionReporter};
pub use state::{LoadPhase, PlayerState, TrackState, TransportState};
