//! # Host Bridge Traits
//!
//! Collaborator contracts the playback engine consumes but does not implement.
//!
//! ## Overview
//!
//! The engine is wired entirely through these traits. A host application
//! supplies concrete implementations (an HTTP client for the media server, an
//! audio backend, an OS connectivity watcher) and injects them through
//! `core_runtime::config::CoreConfig`.
//!
//! ## Traits
//!
//! ### Media server
//! - [`CatalogClient`](catalog::CatalogClient) - Album, track and artwork lookups
//! - [`RemoteSessionClient`](session::RemoteSessionClient) - "Now playing" session
//!   reporting and stream URL resolution
//!
//! ### Audio
//! - [`AudioOutput`](audio::AudioOutput) - Opens a URL-backed stream on the output device
//! - [`AudioSink`](audio::AudioSink) - Transport control for one opened stream
//! - [`EndOfStream`](audio::EndOfStream) - Natural completion notification
//!
//! ### Platform Integration
//! - [`NetworkMonitor`](network::NetworkMonitor) - Connectivity detection and change stream
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! Required collaborators are validated when the configuration is built, so a
//! missing capability surfaces as `CapabilityMissing` at startup instead of a
//! failure on the first play command.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map transport failures to `BridgeError::Network` so the engine can
//! tell them apart from logical failures such as `NotFound`.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`; the engine calls them from its
//! executor task and from the session reporting task.

pub mod audio;
pub mod catalog;
pub mod error;
pub mod logging;
pub mod network;
pub mod session;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio::{AudioOutput, AudioSink, EndOfStream, StreamRequest};
pub use catalog::CatalogClient;
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use network::{NetworkChangeStream, NetworkInfo, NetworkMonitor, NetworkStatus, NetworkType};
pub use session::{RemoteSessionClient, SessionToken};
