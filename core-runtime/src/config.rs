//! # Core Configuration Module
//!
//! Provides configuration management for the playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds every collaborator the engine consumes. It enforces
//! fail-fast validation so that a missing collaborator is reported at startup
//! with an actionable message.
//!
//! ## Required Dependencies
//!
//! - `CatalogClient` - Album/track/artwork lookups
//! - `RemoteSessionClient` - Server session reporting and stream URL resolution
//! - `AudioOutput` - Output device and network stream provider
//!
//! ## Optional Dependencies
//!
//! - `NetworkMonitor` - Connectivity signal for lazy stream recovery. Required
//!   when network awareness is enabled. With the `desktop-shims` feature a
//!   `DesktopNetworkMonitor` is injected if none is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .catalog(Arc::new(MyCatalog::new()))
//!     .session_client(Arc::new(MySessionClient::new()))
//!     .audio_output(Arc::new(MyAudioOutput::new()))
//!     .enable_network_awareness(true)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{AudioOutput, CatalogClient, NetworkMonitor, RemoteSessionClient};
use std::sync::Arc;

/// Upper bound for the event buffer; larger values only hide slow subscribers.
const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// Core configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Catalog lookups (required)
    pub catalog: Arc<dyn CatalogClient>,

    /// Remote "now playing" session client (required)
    pub session_client: Arc<dyn RemoteSessionClient>,

    /// Audio output device and stream provider (required)
    pub audio_output: Arc<dyn AudioOutput>,

    /// Network connectivity monitor (optional)
    pub network_monitor: Option<Arc<dyn NetworkMonitor>>,

    /// Per-subscriber event buffer
    pub event_buffer_size: usize,

    /// Feature flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("catalog", &"CatalogClient { ... }")
            .field("session_client", &"RemoteSessionClient { ... }")
            .field("audio_output", &"AudioOutput { ... }")
            .field(
                "network_monitor",
                &self
                    .network_monitor
                    .as_ref()
                    .map(|_| "NetworkMonitor { ... }"),
            )
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Watch connectivity and rebuild streams after a drop (requires NetworkMonitor)
    pub enable_network_awareness: bool,

    /// Emit periodic position notifications while playing
    pub enable_position_updates: bool,

    /// Open and report a remote session. When disabled, stream URLs are
    /// resolved without a session token and no notifications are sent.
    pub enable_session_reporting: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_network_awareness: false,
            enable_position_updates: true,
            enable_session_reporting: true,
        }
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Event buffer size is within bounds
    /// - Feature flags are consistent with available collaborators
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        if self.features.enable_network_awareness && self.network_monitor.is_none() {
            return Err(Error::Config(
                "Network awareness enabled but no NetworkMonitor provided. \
                 Disable the feature or inject a NetworkMonitor implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_network_monitor() -> Option<Arc<dyn NetworkMonitor>> {
    use bridge_desktop::DesktopNetworkMonitor;

    let monitor: Arc<dyn NetworkMonitor> = Arc::new(DesktopNetworkMonitor::new());
    Some(monitor)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_network_monitor() -> Option<Arc<dyn NetworkMonitor>> {
    None
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    catalog: Option<Arc<dyn CatalogClient>>,
    session_client: Option<Arc<dyn RemoteSessionClient>>,
    audio_output: Option<Arc<dyn AudioOutput>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    event_buffer_size: Option<usize>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the catalog client (required).
    pub fn catalog(mut self, catalog: Arc<dyn CatalogClient>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sets the remote session client (required).
    pub fn session_client(mut self, client: Arc<dyn RemoteSessionClient>) -> Self {
        self.session_client = Some(client);
        self
    }

    /// Sets the audio output (required).
    pub fn audio_output(mut self, output: Arc<dyn AudioOutput>) -> Self {
        self.audio_output = Some(output);
        self
    }

    /// Sets the network monitor implementation (optional).
    ///
    /// The monitor's change stream feeds the engine's network-lost flag.
    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    /// Sets the per-subscriber event buffer size.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn enable_network_awareness(mut self, enabled: bool) -> Self {
        self.features.enable_network_awareness = enabled;
        self
    }

    pub fn enable_position_updates(mut self, enabled: bool) -> Self {
        self.features.enable_position_updates = enabled;
        self
    }

    pub fn enable_session_reporting(mut self, enabled: bool) -> Self {
        self.features.enable_session_reporting = enabled;
        self
    }

    /// Replaces all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] if a required collaborator is missing
    /// - [`Error::Config`] if values are out of range or feature flags are
    ///   inconsistent with the provided collaborators
    pub fn build(self) -> Result<CoreConfig> {
        let catalog = self.catalog.ok_or_else(|| {
            capability_missing(
                "CatalogClient",
                "A CatalogClient is required to open albums and fetch artwork. \
                 Inject the media server client with .catalog().",
            )
        })?;

        let session_client = self.session_client.ok_or_else(|| {
            capability_missing(
                "RemoteSessionClient",
                "A RemoteSessionClient is required to resolve stream URLs. \
                 Inject it with .session_client().",
            )
        })?;

        let audio_output = self.audio_output.ok_or_else(|| {
            capability_missing(
                "AudioOutput",
                "An AudioOutput is required to play streams. \
                 Inject the host audio backend with .audio_output().",
            )
        })?;

        let network_monitor = match self.network_monitor {
            Some(monitor) => Some(monitor),
            None if self.features.enable_network_awareness => provide_default_network_monitor(),
            None => None,
        };

        let config = CoreConfig {
            catalog,
            session_client,
            audio_output,
            network_monitor,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
