//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided collaborators (catalog client, remote
//! session client, audio output, optional network monitor) into the playback
//! engine and exposes the resulting player handle plus the event bus. Desktop
//! apps typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) to get a default network monitor.

pub mod error;

pub use error::{CoreError, Result};

pub use core_playback::{PlayerConfig, PlayerHandle};
pub use core_runtime::config::{CoreConfig, FeatureFlags};
pub use core_runtime::events::{CoreEvent, EventBus};

use core_playback::{PlayerDependencies, PlayerService};
use core_runtime::events::{EventStream, Receiver};
use tracing::info;

#[cfg(feature = "desktop-shims")]
use bridge_traits::{AudioOutput, CatalogClient, RemoteSessionClient};
#[cfg(feature = "desktop-shims")]
use std::sync::Arc;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    player: PlayerHandle,
    events: EventBus,
    features: FeatureFlags,
}

impl CoreService {
    /// Start the player with default tunables. Must be called inside a tokio
    /// runtime.
    pub fn start(config: CoreConfig) -> Result<Self> {
        Self::start_with(config, PlayerConfig::default())
    }

    /// Start the player. Feature flags override the matching player tunables.
    pub fn start_with(config: CoreConfig, player_config: PlayerConfig) -> Result<Self> {
        config.validate()?;

        let features = config.features;
        let events = EventBus::new(config.event_buffer_size);
        let player_config = PlayerConfig {
            position_updates: player_config.position_updates && features.enable_position_updates,
            report_session: player_config.report_session && features.enable_session_reporting,
            ..player_config
        };
        let network = if features.enable_network_awareness {
            config.network_monitor.clone()
        } else {
            None
        };

        let deps = PlayerDependencies {
            catalog: config.catalog,
            session_client: config.session_client,
            audio_output: config.audio_output,
        };
        let player = PlayerService::spawn(deps, events.clone(), player_config, network)?;

        info!(?features, "Core service started");
        Ok(Self {
            player,
            events,
            features,
        })
    }

    /// Handle to the running player.
    pub fn player(&self) -> &PlayerHandle {
        &self.player
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to every core notification.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Subscribe to player notifications only.
    pub fn player_events(&self) -> EventStream {
        self.events.player_events()
    }

    pub fn features(&self) -> &FeatureFlags {
        &self.features
    }

    /// Stop playback, close the remote session and end the player task.
    pub async fn shutdown(&self) -> Result<()> {
        self.player.shutdown().await?;
        info!("Core service stopped");
        Ok(())
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("player", &self.player)
            .field("features", &self.features)
            .finish()
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Enables network awareness backed by the desktop reachability monitor.
///
/// ```ignore
/// let core = core_service::bootstrap_desktop(catalog, session_client, audio_output)?;
/// core.player().start_track(Some(track_id)).await?;
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(
    catalog: Arc<dyn CatalogClient>,
    session_client: Arc<dyn RemoteSessionClient>,
    audio_output: Arc<dyn AudioOutput>,
) -> Result<CoreService> {
    let config = CoreConfig::builder()
        .catalog(catalog)
        .session_client(session_client)
        .audio_output(audio_output)
        .enable_network_awareness(true)
        .build()?;
    CoreService::start(config)
}
