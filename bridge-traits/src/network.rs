//! Network Monitoring Abstraction
//!
//! Provides network connectivity status and change notifications.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Network connection type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkType {
    /// Cellular/mobile data connection
    Cellular,
    /// WiFi connection
    WiFi,
    /// Ethernet connection
    Ethernet,
    /// Other or unknown connection type
    Other,
}

/// Network connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkStatus {
    /// Connected to network
    Connected,
    /// Not connected to any network
    Disconnected,
    /// Connection status unknown or indeterminate
    Indeterminate,
}

impl NetworkStatus {
    /// Whether this status means an open stream can no longer be trusted.
    pub fn is_lost(&self) -> bool {
        matches!(self, NetworkStatus::Disconnected)
    }
}

/// Network information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub status: NetworkStatus,
    pub network_type: Option<NetworkType>,
}

impl NetworkInfo {
    pub fn new(status: NetworkStatus) -> Self {
        Self {
            status,
            network_type: None,
        }
    }
}

/// Network monitor trait
///
/// The player only cares about connectivity drops: a drop marks the open
/// stream as suspect so that the next resume of the same track rebuilds it
/// instead of resuming a dead connection.
///
/// # Platform Support
///
/// - **Desktop**: reachability polling (`bridge-desktop`) or system network APIs
/// - **Mobile**: ConnectivityManager / Network framework, injected by the host
///
/// # Example
///
/// ```ignore
/// use bridge_traits::network::NetworkMonitor;
///
/// async fn watch(monitor: &dyn NetworkMonitor) {
///     let mut changes = monitor.subscribe_changes().await?;
///     while let Some(info) = changes.next().await {
///         println!("network is now {:?}", info.status);
///     }
/// }
/// ```
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Get current network information
    async fn get_network_info(&self) -> Result<NetworkInfo>;

    /// Check if currently connected to any network
    async fn is_connected(&self) -> bool {
        matches!(
            self.get_network_info().await,
            Ok(NetworkInfo {
                status: NetworkStatus::Connected,
                ..
            })
        )
    }

    /// Subscribe to network status changes
    ///
    /// Returns a stream of network info updates. Implementations should
    /// emit an event whenever network status changes.
    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>>;
}

/// Stream of network status changes
#[async_trait]
pub trait NetworkChangeStream: Send {
    /// Get the next network info update
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<NetworkInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        Monitor {}

        #[async_trait]
        impl NetworkMonitor for Monitor {
            async fn get_network_info(&self) -> Result<NetworkInfo>;
            async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>>;
        }
    }

    #[test]
    fn test_only_disconnected_counts_as_lost() {
        assert!(NetworkStatus::Disconnected.is_lost());
        assert!(!NetworkStatus::Connected.is_lost());
        assert!(!NetworkStatus::Indeterminate.is_lost());
    }

    #[tokio::test]
    async fn test_is_connected_default_uses_network_info() {
        let mut monitor = MockMonitor::new();
        monitor
            .expect_get_network_info()
            .times(1)
            .returning(|| Ok(NetworkInfo::new(NetworkStatus::Connected)));
        assert!(monitor.is_connected().await);

        let mut offline = MockMonitor::new();
        offline.expect_get_network_info().times(1).returning(|| {
            Err(crate::BridgeError::NotAvailable(
                "connectivity probe".to_string(),
            ))
        });
        assert!(!offline.is_connected().await);
    }
}
