//! Network Monitoring Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    network::{NetworkChangeStream, NetworkInfo, NetworkMonitor, NetworkStatus, NetworkType},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Reachability probe settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// `host:port` that must accept a TCP connection for the network to
    /// count as connected.
    pub address: String,
    /// How long a single probe may take.
    pub timeout: Duration,
    /// Delay between probes in a change stream.
    pub poll_interval: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            address: "1.1.1.1:53".to_string(),
            timeout: Duration::from_secs(3),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Desktop network monitor implementation
///
/// Detects connectivity by opening a TCP connection to a well-known
/// endpoint. Platform APIs (netlink, SystemConfiguration, WinAPI) would
/// report changes faster but need extra dependencies.
pub struct DesktopNetworkMonitor {
    probe: ProbeConfig,
    cached_info: Arc<Mutex<Option<NetworkInfo>>>,
}

impl DesktopNetworkMonitor {
    /// Create a monitor with the default probe.
    pub fn new() -> Self {
        Self::with_probe(ProbeConfig::default())
    }

    pub fn with_probe(probe: ProbeConfig) -> Self {
        Self {
            probe,
            cached_info: Arc::new(Mutex::new(None)),
        }
    }

    /// Last observed network info, if any probe has run.
    pub async fn cached_info(&self) -> Option<NetworkInfo> {
        self.cached_info.lock().await.clone()
    }

    async fn check_connectivity(&self) -> NetworkStatus {
        probe(&self.probe).await
    }
}

impl Default for DesktopNetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

async fn probe(config: &ProbeConfig) -> NetworkStatus {
    match tokio::time::timeout(
        config.timeout,
        tokio::net::TcpStream::connect(config.address.as_str()),
    )
    .await
    {
        Ok(Ok(_)) => NetworkStatus::Connected,
        Ok(Err(_)) | Err(_) => NetworkStatus::Disconnected,
    }
}

fn info_for(status: NetworkStatus) -> NetworkInfo {
    NetworkInfo {
        status,
        // Can't tell WiFi from Ethernet without platform APIs
        network_type: (status == NetworkStatus::Connected).then_some(NetworkType::Other),
    }
}

#[async_trait]
impl NetworkMonitor for DesktopNetworkMonitor {
    async fn get_network_info(&self) -> Result<NetworkInfo> {
        let status = self.check_connectivity().await;
        let info = info_for(status);

        *self.cached_info.lock().await = Some(info.clone());
        debug!(status = ?status, "Network info updated");

        Ok(info)
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>> {
        Ok(Box::new(DesktopNetworkChangeStream {
            probe: self.probe.clone(),
            cached_info: self.cached_info.clone(),
            last_status: None,
        }))
    }
}

/// Polls the probe and yields only status changes. The first poll always
/// yields.
struct DesktopNetworkChangeStream {
    probe: ProbeConfig,
    cached_info: Arc<Mutex<Option<NetworkInfo>>>,
    last_status: Option<NetworkStatus>,
}

#[async_trait]
impl NetworkChangeStream for DesktopNetworkChangeStream {
    async fn next(&mut self) -> Option<NetworkInfo> {
        loop {
            if self.last_status.is_some() {
                tokio::time::sleep(self.probe.poll_interval).await;
            }

            let info = info_for(probe(&self.probe).await);
            *self.cached_info.lock().await = Some(info.clone());

            if self.last_status != Some(info.status) {
                self.last_status = Some(info.status);
                return Some(info);
            }
        }
    }
}
