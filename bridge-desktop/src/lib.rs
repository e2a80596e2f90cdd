//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `DesktopNetworkMonitor`: reachability polling over TCP, used when the
//!   host enables network awareness without supplying its own monitor
//!
//! The catalog client, session client and audio output are always supplied
//! by the host application.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::DesktopNetworkMonitor;
//! use bridge_traits::NetworkMonitor;
//!
//! #[tokio::main]
//! async fn main() {
//!     let monitor = DesktopNetworkMonitor::new();
//!     let mut changes = monitor.subscribe_changes().await.unwrap();
//!     while let Some(info) = changes.next().await {
//!         println!("{:?}", info.status);
//!     }
//! }
//! ```

mod network;

pub use network::{DesktopNetworkMonitor, ProbeConfig};
