//! Per-track state projection and re-exports of the notification state types.

use serde::{Deserialize, Serialize};

pub use core_runtime::events::{LoadPhase, PlayerState, TransportState};

/// State of a given track as seen by observers.
///
/// Derived from the audible track, the transport state and the selection.
/// Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackState {
    None,
    Selected,
    Playing,
    Paused,
}

