//! # Player Configuration
//!
//! Tunables for the playback engine and its executor task.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Player configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Interval between position notifications while playing.
    ///
    /// Default: 1 second.
    #[serde(default = "default_position_interval")]
    pub position_interval: Duration,

    /// Emit position notifications at all.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub position_updates: bool,

    /// Capacity of the command channel feeding the executor.
    ///
    /// Default: 32.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Output volume at startup (0.0-1.0).
    ///
    /// Default: 1.0.
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,

    /// Start muted.
    #[serde(default)]
    pub initial_muted: bool,

    /// Open and report a remote "now playing" session.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub report_session: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            position_interval: default_position_interval(),
            position_updates: true,
            command_buffer: default_command_buffer(),
            initial_volume: default_initial_volume(),
            initial_muted: false,
            report_session: true,
        }
    }
}

impl PlayerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.position_interval.is_zero() {
            return Err("position_interval must be > 0".to_string());
        }

        if self.command_buffer == 0 {
            return Err("command_buffer must be > 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err("initial_volume must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }
}

fn default_position_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_command_buffer() -> usize {
    32
}

fn default_initial_volume() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}
