//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and sizing knobs shared by every room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length of the `GAME_STARTING` countdown, in ticks.
    pub start_delay_secs: u32,

    /// Length of one countdown tick. One second in production; tests
    /// shorten it.
    pub tick_period_ms: u64,

    /// Capacity of each room actor's command channel.
    pub command_channel_size: usize,
}

impl EngineConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_delay_secs: 10,
            tick_period_ms: 1000,
            command_channel_size: 64,
        }
    }
}
