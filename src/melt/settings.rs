use serde::{Deserialize, Serialize};
use std::time::Duration;

const MIN_TICK_INTERVAL_MS: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeltSettings {
    /// Milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Seconds of tremor before the sprites start bouncing.
    #[serde(default = "default_tremor_seconds")]
    pub tremor_seconds: f64,
    /// Chance per tick that one new sprite appears.
    #[serde(default = "default_spawn_probability")]
    pub spawn_probability: f64,
    /// Upper bound on live sprites; the oldest is evicted when full. `None`
    /// keeps every sprite for the whole session.
    #[serde(default)]
    pub max_sprites: Option<usize>,
    #[serde(default)]
    pub clamp_on_bounce: bool,
    /// Sprites spawned after the bounce phase begins also bounce.
    #[serde(default)]
    pub bounce_late_spawns: bool,
    #[serde(default = "default_show_cursor_icon")]
    pub show_cursor_icon: bool,
    /// PNG files replacing the built-in status icons.
    #[serde(default)]
    pub icon_paths: Vec<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_tick_interval_ms() -> u64 {
    30
}

fn default_tremor_seconds() -> f64 {
    15.0
}

fn default_spawn_probability() -> f64 {
    0.10
}

fn default_show_cursor_icon() -> bool {
    true
}

impl Default for MeltSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            tremor_seconds: default_tremor_seconds(),
            spawn_probability: default_spawn_probability(),
            max_sprites: None,
            clamp_on_bounce: false,
            bounce_late_spawns: false,
            show_cursor_icon: default_show_cursor_icon(),
            icon_paths: Vec::new(),
            seed: None,
            debug_logging: false,
        }
    }
}

impl MeltSettings {
    pub fn sanitize(&mut self) {
        self.tick_interval_ms = self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS);
        self.tremor_seconds = if self.tremor_seconds.is_finite() {
            self.tremor_seconds.max(0.0)
        } else {
            default_tremor_seconds()
        };
        self.spawn_probability = if self.spawn_probability.is_nan() {
            default_spawn_probability()
        } else {
            self.spawn_probability.clamp(0.0, 1.0)
        };
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS))
    }

    pub fn tremor_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.tremor_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_tremor_seconds()))
    }
}
