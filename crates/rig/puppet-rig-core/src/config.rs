//! Core configuration for puppet-rig-core.

use serde::{Deserialize, Serialize};

/// Shape of the fade-in / fade-out ramps applied to playback entries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeCurve {
    /// Straight ramp from 0 to 1.
    #[default]
    Linear,
    /// Eased ramp `0.5 - 0.5 * cos(pi * t)`.
    Sine,
}

impl FadeCurve {
    /// Map normalized progress to a weight in [0, 1]. Input is clamped first.
    #[inline]
    pub fn ease(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            FadeCurve::Sine => 0.5 - 0.5 * (t * std::f32::consts::PI).cos(),
        }
    }
}

/// Configuration for fade defaults, table sizing and event limits.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fade-in used when an expression asset omits `FadeInTime` or gives a negative one.
    pub default_fade_in_seconds: f32,
    /// Fade-out used when an expression asset omits `FadeOutTime` or gives a negative one.
    pub default_fade_out_seconds: f32,
    pub fade_curve: FadeCurve,

    /// Initial capacity of the shadow parameter/part tables.
    pub shadow_capacity_hint: usize,

    /// Maximum events retained per manager update; extra events are dropped.
    pub max_events_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_fade_in_seconds: 1.0,
            default_fade_out_seconds: 1.0,
            fade_curve: FadeCurve::Linear,
            shadow_capacity_hint: 8,
            max_events_per_tick: 64,
        }
    }
}
