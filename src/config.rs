use serde::{Deserialize, Serialize};

use crate::Result;

/// Tunables for every animation layer.
///
/// Missing fields fall back to their defaults, so a page can embed a partial
/// JSON object such as `{"trail": {"capacity": 50}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FxConfig {
    pub trail: TrailConfig,
    pub background: BackgroundConfig,
    pub cursor: CursorConfig,
    pub audio: AudioConfig,
    /// Fixed RNG seed; the web entry point draws one when absent.
    pub seed: Option<u64>,
}

impl FxConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Ambient trail particles alive at once.
    pub capacity: usize,
    pub hover_burst: usize,
    pub click_burst: usize,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            capacity: 30,
            hover_burst: 15,
            click_burst: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub star_count: usize,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self { star_count: 150 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Fraction of the remaining distance the outline covers per frame.
    pub smoothing: f64,
    pub tilt_divisor: f64,
    /// How long the entry warp lasts before the content is revealed.
    pub warp_ms: f64,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.3,
            tilt_divisor: 30.0,
            warp_ms: 800.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub bar_floor_pct: f64,
    pub style_interval_ms: f64,
    pub beat: BeatPolicy,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bar_floor_pct: 8.0,
            style_interval_ms: 100.0,
            beat: BeatPolicy::default(),
        }
    }
}

/// When a bass hit counts as a beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatPolicy {
    /// Average byte amplitude (0-255) of the bass band.
    pub threshold: f64,
    pub refractory_ms: f64,
    /// Number of lowest frequency bins forming the bass band.
    pub bass_bins: usize,
    pub burst: usize,
}

impl Default for BeatPolicy {
    fn default() -> Self {
        Self {
            threshold: 200.0,
            refractory_ms: 300.0,
            bass_bins: 10,
            burst: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = FxConfig::from_json(r#"{"trail": {"capacity": 50}, "seed": 7}"#).unwrap();
        assert_eq!(cfg.trail.capacity, 50);
        assert_eq!(cfg.trail.click_burst, 30);
        assert_eq!(cfg.audio.beat.refractory_ms, 300.0);
        assert_eq!(cfg.seed, Some(7));
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(FxConfig::from_json("{}").unwrap(), FxConfig::default());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(FxConfig::from_json("{trail:").is_err());
    }
}
