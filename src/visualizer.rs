//! Frequency bars and the bass beat detector.

use crate::config::{AudioConfig, BeatPolicy};
use crate::theme::{Rgb, Rgba, Theme};

const BIN_OFFSET: usize = 1;
const CURVE_EXPONENT: f64 = 1.4;
const CURVE_GAIN: f64 = 160.0;
const MAX_HEIGHT_PCT: f64 = 100.0;

/// Theme-dependent extra styling of a bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarAccent {
    Opacity(f64),
    Glow { px: f64, color: Rgba },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarStyle {
    pub height_pct: f64,
    /// `None` leaves the previous accent in place, except on rest where the
    /// glue also strips it.
    pub accent: Option<BarAccent>,
}

impl BarStyle {
    pub fn resting(floor_pct: f64) -> Self {
        Self {
            height_pct: floor_pct,
            accent: None,
        }
    }
}

/// Maps a normalised amplitude to a bar accent for `theme`.
pub fn accent_for(theme: Theme, level: f64) -> Option<BarAccent> {
    match theme {
        Theme::Matrix | Theme::Christmas => Some(BarAccent::Opacity(0.4 + level * 0.6)),
        Theme::Purple => Some(BarAccent::Glow {
            px: 5.0 + level * 20.0,
            color: Rgb(187, 0, 255).alpha(1.0),
        }),
        Theme::Vapor => Some(BarAccent::Opacity(0.6 + level * 0.4)),
        Theme::Pink => Some(BarAccent::Glow {
            px: 8.0 + level * 15.0,
            color: Rgb(255, 105, 180).alpha(0.6),
        }),
        Theme::Dark | Theme::Light | Theme::Gold => None,
    }
}

#[derive(Debug, Clone)]
pub struct AudioVisualizer {
    bars: Vec<BarStyle>,
    floor_pct: f64,
    style_interval_ms: f64,
    last_style_ms: Option<f64>,
}

impl AudioVisualizer {
    pub fn new(bar_count: usize, config: &AudioConfig) -> Self {
        Self {
            bars: vec![BarStyle::resting(config.bar_floor_pct); bar_count],
            floor_pct: config.bar_floor_pct,
            style_interval_ms: config.style_interval_ms,
            last_style_ms: None,
        }
    }

    pub fn bars(&self) -> &[BarStyle] {
        &self.bars
    }

    pub fn set_bar_count(&mut self, count: usize) {
        self.bars = vec![BarStyle::resting(self.floor_pct); count];
    }

    /// Recomputes every bar from one frequency snapshot.
    ///
    /// Accents are refreshed only when `style_interval_ms` has passed since
    /// the last refresh; in between they are reported as `None`.
    pub fn tick(&mut self, spectrum: &[u8], now_ms: f64, theme: Theme) -> &[BarStyle] {
        let count = self.bars.len();
        if count == 0 {
            return &self.bars;
        }
        let restyle = self
            .last_style_ms
            .map_or(true, |last| now_ms - last > self.style_interval_ms);
        let step = (spectrum.len().saturating_sub(BIN_OFFSET) / count).max(1);

        for (i, bar) in self.bars.iter_mut().enumerate() {
            let start = i * step + BIN_OFFSET;
            let sum: u32 = (start..start + step)
                .map(|j| u32::from(spectrum.get(j).copied().unwrap_or(0)))
                .sum();
            let level = f64::from(sum) / step as f64 / 255.0;
            let height = (level.powf(CURVE_EXPONENT) * CURVE_GAIN)
                .max(self.floor_pct)
                .min(MAX_HEIGHT_PCT);
            bar.height_pct = height;
            bar.accent = if restyle { accent_for(theme, level) } else { None };
        }

        if restyle {
            self.last_style_ms = Some(now_ms);
        }
        &self.bars
    }

    /// Drops every bar to its floor with no accent.
    pub fn rest(&mut self) -> &[BarStyle] {
        for bar in &mut self.bars {
            *bar = BarStyle::resting(self.floor_pct);
        }
        self.last_style_ms = None;
        &self.bars
    }
}

/// Best-effort bass hit detector with a refractory window.
#[derive(Debug, Clone)]
pub struct BeatDetector {
    policy: BeatPolicy,
    last_beat_ms: Option<f64>,
}

impl BeatDetector {
    pub fn new(policy: BeatPolicy) -> Self {
        Self {
            policy,
            last_beat_ms: None,
        }
    }

    pub fn policy(&self) -> &BeatPolicy {
        &self.policy
    }

    pub fn bass_level(&self, spectrum: &[u8]) -> f64 {
        let bins = self.policy.bass_bins.max(1);
        let sum: u32 = spectrum.iter().take(bins).map(|&b| u32::from(b)).sum();
        f64::from(sum) / bins as f64
    }

    /// Returns `true` when this snapshot counts as a new beat.
    pub fn detect(&mut self, spectrum: &[u8], now_ms: f64) -> bool {
        let loud = self.bass_level(spectrum) > self.policy.threshold;
        let rested = self
            .last_beat_ms
            .map_or(true, |last| now_ms - last >= self.policy.refractory_ms);
        if loud && rested {
            self.last_beat_ms = Some(now_ms);
            true
        } else {
            false
        }
    }
}
