//! Shake detection over raw accelerometer samples.
//!
//! Each sample is compared with the previous one using the L1 norm of the
//! difference. A delta above the threshold counts as a shake unless another
//! shake was accepted within the debounce interval. Accepted shakes are kept
//! in a rolling window used for intensity and pattern classification.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::preset::ThresholdPreset;
use crate::alarm::Difficulty;
use crate::storage::ShakeSettings;

/// How long `is_shaking` stays true after an accepted shake.
const SHAKING_HOLD_MS: u64 = 300;
/// Buffer entries used for pattern classification.
const PATTERN_WINDOW: usize = 5;
/// Buffer entries needed before a pattern is reported.
const PATTERN_MIN_SAMPLES: usize = 3;

/// One accelerometer reading. `t_ms` is a monotonic timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t_ms: u64,
}

impl Sample {
    pub fn new(x: f64, y: f64, z: f64, t_ms: u64) -> Self {
        Self { x, y, z, t_ms }
    }

    fn l1_delta(&self, other: &Sample) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShakePattern {
    Unknown,
    Gentle,
    Normal,
    Strong,
    Violent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShakeConfig {
    pub threshold: f64,
    pub required_shakes: u32,
    pub shake_interval_ms: u64,
    pub window_ms: u64,
}

impl ShakeConfig {
    /// Preset threshold for `difficulty`, with the user override clamped
    /// into the preset's range.
    pub fn for_difficulty(difficulty: Difficulty, settings: &ShakeSettings) -> Self {
        let preset = ThresholdPreset::for_difficulty(difficulty);
        Self {
            threshold: preset.resolve(settings.threshold_override),
            required_shakes: difficulty.required_shakes(),
            shake_interval_ms: settings.shake_interval_ms,
            window_ms: settings.window_secs.saturating_mul(1000),
        }
    }
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::default(), &ShakeSettings::default())
    }
}

/// An accepted shake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeHit {
    pub count: u32,
    pub delta: f64,
    /// The required shake count has been reached.
    pub completed: bool,
}

#[derive(Debug)]
pub struct ShakeDetector {
    config: ShakeConfig,
    preset: ThresholdPreset,
    last_sample: Sample,
    last_shake_ms: Option<u64>,
    latest_ms: u64,
    shake_count: u32,
    buffer: VecDeque<(f64, u64)>,
}

impl ShakeDetector {
    pub fn new(config: ShakeConfig, preset: ThresholdPreset) -> Self {
        Self {
            config,
            preset,
            last_sample: Sample::default(),
            last_shake_ms: None,
            latest_ms: 0,
            shake_count: 0,
            buffer: VecDeque::new(),
        }
    }

    pub fn for_difficulty(difficulty: Difficulty, settings: &ShakeSettings) -> Self {
        Self::new(
            ShakeConfig::for_difficulty(difficulty, settings),
            ThresholdPreset::for_difficulty(difficulty),
        )
    }

    /// Feed one sample. Returns the accepted shake, if any.
    pub fn process(&mut self, sample: Sample) -> Option<ShakeHit> {
        let delta = sample.l1_delta(&self.last_sample);
        self.last_sample = sample;
        self.latest_ms = self.latest_ms.max(sample.t_ms);

        let debounced = self
            .last_shake_ms
            .is_some_and(|last| sample.t_ms.saturating_sub(last) <= self.config.shake_interval_ms);

        let hit = if delta > self.config.threshold && !debounced {
            self.shake_count += 1;
            self.last_shake_ms = Some(sample.t_ms);
            self.buffer.push_back((delta, sample.t_ms));
            tracing::debug!("shake {} (delta {:.2})", self.shake_count, delta);
            Some(ShakeHit {
                count: self.shake_count,
                delta,
                completed: self.shake_count >= self.config.required_shakes,
            })
        } else {
            None
        };

        self.evict(sample.t_ms);
        hit
    }

    fn evict(&mut self, now_ms: u64) {
        while let Some(&(_, t)) = self.buffer.front() {
            if t.saturating_add(self.config.window_ms) <= now_ms {
                self.buffer.pop_front();
            } else {
                break;
            }
        }
    }

    /// Mean delta of the buffered shakes; 0 when empty.
    pub fn intensity(&self) -> f64 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        self.buffer.iter().map(|(d, _)| d).sum::<f64>() / self.buffer.len() as f64
    }

    pub fn pattern(&self) -> ShakePattern {
        if self.buffer.len() < PATTERN_MIN_SAMPLES {
            return ShakePattern::Unknown;
        }
        let recent: Vec<f64> = self
            .buffer
            .iter()
            .rev()
            .take(PATTERN_WINDOW)
            .map(|(d, _)| *d)
            .collect();
        let mean = recent.iter().sum::<f64>() / recent.len() as f64;
        let threshold = self.config.threshold;

        if mean > threshold * 2.0 {
            ShakePattern::Violent
        } else if mean > threshold * 1.5 {
            ShakePattern::Strong
        } else if mean > threshold {
            ShakePattern::Normal
        } else {
            ShakePattern::Gentle
        }
    }

    pub fn shake_count(&self) -> u32 {
        self.shake_count
    }

    /// True shortly after an accepted shake, measured on sample time.
    pub fn is_shaking(&self) -> bool {
        self.last_shake_ms
            .is_some_and(|last| self.latest_ms.saturating_sub(last) < SHAKING_HOLD_MS)
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    pub fn required_shakes(&self) -> u32 {
        self.config.required_shakes
    }

    pub fn preset(&self) -> ThresholdPreset {
        self.preset
    }

    /// Change the threshold; the value is clamped to the preset range and
    /// the applied value is returned.
    pub fn set_threshold(&mut self, requested: f64) -> f64 {
        let applied = self.preset.clamp(requested);
        if applied != requested {
            tracing::warn!("threshold {requested} clamped to {applied}");
        }
        self.config.threshold = applied;
        applied
    }

    /// Clear count and history. The last sample is kept so drift tracking
    /// continues.
    pub fn reset(&mut self) {
        self.shake_count = 0;
        self.last_shake_ms = None;
        self.buffer.clear();
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ShakeDetector {
        ShakeDetector::for_difficulty(Difficulty::Easy, &ShakeSettings::default())
    }

    #[test]
    fn small_deltas_never_shake() {
        let mut d = detector();
        for i in 0..200u64 {
            let v = i as f64 * 0.05;
            assert!(d.process(Sample::new(v, v, v, i * 100)).is_none());
        }
        assert_eq!(d.shake_count(), 0);
        assert_eq!(d.pattern(), ShakePattern::Unknown);
    }

    #[test]
    fn debounce_swallows_second_jolt() {
        let mut d = detector();
        let hit = d.process(Sample::new(20.0, 0.0, 0.0, 1_000)).unwrap();
        assert_eq!(hit.count, 1);
        assert!(d.is_shaking());
        assert!(d.process(Sample::new(-20.0, 0.0, 0.0, 1_200)).is_none());
        assert!(d.process(Sample::new(20.0, 0.0, 0.0, 1_501)).is_some());
        assert_eq!(d.shake_count(), 2);
    }

    #[test]
    fn last_sample_tracks_every_reading() {
        let mut d = detector();
        // Large offset, but reached through small steps.
        for i in 0..=100u64 {
            d.process(Sample::new(i as f64 * 0.5, 0.0, 0.0, i * 100));
        }
        assert_eq!(d.shake_count(), 0);
    }

    #[test]
    fn completes_at_required_count() {
        let mut d = detector();
        let mut last = None;
        for i in 0..10u64 {
            let x = if i % 2 == 0 { 20.0 } else { -20.0 };
            last = d.process(Sample::new(x, 0.0, 0.0, i * 600));
        }
        let hit = last.unwrap();
        assert_eq!(hit.count, 10);
        assert!(hit.completed);
    }

    #[test]
    fn intensity_and_pattern_use_window() {
        let mut d = detector();
        for i in 0..5u64 {
            let x = if i % 2 == 0 { 14.0 } else { 0.0 };
            d.process(Sample::new(x, 0.0, 0.0, i * 600));
        }
        // Five shakes of delta 14 against threshold 12.
        assert_eq!(d.buffered(), 5);
        assert!((d.intensity() - 14.0).abs() < 1e-9);
        assert_eq!(d.pattern(), ShakePattern::Normal);

        // Eleven seconds later the window is empty.
        d.process(Sample::new(14.0, 0.0, 0.0, 4 * 600 + 11_000));
        assert_eq!(d.buffered(), 0);
        assert_eq!(d.intensity(), 0.0);
        assert!(!d.is_shaking());
    }

    #[test]
    fn violent_pattern() {
        let mut d = detector();
        for i in 0..4u64 {
            let x = if i % 2 == 0 { 30.0 } else { 0.0 };
            d.process(Sample::new(x, 0.0, 0.0, i * 600));
        }
        assert_eq!(d.pattern(), ShakePattern::Violent);
    }

    #[test]
    fn threshold_is_clamped_and_reset_clears() {
        let mut d = detector();
        assert_eq!(d.set_threshold(99.0), 15.0);
        assert_eq!(d.threshold(), 15.0);
        d.process(Sample::new(20.0, 0.0, 0.0, 0));
        assert_eq!(d.shake_count(), 1);
        d.reset();
        assert_eq!(d.shake_count(), 0);
        assert_eq!(d.buffered(), 0);
    }

    #[test]
    fn override_in_settings_is_clamped() {
        let settings = ShakeSettings {
            threshold_override: Some(1.0),
            ..ShakeSettings::default()
        };
        let cfg = ShakeConfig::for_difficulty(Difficulty::Hard, &settings);
        assert_eq!(cfg.threshold, 15.0);
        assert_eq!(cfg.required_shakes, 30);
        assert_eq!(cfg.window_ms, 10_000);
    }
}
