//! Rate + target -> ordinal status.

use growth_core::config::FunnelProfileConfig;
use growth_core::math::safe_div;
use growth_core::types::{Direction, Status};

/// Threshold-based classifier. One instance per funnel profile so that each
/// calculator can carry its own ratios and minimum sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    thresholds: FunnelProfileConfig,
}

impl Classifier {
    pub fn new(thresholds: FunnelProfileConfig) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &FunnelProfileConfig {
        &self.thresholds
    }

    /// Classify `current` against `target`.
    ///
    /// Higher-is-better compares `current / target` to the ok/attention
    /// ratios. Lower-is-better compares `current` to `target` and
    /// `target * lower_attention_ratio`.
    pub fn classify(&self, current: Option<f64>, target: f64, direction: Direction) -> Status {
        let Some(current) = current else {
            return Status::NoData;
        };
        let t = &self.thresholds;
        match direction {
            Direction::HigherIsBetter => match safe_div(Some(current), Some(target)) {
                Some(ratio) if ratio >= t.ok_ratio => Status::Ok,
                Some(ratio) if ratio >= t.attention_ratio => Status::Attention,
                Some(_) => Status::Critical,
                // Zero target: anything non-negative meets it.
                None if current >= target => Status::Ok,
                None => Status::Critical,
            },
            Direction::LowerIsBetter => {
                if current <= target {
                    Status::Ok
                } else if current <= target * t.lower_attention_ratio {
                    Status::Attention
                } else {
                    Status::Critical
                }
            }
        }
    }

    /// Like [`Classifier::classify`], but a defined denominator below
    /// `min_sample` yields `LowSample`. A zero or missing denominator is
    /// `NoData`, which wins over `LowSample`.
    pub fn classify_with_sample(
        &self,
        current: Option<f64>,
        target: f64,
        direction: Direction,
        sample_size: Option<f64>,
    ) -> Status {
        match sample_size {
            _ if current.is_none() => Status::NoData,
            Some(n) if n <= 0.0 => Status::NoData,
            Some(n) if n < self.thresholds.min_sample as f64 => Status::LowSample,
            _ => self.classify(current, target, direction),
        }
    }
}

/// Classify with the default inside-sales thresholds.
pub fn classify(current: Option<f64>, target: f64, direction: Direction) -> Status {
    Classifier::default().classify(current, target, direction)
}
