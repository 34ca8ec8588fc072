//! Random tap points and delays

use std::time::Duration;

use rand::Rng;

use super::StealthConfig;
use crate::vision::Point;

/// Humanizer for generating tap positions and delays
pub struct Humanizer {
    rng: rand::rngs::ThreadRng,
}

impl Default for Humanizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Humanizer {
    /// Create a new humanizer
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Integer in `[a, b)` approximating a normal distribution by averaging
    /// `samples` uniform draws. Returns `b` for an empty interval.
    pub fn normal_int(&mut self, a: i32, b: i32, samples: u32) -> i32 {
        if a >= b {
            return b;
        }
        let samples = samples.max(1);
        let sum: f64 = (0..samples)
            .map(|_| f64::from(self.rng.gen_range(a..b)))
            .sum();
        (sum / f64::from(samples)).round() as i32
    }

    /// Random point inside a `width` x `height` button centred on `center`
    pub fn rectangle_point(
        &mut self,
        center: Point,
        width: f32,
        height: f32,
        config: &StealthConfig,
    ) -> Point {
        if !config.humanize_position {
            return center;
        }

        let half_w = ((width / 2.0) as i32 - config.edge_margin).max(0);
        let half_h = ((height / 2.0) as i32 - config.edge_margin).max(0);

        Point::new(
            self.normal_int(center.x - half_w, center.x + half_w, config.samples),
            self.normal_int(center.y - half_h, center.y + half_h, config.samples),
        )
    }

    /// Humanize a delay with variance
    pub fn humanize_delay(&mut self, base: Duration, config: &StealthConfig) -> Duration {
        if !config.humanize_timing || config.timing_variance_percent == 0 {
            return base;
        }

        let base_ms = base.as_millis() as i64;
        let variance = base_ms * i64::from(config.timing_variance_percent) / 100;
        if variance == 0 {
            return base;
        }
        let offset = self.rng.gen_range(-variance..=variance);

        Duration::from_millis((base_ms + offset).max(0) as u64)
    }
}
