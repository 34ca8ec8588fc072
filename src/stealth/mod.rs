//! Tap humanisation
//!
//! Clicks land on a random point inside the located button instead of its
//! exact centre, and repeated touches get a little timing jitter.

pub mod humanize;

pub use humanize::*;

use serde::{Deserialize, Serialize};

/// Configuration for tap humanisation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StealthConfig {
    /// Pick a random point inside the button instead of its centre
    pub humanize_position: bool,
    /// Add variance to the sleep between repeated touches
    pub humanize_timing: bool,
    /// Pixels kept clear of the button edge
    pub edge_margin: i32,
    /// Uniform samples averaged into one coordinate (more = tighter around the centre)
    pub samples: u32,
    /// Delay variance percentage (0-100)
    pub timing_variance_percent: u32,
}

impl Default for StealthConfig {
    fn default() -> Self {
        Self {
            humanize_position: true,
            humanize_timing: true,
            edge_margin: 10,
            samples: 3,
            timing_variance_percent: 30,
        }
    }
}

impl StealthConfig {
    /// Create a config with no humanisation (for testing)
    pub fn disabled() -> Self {
        Self {
            humanize_position: false,
            humanize_timing: false,
            edge_margin: 0,
            samples: 1,
            timing_variance_percent: 0,
        }
    }
}
