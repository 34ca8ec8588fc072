//! Timing, matching and navigation settings
//!
//! Defines all tunable knobs of the locator and the navigator. Durations are
//! stored as integer milliseconds so settings files stay readable.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ocr::Lang;
use crate::stealth::StealthConfig;

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Screen search settings
    pub locator: LocatorSettings,
    /// Text recognition settings
    pub ocr: OcrSettings,
    /// Page navigation and switch settings
    pub navigation: NavigationSettings,
    /// Tap humanisation
    pub stealth: StealthConfig,
}

impl Settings {
    /// Short timeouts for a responsive desktop window
    pub fn fast_preset() -> Self {
        Self {
            locator: LocatorSettings {
                find_timeout_ms: 5000,
                find_timeout_tmp_ms: 1000,
                poll_interval_ms: 150,
                foreground_buffer_ms: 500,
                ..Default::default()
            },
            navigation: NavigationSettings {
                page_probe_timeout_ms: 300,
                current_page_timeout_ms: 5000,
                goto_budget_ms: 60_000,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Long timeouts for slow machines and emulators
    pub fn patient_preset() -> Self {
        Self {
            locator: LocatorSettings {
                find_timeout_ms: 40_000,
                find_timeout_tmp_ms: 6000,
                poll_interval_ms: 600,
                foreground_buffer_ms: 2000,
                ..Default::default()
            },
            navigation: NavigationSettings {
                page_probe_timeout_ms: 1000,
                current_page_timeout_ms: 20_000,
                current_page_confirm_count: 30,
                goto_budget_ms: 360_000,
                switch_click_interval_ms: 2000,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse settings from JSON, missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Window border in pixels, applied when the window aspect ratio differs
/// from the template resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
    pub top: u32,
    pub side: u32,
    pub bottom: u32,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            top: 32,
            side: 3,
            bottom: 2,
        }
    }
}

/// Screen search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorSettings {
    /// Default timeout of `wait` and `touch` (ms)
    pub find_timeout_ms: u64,
    /// Timeout for the second end of a swipe (ms)
    pub find_timeout_tmp_ms: u64,
    /// Sleep between two probes (ms)
    pub poll_interval_ms: u64,
    /// Template match threshold
    pub threshold: f32,
    /// Bring the window back to the front once when a search times out
    pub keep_foreground: bool,
    /// Settle time before raising the window (ms)
    pub foreground_buffer_ms: u64,
    /// Sleep between repeated touches (ms)
    pub touch_interval_ms: u64,
    /// Window decoration
    pub border: Border,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            find_timeout_ms: 20_000,
            find_timeout_tmp_ms: 3000,
            poll_interval_ms: 300,
            threshold: 0.8,
            keep_foreground: true,
            foreground_buffer_ms: 1000,
            touch_interval_ms: 50,
            border: Border::default(),
        }
    }
}

impl LocatorSettings {
    pub fn find_timeout(&self) -> Duration {
        Duration::from_millis(self.find_timeout_ms)
    }

    pub fn find_timeout_tmp(&self) -> Duration {
        Duration::from_millis(self.find_timeout_tmp_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn foreground_buffer(&self) -> Duration {
        Duration::from_millis(self.foreground_buffer_ms)
    }

    pub fn touch_interval(&self) -> Duration {
        Duration::from_millis(self.touch_interval_ms)
    }
}

/// Text recognition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Only compare against this language, `None` for every variant
    pub lang: Option<Lang>,
    /// Minimum ratio for `MatchMode::Similar`
    pub similar_threshold: f32,
    /// Drop punctuation and case before comparing
    pub ignore_punctuation: bool,
    /// Never resolve purely numeric text to a keyword
    pub ignore_digit: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            lang: None,
            similar_threshold: 0.75,
            ignore_punctuation: true,
            ignore_digit: true,
        }
    }
}

/// Page navigation and switch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    /// How long to look for the destination on each traversal pass (ms)
    pub page_probe_timeout_ms: u64,
    /// Budget for identifying the current page (ms)
    pub current_page_timeout_ms: u64,
    /// Polls required before the identification budget counts as spent
    pub current_page_confirm_count: u32,
    /// Upper bound for a whole `goto` (ms)
    pub goto_budget_ms: u64,
    /// Minimum time between two switch clicks (ms)
    pub switch_click_interval_ms: u64,
    /// Polls required between two switch clicks
    pub switch_click_count: u32,
    /// Minimum time between two unknown-state warnings (ms)
    pub switch_warning_interval_ms: u64,
    /// Polls required between two unknown-state warnings
    pub switch_warning_count: u32,
    /// Sleep between two switch probes (ms)
    pub switch_poll_interval_ms: u64,
    /// Upper bound for settling a switch (ms)
    pub switch_budget_ms: u64,
    /// Minimum time between two index clicks (ms)
    pub index_retry_interval_ms: u64,
    /// Polls required between two index clicks
    pub index_retry_count: u32,
    /// Upper bound for `ensure_index` (ms)
    pub index_budget_ms: u64,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            page_probe_timeout_ms: 500,
            current_page_timeout_ms: 10_000,
            current_page_confirm_count: 20,
            goto_budget_ms: 180_000,
            switch_click_interval_ms: 1000,
            switch_click_count: 3,
            switch_warning_interval_ms: 5000,
            switch_warning_count: 10,
            switch_poll_interval_ms: 200,
            switch_budget_ms: 60_000,
            index_retry_interval_ms: 1000,
            index_retry_count: 2,
            index_budget_ms: 30_000,
        }
    }
}

impl NavigationSettings {
    pub fn page_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.page_probe_timeout_ms)
    }

    pub fn current_page_timeout(&self) -> Duration {
        Duration::from_millis(self.current_page_timeout_ms)
    }

    pub fn goto_budget(&self) -> Duration {
        Duration::from_millis(self.goto_budget_ms)
    }

    pub fn switch_click_interval(&self) -> Duration {
        Duration::from_millis(self.switch_click_interval_ms)
    }

    pub fn switch_warning_interval(&self) -> Duration {
        Duration::from_millis(self.switch_warning_interval_ms)
    }

    pub fn switch_poll_interval(&self) -> Duration {
        Duration::from_millis(self.switch_poll_interval_ms)
    }

    pub fn switch_budget(&self) -> Duration {
        Duration::from_millis(self.switch_budget_ms)
    }

    pub fn index_retry_interval(&self) -> Duration {
        Duration::from_millis(self.index_retry_interval_ms)
    }

    pub fn index_budget(&self) -> Duration {
        Duration::from_millis(self.index_budget_ms)
    }
}
