//! Navigator state tracking
//!
//! Records which phase of a navigation the navigator is in and which page
//! it last confirmed, for logging and for callers that want a snapshot.

use serde::{Deserialize, Serialize};

/// Phase of the current navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavPhase {
    /// No page confirmed yet
    Unknown,
    /// Probing every page to find the current one
    Identifying,
    /// Clicking through pages toward a destination
    Traversing,
    /// Destination confirmed and its switch settled
    Arrived,
}

impl NavPhase {
    /// Whether a navigation is in progress
    pub fn is_busy(&self) -> bool {
        matches!(self, NavPhase::Identifying | NavPhase::Traversing)
    }
}

/// Navigator snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavState {
    /// Current phase
    pub phase: NavPhase,
    /// Previous phase (for transition detection)
    pub previous_phase: NavPhase,
    /// Last page seen on screen. May be stale between two probes.
    pub current_page: Option<String>,
    /// Destination of the navigation in progress
    pub destination: Option<String>,
    /// Updates without a phase change
    pub polls_in_phase: u32,
    /// Page switches clicked since creation
    pub page_switches: u32,
    /// Navigations that reached their destination
    pub arrivals: u32,
}

impl Default for NavState {
    fn default() -> Self {
        Self {
            phase: NavPhase::Unknown,
            previous_phase: NavPhase::Unknown,
            current_page: None,
            destination: None,
            polls_in_phase: 0,
            page_switches: 0,
            arrivals: 0,
        }
    }
}

impl NavState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the phase
    pub fn update_phase(&mut self, phase: NavPhase) {
        if phase != self.phase {
            self.previous_phase = self.phase;
            self.phase = phase;
            self.polls_in_phase = 0;
            self.on_transition(self.previous_phase, phase);
        } else {
            self.polls_in_phase += 1;
        }
    }

    fn on_transition(&mut self, from: NavPhase, to: NavPhase) {
        match (from, to) {
            (_, NavPhase::Arrived) => {
                self.arrivals += 1;
                if let Some(destination) = self.destination.take() {
                    self.current_page = Some(destination);
                }
            }
            (NavPhase::Arrived, NavPhase::Identifying) => {
                self.destination = None;
            }
            _ => {}
        }
    }

    /// Record the page last seen
    pub fn set_current_page(&mut self, page: &str) {
        if self.current_page.as_deref() != Some(page) {
            log::debug!("Current page: {}", page);
            self.current_page = Some(page.to_string());
        }
    }

    /// Record a page switch click. A click is progress, so the poll count
    /// restarts.
    pub fn record_switch(&mut self, from: &str) {
        self.set_current_page(from);
        self.page_switches += 1;
        self.polls_in_phase = 0;
    }

    /// Check if a navigation seems stuck (many polls in the same phase)
    pub fn is_stuck(&self, threshold: u32) -> bool {
        self.polls_in_phase > threshold && self.phase.is_busy()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
