//! UI page graph navigation
//!
//! Screens are [`Page`]s in a [`PageGraph`], joined by buttons. The
//! [`Navigator`] identifies the current page, walks the graph towards a
//! destination and drives multi-state [`Switch`]es, draining popups on the
//! way.

pub mod navigator;
pub mod page;
pub mod popup;
pub mod state;
pub mod switch;

use std::time::Duration;

use crate::device::DeviceError;
use crate::vision::LocateError;

pub use navigator::Navigator;
pub use page::{Page, PageGraph, PageId, Route};
pub use popup::Popups;
pub use state::{NavPhase, NavState};
pub use switch::{Switch, SwitchState};

/// Navigation errors
#[derive(Debug, thiserror::Error)]
pub enum UiError {
    #[error("Game is not running")]
    NotRunning,
    #[error("Unknown ui page")]
    PageUnknown,
    #[error("Switch {switch} received an invalid state {state}")]
    InvalidSwitchState { switch: String, state: String },
    #[error("Invalid navigation request: {0}")]
    Configuration(String),
    #[error("Switch {switch} failed to reach state {state}, its assets may be outdated")]
    StaleAssetSuspected { switch: String, state: String },
    #[error("{operation} did not finish within {budget:?}")]
    Timeout {
        operation: String,
        budget: Duration,
    },
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Device(#[from] DeviceError),
}
