//! UI Pilot - screen-driven navigation for game automation
//!
//! This library finds things on a live screen and walks a graph of known
//! screens toward a destination. It is built from two layers:
//!
//! - [`vision::Locator`] polls screenshots for a [`vision::Target`] (image
//!   template, color-checked region or OCR keyword) until it shows up or a
//!   timeout expires, raising a covered window once before giving up.
//! - [`ui::Navigator`] identifies the current [`ui::Page`], clicks along the
//!   shortest path to a destination, drains popups and settles
//!   [`ui::Switch`]es.
//!
//! Screen capture and input, raw image matching and OCR are collaborators
//! behind the [`device::Device`], [`vision::ImageMatcher`] and
//! [`ocr::TextRecognizer`] traits.
//!
//! ## Anti-Detection
//!
//! The `stealth` module picks a random point inside each located button and
//! adds variance to the delay between repeated touches.

pub mod config;
pub mod device;
pub mod ocr;
pub mod stealth;
pub mod timer;
pub mod ui;
pub mod vision;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, GraphSpec, Settings};
pub use device::{Device, DeviceError};
pub use ocr::{Keyword, KeywordRegistry, MatchMode, TextRecognizer};
pub use timer::{Clock, ManualClock, SystemClock, Timer};
pub use ui::{Navigator, Page, PageGraph, PageId, Switch, UiError};
pub use vision::{ImageMatcher, LocateError, Locator, Point, Rect, Target, TemplateMatcher};
