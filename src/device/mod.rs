//! Device abstraction
//!
//! The crate never talks to a window, emulator or phone directly. A
//! [`Device`] captures the screen and injects input; everything above it is
//! platform independent.

use std::time::Duration;

use image::RgbaImage;

use crate::vision::Point;

/// Screen capture and input injection
pub trait Device {
    /// Take a screenshot. Errors are treated as a transient "no frame" by the
    /// locator (locked screen, minimised window).
    fn capture(&mut self) -> Result<RgbaImage, DeviceError>;

    /// Current resolution of the target window or screen
    fn resolution(&self) -> (u32, u32);

    /// Tap or click at a screen position
    fn click(&mut self, pos: Point) -> Result<(), DeviceError>;

    /// Press at `from`, drag to `to`, release
    fn swipe(&mut self, from: Point, to: Point, duration: Duration) -> Result<(), DeviceError> {
        let _ = (from, to, duration);
        Err(DeviceError::Unsupported("swipe"))
    }

    /// Whether the target window is in front of every other window
    fn is_foreground(&self) -> bool {
        true
    }

    /// Raise the target window
    fn bring_to_foreground(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Whether the target application process is alive
    fn app_is_running(&self) -> bool {
        true
    }
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn capture(&mut self) -> Result<RgbaImage, DeviceError> {
        (**self).capture()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }

    fn click(&mut self, pos: Point) -> Result<(), DeviceError> {
        (**self).click(pos)
    }

    fn swipe(&mut self, from: Point, to: Point, duration: Duration) -> Result<(), DeviceError> {
        (**self).swipe(from, to, duration)
    }

    fn is_foreground(&self) -> bool {
        (**self).is_foreground()
    }

    fn bring_to_foreground(&mut self) -> Result<(), DeviceError> {
        (**self).bring_to_foreground()
    }

    fn app_is_running(&self) -> bool {
        (**self).app_is_running()
    }
}

/// Device errors
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),
    #[error("Input injection failed: {0}")]
    InputFailed(String),
    #[error("Window could not be raised: {0}")]
    Foreground(String),
    #[error("Operation not supported by this device: {0}")]
    Unsupported(&'static str),
}
