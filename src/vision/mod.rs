//! Screen search
//!
//! Describes things to look for ([`Target`]), how they map onto the current
//! screen ([`ScreenGeometry`]), the pluggable matching primitives
//! ([`ImageMatcher`]) and the polling engine that ties them together
//! ([`Locator`]).

pub mod capture;
pub mod geometry;
pub mod locator;
pub mod matcher;
pub mod target;

use std::fmt;
use std::time::Duration;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::device::DeviceError;

pub use geometry::ScreenGeometry;
pub use locator::{Locator, SwipePoint};
pub use matcher::TemplateMatcher;
pub use target::{SearchScope, Target, TargetKind};

/// Screen position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Shift by a vector
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis aligned rectangle given by its upper left and lower right corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle from an origin and a size
    pub const fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x < self.x2 && p.y >= self.y1 && p.y < self.y2
    }

    /// Grow (positive) or shrink (negative) on every side
    pub fn pad(&self, pad: i32) -> Self {
        Self::new(self.x1 - pad, self.y1 - pad, self.x2 + pad, self.y2 + pad)
    }

    /// Move by a vector
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Overlap of two rectangles, `None` if they do not overlap
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.x1.max(other.x1),
            self.y1.max(other.y1),
            self.x2.min(other.x2),
            self.y2.min(other.y2),
        );
        (!r.is_empty()).then_some(r)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// One template search
#[derive(Debug, Clone, Copy)]
pub struct MatchRequest<'a> {
    /// Target name, for logging
    pub name: &'a str,
    /// Template at its recorded resolution
    pub template: &'a RgbaImage,
    /// Full screenshot
    pub screen: &'a RgbaImage,
    /// Restrict the search to this area, `None` for the whole screen
    pub region: Option<Rect>,
    /// Factor from template resolution to screen resolution
    pub scale: f32,
    /// Minimum confidence
    pub threshold: f32,
}

/// Raw image matching primitives
pub trait ImageMatcher {
    /// Find the template on screen, returning the matched rectangle
    fn find(&self, request: &MatchRequest<'_>) -> Option<Rect>;

    /// Cheap check whether a screen region has roughly the template's colors
    fn color_similar(&self, template: &RgbaImage, region: &RgbaImage) -> bool;
}

impl<M: ImageMatcher + ?Sized> ImageMatcher for Box<M> {
    fn find(&self, request: &MatchRequest<'_>) -> Option<Rect> {
        (**self).find(request)
    }

    fn color_similar(&self, template: &RgbaImage, region: &RgbaImage) -> bool {
        (**self).color_similar(template, region)
    }
}

/// Screen search errors
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("Target <{target}> not found on screen in {timeout:?}")]
    TargetNotFound { target: String, timeout: Duration },
    #[error("Invalid operation: {0}")]
    Configuration(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
}
