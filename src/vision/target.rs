//! Targets: things the locator can search for

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::ocr::{Keyword, MatchMode};

/// Where to search for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Only inside the target's recorded area
    #[default]
    Area,
    /// Anywhere on screen
    FullScreen,
}

/// How a target is recognised
#[derive(Debug, Clone, PartialEq)]
pub enum TargetKind {
    /// Pixel template matching against the template image
    Image,
    /// OCR inside the target's area, compared against a keyword
    Text { keyword: Arc<Keyword>, mode: MatchMode },
}

/// Immutable description of something to find on screen.
///
/// The template image doubles as the size reference for the target's area,
/// even for text targets. `record_pos` is the offset of the template centre
/// from the screen centre, in units of screen width, recorded at `resolution`.
#[derive(Clone)]
pub struct Target {
    name: String,
    image: Arc<RgbaImage>,
    record_pos: (f32, f32),
    resolution: (u32, u32),
    color_sensitive: bool,
    scope: SearchScope,
    threshold: Option<f32>,
    kind: TargetKind,
}

impl Target {
    /// Default resolution templates are recorded at
    pub const DEFAULT_RESOLUTION: (u32, u32) = (1280, 720);

    /// Create an image target
    pub fn image(name: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            name: name.into(),
            image: Arc::new(image),
            record_pos: (0.0, 0.0),
            resolution: Self::DEFAULT_RESOLUTION,
            color_sensitive: false,
            scope: SearchScope::Area,
            threshold: None,
            kind: TargetKind::Image,
        }
    }

    /// Create a keyword-backed text target
    pub fn text(
        name: impl Into<String>,
        image: RgbaImage,
        keyword: Arc<Keyword>,
        mode: MatchMode,
    ) -> Self {
        Self {
            kind: TargetKind::Text { keyword, mode },
            ..Self::image(name, image)
        }
    }

    /// Load the template from disk, naming the target after the file stem
    pub fn open(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgba8();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::image(name, image))
    }

    /// Set the recorded position
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.record_pos = (x, y);
        self
    }

    /// Set the resolution the template was recorded at
    pub fn recorded_at(mut self, width: u32, height: u32) -> Self {
        self.resolution = (width, height);
        self
    }

    /// Require the screen region to pass the color check first
    pub fn color_sensitive(mut self, enabled: bool) -> Self {
        self.color_sensitive = enabled;
        self
    }

    /// Set where to search
    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Override the matcher threshold for this target
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Turn into a text target
    pub fn with_keyword(mut self, keyword: Arc<Keyword>, mode: MatchMode) -> Self {
        self.kind = TargetKind::Text { keyword, mode };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &RgbaImage {
        &self.image
    }

    pub fn record_pos(&self) -> (f32, f32) {
        self.record_pos
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn is_color_sensitive(&self) -> bool {
        self.color_sensitive
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub fn threshold(&self) -> Option<f32> {
        self.threshold
    }

    pub fn kind(&self) -> &TargetKind {
        &self.kind
    }

    /// Keyword of a text target
    pub fn keyword(&self) -> Option<&Arc<Keyword>> {
        match &self.kind {
            TargetKind::Text { keyword, .. } => Some(keyword),
            TargetKind::Image => None,
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("size", &self.image.dimensions())
            .field("record_pos", &self.record_pos)
            .field("resolution", &self.resolution)
            .field("color_sensitive", &self.color_sensitive)
            .field("scope", &self.scope)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
