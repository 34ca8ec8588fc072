//! Text recognition and keyword matching
//!
//! The OCR model itself is a collaborator behind [`TextRecognizer`]. This
//! module owns what happens to its output: normalisation, comparison against
//! localized [`Keyword`]s and parsing of numbers, counters and durations.

pub mod engine;
pub mod keyword;
pub mod parse;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::vision::Rect;

pub use engine::{similarity, text_matches, Ocr, OcrMatch};
pub use keyword::{parse_name, Keyword, KeywordRegistry};

/// Languages a keyword can be localized into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Simplified Chinese
    Cn,
    /// Traditional Chinese
    Cht,
    /// English
    En,
    /// Japanese
    Jp,
}

impl Lang {
    /// Every language, in lookup order
    pub const ALL: [Lang; 4] = [Lang::Cn, Lang::En, Lang::Jp, Lang::Cht];
}

/// How recognised text is compared with a keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Whole text equals the keyword
    #[default]
    Equal,
    /// Keyword appears somewhere in the text
    Contains,
    /// Text is close enough to the keyword
    Similar,
}

/// One detected line of text
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// Recognised text
    pub text: String,
    /// Bounding box in screenshot coordinates
    pub area: Rect,
    /// Recognition confidence
    pub score: f32,
}

/// OCR backend: detects and recognises text boxes
pub trait TextRecognizer {
    /// Detect text in `image`, restricted to `crop` when given. Returned boxes
    /// are in coordinates of the full image.
    fn detect(&self, image: &RgbaImage, crop: Option<Rect>) -> Vec<TextBox>;
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Box<R> {
    fn detect(&self, image: &RgbaImage, crop: Option<Rect>) -> Vec<TextBox> {
        (**self).detect(image, crop)
    }
}

/// Keyword lookup errors
#[derive(Debug, thiserror::Error)]
pub enum KeywordError {
    #[error("Cannot find a keyword that matches \"{0}\"")]
    NotFound(String),
    #[error("Keyword \"{0}\" is already registered")]
    Duplicate(String),
}
