//! OCR wrapper
//!
//! Wraps a [`TextRecognizer`] and turns raw text boxes into keyword matches.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use similar::TextDiff;

use super::keyword::parse_name;
use super::{Keyword, KeywordRegistry, MatchMode, TextBox, TextRecognizer};
use crate::config::settings::OcrSettings;
use crate::vision::Rect;

/// A text box that was resolved to a keyword
#[derive(Debug, Clone, PartialEq)]
pub struct OcrMatch {
    pub keyword: Arc<Keyword>,
    /// Text as recognised
    pub text: String,
    /// Bounding box in screenshot coordinates
    pub area: Rect,
    pub score: f32,
}

impl fmt::Display for OcrMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword)
    }
}

/// Sequence similarity of two strings in `0.0..=1.0`: twice the matching
/// characters over the total length of both
pub fn similarity(a: &str, b: &str) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    TextDiff::from_chars(a, b).ratio()
}

/// Compare one recognised text with one keyword text
pub fn text_matches(text: &str, keyword: &str, mode: MatchMode, threshold: f32) -> bool {
    match mode {
        MatchMode::Equal => text == keyword,
        MatchMode::Contains => text.contains(keyword),
        MatchMode::Similar => similarity(text, keyword) >= threshold,
    }
}

/// OCR engine wrapper
pub struct Ocr {
    recognizer: Box<dyn TextRecognizer>,
    settings: OcrSettings,
}

impl Ocr {
    /// Create a new OCR wrapper
    pub fn new(recognizer: impl TextRecognizer + 'static, settings: OcrSettings) -> Self {
        Self {
            recognizer: Box::new(recognizer),
            settings,
        }
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }

    fn normalize(&self, text: &str) -> String {
        if self.settings.ignore_punctuation {
            parse_name(text)
        } else {
            text.to_string()
        }
    }

    /// Detect text boxes, dropping empty ones
    pub fn detect(&self, image: &RgbaImage, crop: Option<Rect>) -> Vec<TextBox> {
        let results: Vec<TextBox> = self
            .recognizer
            .detect(image, crop)
            .into_iter()
            .filter(|b| !b.text.trim().is_empty())
            .collect();

        log::debug!(
            "OCR {}: {}",
            crop.map(|c| c.to_string()).unwrap_or_else(|| "full screen".into()),
            results
                .iter()
                .map(|b| b.text.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        results
    }

    /// Read an area as one line, boxes joined left to right
    pub fn single_line(&self, image: &RgbaImage, area: Rect) -> String {
        let mut boxes = self.detect(image, Some(area));
        boxes.sort_by_key(|b| (b.area.x1, b.area.y1));
        boxes
            .into_iter()
            .map(|b| b.text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Every box matching `keyword` under `mode`
    pub fn match_keyword(
        &self,
        image: &RgbaImage,
        crop: Option<Rect>,
        keyword: &Arc<Keyword>,
        mode: MatchMode,
    ) -> Vec<OcrMatch> {
        let candidates = keyword.keywords_to_find(self.settings.lang, self.settings.ignore_punctuation);
        let matches: Vec<OcrMatch> = self
            .detect(image, crop)
            .into_iter()
            .filter(|b| {
                let text = self.normalize(&b.text);
                candidates
                    .iter()
                    .any(|c| text_matches(&text, c, mode, self.settings.similar_threshold))
            })
            .map(|b| OcrMatch {
                keyword: keyword.clone(),
                text: b.text,
                area: b.area,
                score: b.score,
            })
            .collect();

        if !matches.is_empty() {
            log::debug!(
                "<{}> matched: {}",
                keyword.name,
                matches.iter().map(|m| m.text.as_str()).collect::<Vec<_>>().join(", ")
            );
        }
        matches
    }

    /// Resolve every detected box against the registry. Boxes that match no
    /// keyword are dropped, as are purely numeric texts when configured.
    pub fn matched_ocr(
        &self,
        image: &RgbaImage,
        crop: Option<Rect>,
        registry: &KeywordRegistry,
    ) -> Vec<OcrMatch> {
        self.detect(image, crop)
            .into_iter()
            .filter(|b| !(self.settings.ignore_digit && b.text.chars().all(|c| c.is_ascii_digit())))
            .filter_map(|b| {
                let keyword = registry
                    .find(&b.text, self.settings.lang, self.settings.ignore_punctuation)
                    .ok()?;
                Some(OcrMatch {
                    keyword,
                    text: b.text,
                    area: b.area,
                    score: b.score,
                })
            })
            .collect()
    }
}
