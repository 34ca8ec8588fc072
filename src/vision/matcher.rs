//! Default matching primitives
//!
//! Normalised cross-correlation on grayscale for template search and an HSV
//! histogram correlation for the cheap color pre-check.

use image::imageops::FilterType;
use image::RgbaImage;
use imageproc::template_matching::{find_extremes, match_template, MatchTemplateMethod};

use super::capture::crop_within;
use super::{ImageMatcher, MatchRequest, Rect};

/// Hue bins (OpenCV 8-bit convention, hue halved into 0..180)
const HUE_BINS: usize = 180;
/// Saturation bins
const SAT_BINS: usize = 256;

/// Template matcher backed by `imageproc`
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    /// Extra pixels searched around a target's area
    search_margin: i32,
    /// Minimum histogram correlation for `color_similar`
    color_threshold: f32,
}

impl TemplateMatcher {
    /// Create a new template matcher
    pub fn new() -> Self {
        Self {
            search_margin: 20,
            color_threshold: 0.9,
        }
    }

    /// Set the margin searched around a target's area
    pub fn with_search_margin(mut self, margin: i32) -> Self {
        self.search_margin = margin;
        self
    }

    /// Set the color similarity threshold
    pub fn with_color_threshold(mut self, threshold: f32) -> Self {
        self.color_threshold = threshold;
        self
    }

    fn scaled_template(template: &RgbaImage, scale: f32) -> Option<RgbaImage> {
        let (w, h) = template.dimensions();
        let sw = (w as f32 * scale).round() as u32;
        let sh = (h as f32 * scale).round() as u32;
        if sw == 0 || sh == 0 {
            return None;
        }
        if (sw, sh) == (w, h) {
            return Some(template.clone());
        }
        Some(image::imageops::resize(template, sw, sh, FilterType::Triangle))
    }
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageMatcher for TemplateMatcher {
    fn find(&self, request: &MatchRequest<'_>) -> Option<Rect> {
        let (screen_w, screen_h) = request.screen.dimensions();
        let search_area = match request.region {
            Some(region) => region
                .pad(self.search_margin)
                .intersect(&Rect::new(0, 0, screen_w as i32, screen_h as i32))?,
            None => Rect::new(0, 0, screen_w as i32, screen_h as i32),
        };

        let template = Self::scaled_template(request.template, request.scale)?;
        let search = crop_within(request.screen, search_area)?;

        let (tw, th) = template.dimensions();
        let (sw, sh) = search.dimensions();
        if tw > sw || th > sh {
            log::debug!(
                "<{}> template {}x{} larger than search area {}x{}",
                request.name,
                tw,
                th,
                sw,
                sh
            );
            return None;
        }

        let search_gray = image::imageops::grayscale(&search);
        let template_gray = image::imageops::grayscale(&template);
        let scores = match_template(
            &search_gray,
            &template_gray,
            MatchTemplateMethod::CrossCorrelationNormalized,
        );
        let extremes = find_extremes(&scores);

        log::debug!(
            "<{}> best score {:.3} at {:?}",
            request.name,
            extremes.max_value,
            extremes.max_value_location
        );

        if extremes.max_value.is_nan() || extremes.max_value < request.threshold {
            return None;
        }

        let (mx, my) = extremes.max_value_location;
        Some(Rect::from_xywh(
            search_area.x1 + mx as i32,
            search_area.y1 + my as i32,
            tw as i32,
            th as i32,
        ))
    }

    fn color_similar(&self, template: &RgbaImage, region: &RgbaImage) -> bool {
        let similarity = histogram_correlation(&hs_histogram(template), &hs_histogram(region));
        similarity >= self.color_threshold
    }
}

/// Convert RGB to OpenCV-style 8-bit hue (0..180) and saturation (0..256)
fn rgb_to_hs(r: u8, g: u8, b: u8) -> (usize, usize) {
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let hue = if hue < 0.0 { hue + 360.0 } else { hue };

    (
        ((hue / 2.0).round() as usize).min(HUE_BINS - 1),
        (saturation.round() as usize).min(SAT_BINS - 1),
    )
}

/// 2-D hue/saturation histogram normalised to 0..1
fn hs_histogram(image: &RgbaImage) -> Vec<f32> {
    let mut hist = vec![0f32; HUE_BINS * SAT_BINS];
    for pixel in image.pixels() {
        let (h, s) = rgb_to_hs(pixel[0], pixel[1], pixel[2]);
        hist[h * SAT_BINS + s] += 1.0;
    }

    let max = hist.iter().copied().fold(0f32, f32::max);
    let min = hist.iter().copied().fold(f32::MAX, f32::min);
    let range = max - min;
    if range > 0.0 {
        for v in &mut hist {
            *v = (*v - min) / range;
        }
    }
    hist
}

/// Pearson correlation of two histograms
fn histogram_correlation(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len()) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean_a = a.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let mean_b = b.iter().map(|&v| f64::from(v)).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let dx = f64::from(x) - mean_a;
        let dy = f64::from(y) - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return if a == b { 1.0 } else { 0.0 };
    }
    (cov / denom) as f32
}
