//! Resolution normalisation
//!
//! Maps a target recorded at one resolution onto the current screen.

use crate::config::settings::Border;

use super::{Point, Rect, Target};

/// Current screen layout: resolution plus optional window border
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    /// Current screen width
    pub width: u32,
    /// Current screen height
    pub height: u32,
    /// Decoration applied when aspect ratios differ
    pub border: Border,
}

impl ScreenGeometry {
    /// Create a new screen geometry
    pub fn new(width: u32, height: u32, border: Border) -> Self {
        Self {
            width,
            height,
            border,
        }
    }

    /// The window has a border when its aspect ratio differs from the one
    /// the template was recorded at
    pub fn has_border(&self, recorded: (u32, u32)) -> bool {
        u64::from(self.width) * u64::from(recorded.1) != u64::from(recorded.0) * u64::from(self.height)
    }

    fn border_for(&self, target: &Target) -> Border {
        if self.has_border(target.resolution()) {
            self.border
        } else {
            Border {
                top: 0,
                side: 0,
                bottom: 0,
            }
        }
    }

    /// Client area without decoration
    fn client_size(&self, border: Border) -> (f32, f32) {
        (
            self.width.saturating_sub(border.side * 2) as f32,
            self.height.saturating_sub(border.top + border.bottom) as f32,
        )
    }

    /// Scale factor from the template resolution to the screen
    pub fn ratio(&self, target: &Target) -> f32 {
        let (_, client_h) = self.client_size(self.border_for(target));
        client_h / target.resolution().1.max(1) as f32
    }

    /// Size of the target on the current screen
    pub fn scaled_size(&self, target: &Target) -> (f32, f32) {
        let ratio = self.ratio(target);
        let (w, h) = target.template().dimensions();
        (w as f32 * ratio, h as f32 * ratio)
    }

    /// Area the target occupies on the current screen
    pub fn area(&self, target: &Target) -> Rect {
        let border = self.border_for(target);
        let (screen_w, screen_h) = self.client_size(border);
        let (half_w, half_h) = {
            let (w, h) = self.scaled_size(target);
            (w / 2.0, h / 2.0)
        };
        let (rx, ry) = target.record_pos();

        // Both offsets are in units of screen width
        let cx = screen_w / 2.0 + rx * screen_w + border.side as f32;
        let cy = screen_h / 2.0 + ry * screen_w + border.top as f32;

        Rect::new(
            (cx - half_w).round() as i32,
            (cy - half_h).round() as i32,
            (cx + half_w).round() as i32,
            (cy + half_h).round() as i32,
        )
    }

    /// Resolve a swipe vector. Components within `[-1, 1]` are fractions of
    /// the screen, anything else is already in pixels.
    pub fn scale_vector(&self, vector: (f32, f32)) -> Point {
        if vector.0.abs() <= 1.0 && vector.1.abs() <= 1.0 {
            Point::new(
                (vector.0 * self.width as f32) as i32,
                (vector.1 * self.height as f32) as i32,
            )
        } else {
            Point::new(vector.0 as i32, vector.1 as i32)
        }
    }

    /// Whole screen as a rectangle
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn target(w: u32, h: u32) -> Target {
        Target::image("t", RgbaImage::new(w, h))
    }

    #[test]
    fn test_ratio_scaling() {
        // 1280x720 reference -> 2560x1440 actual
        let geometry = ScreenGeometry::new(2560, 1440, Border::default());
        let t = target(100, 50);
        assert!((geometry.ratio(&t) - 2.0).abs() < f32::EPSILON);
        assert_eq!(geometry.scaled_size(&t), (200.0, 100.0));
    }

    #[test]
    fn test_centred_area() {
        let geometry = ScreenGeometry::new(1280, 720, Border::default());
        let area = geometry.area(&target(100, 50));
        assert_eq!(area, Rect::new(590, 335, 690, 385));
        assert_eq!(area.center(), Point::new(640, 360));
    }

    #[test]
    fn test_record_pos_is_in_screen_widths() {
        let geometry = ScreenGeometry::new(1280, 720, Border::default());
        let area = geometry.area(&target(100, 50).at(0.25, 0.1));
        // 0.25 * 1280 = 320 right, 0.1 * 1280 = 128 down
        assert_eq!(area.center(), Point::new(960, 488));
    }

    #[test]
    fn test_border_applies_on_aspect_mismatch() {
        let border = Border::default();
        let geometry = ScreenGeometry::new(1286, 754, border);
        assert!(geometry.has_border((1280, 720)));

        let t = target(100, 50);
        // Client area is 1280x720 once the border is removed
        assert!((geometry.ratio(&t) - 1.0).abs() < f32::EPSILON);
        let area = geometry.area(&t);
        assert_eq!(area.center(), Point::new(640 + 3, 360 + 32));
    }

    #[test]
    fn test_scale_vector() {
        let geometry = ScreenGeometry::new(1000, 500, Border::default());
        assert_eq!(geometry.scale_vector((0.5, -0.2)), Point::new(500, -100));
        assert_eq!(geometry.scale_vector((30.0, 40.0)), Point::new(30, 40));
    }
}
