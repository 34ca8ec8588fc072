//! Screenshot cropping

use image::{ImageBuffer, Rgba, RgbaImage};

use super::Rect;

/// Crop an area out of a screenshot.
///
/// Parts of the area outside the screenshot are filled with opaque black, so
/// the result is always exactly `area.width() x area.height()`.
pub fn crop(image: &RgbaImage, area: Rect) -> RgbaImage {
    let width = area.width().max(0) as u32;
    let height = area.height().max(0) as u32;
    let mut out: RgbaImage = ImageBuffer::from_pixel(width, height, Rgba([0, 0, 0, 255]));

    let (img_w, img_h) = image.dimensions();
    let bounds = Rect::new(0, 0, img_w as i32, img_h as i32);
    let Some(visible) = area.intersect(&bounds) else {
        return out;
    };

    let inside = image::imageops::crop_imm(
        image,
        visible.x1 as u32,
        visible.y1 as u32,
        visible.width() as u32,
        visible.height() as u32,
    )
    .to_image();
    image::imageops::replace(
        &mut out,
        &inside,
        i64::from(visible.x1 - area.x1),
        i64::from(visible.y1 - area.y1),
    );

    out
}

/// Crop an area that is already known to lie inside the screenshot
pub fn crop_within(image: &RgbaImage, area: Rect) -> Option<RgbaImage> {
    let (img_w, img_h) = image.dimensions();
    let bounds = Rect::new(0, 0, img_w as i32, img_h as i32);
    let visible = area.intersect(&bounds)?;
    Some(
        image::imageops::crop_imm(
            image,
            visible.x1 as u32,
            visible.y1 as u32,
            visible.width() as u32,
            visible.height() as u32,
        )
        .to_image(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(w: u32, h: u32) -> RgbaImage {
        ImageBuffer::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn test_crop_inside() {
        let cropped = crop(&white(10, 10), Rect::new(2, 2, 6, 5));
        assert_eq!(cropped.dimensions(), (4, 3));
        assert!(cropped.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_crop_pads_outside_with_black() {
        let cropped = crop(&white(10, 10), Rect::new(-2, 8, 3, 12));
        assert_eq!(cropped.dimensions(), (5, 4));
        // Top-right corner maps to (2, 8) inside the image
        assert_eq!(cropped.get_pixel(4, 0).0, [255, 255, 255, 255]);
        // Left of the image
        assert_eq!(cropped.get_pixel(0, 0).0, [0, 0, 0, 255]);
        // Below the image
        assert_eq!(cropped.get_pixel(4, 3).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_crop_fully_outside() {
        let cropped = crop(&white(10, 10), Rect::new(20, 20, 23, 23));
        assert_eq!(cropped.dimensions(), (3, 3));
        assert!(cropped.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_crop_within_clamps() {
        let cropped = crop_within(&white(10, 10), Rect::new(5, 5, 20, 20)).unwrap();
        assert_eq!(cropped.dimensions(), (5, 5));
        assert!(crop_within(&white(10, 10), Rect::new(12, 12, 20, 20)).is_none());
    }
}
