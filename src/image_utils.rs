use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{LesionError, Result};

/// Channel order of an interleaved 3-channel pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorOrder {
    Rgb,
    Bgr,
}

/// Builds an RGB image from a raw interleaved buffer, swapping channels
/// when the buffer is BGR. Everything downstream works on RGB.
pub fn to_rgb_image(raw: &[u8], width: u32, height: u32, order: ColorOrder) -> Result<RgbImage> {
    let expected = width as usize * height as usize * 3;
    if raw.len() != expected {
        return Err(LesionError::InvalidParameter(format!(
            "Buffer holds {} bytes, {}x{} RGB needs {}",
            raw.len(),
            width,
            height,
            expected
        )));
    }

    let data = match order {
        ColorOrder::Rgb => raw.to_vec(),
        ColorOrder::Bgr => raw
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect(),
    };

    RgbImage::from_raw(width, height, data)
        .ok_or_else(|| LesionError::InvalidParameter("Buffer does not match dimensions".into()))
}

pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let lum = (0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64)
            .round()
            .min(255.0) as u8;
        gray.put_pixel(x, y, Luma([lum]));
    }

    gray
}

/// 8-bit HSV: hue in `0..180` (degrees halved), saturation and value in `0..=255`.
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> [u8; 3] {
    let r = pixel[0] as f64;
    let g = pixel[1] as f64;
    let b = pixel[2] as f64;

    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v > 0.0 { 255.0 * delta / v } else { 0.0 };

    let h = if delta == 0.0 {
        0.0
    } else {
        let degrees = if v == r {
            60.0 * (g - b) / delta
        } else if v == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };
        let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };
        degrees / 2.0
    };

    // 359.x degrees rounds up to 180, which wraps back to 0
    let h = h.round() as u32 % 180;

    [h as u8, s.round().min(255.0) as u8, v as u8]
}

/// Rounds half away from zero to three decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgr_buffer_is_swapped() {
        let raw = [10u8, 20, 30, 40, 50, 60];
        let image = to_rgb_image(&raw, 2, 1, ColorOrder::Bgr).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgb([30, 20, 10]));
        assert_eq!(image.get_pixel(1, 0), &Rgb([60, 50, 40]));

        let image = to_rgb_image(&raw, 2, 1, ColorOrder::Rgb).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let result = to_rgb_image(&[0u8; 5], 2, 1, ColorOrder::Rgb);
        assert!(matches!(result, Err(LesionError::InvalidParameter(_))));
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(rgb_to_hsv(&Rgb([255, 0, 0])), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 255, 0])), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 255])), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([128, 128, 128])), [0, 0, 128]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 0])), [0, 0, 0]);
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.12345), 0.123);
        assert_eq!(round3(0.9996), 1.0);
        assert_eq!(round3(0.0), 0.0);
    }
}
