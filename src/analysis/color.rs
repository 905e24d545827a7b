use image::RgbImage;
use statrs::statistics::Statistics;

use crate::{
    image_utils::{rgb_to_hsv, round3},
    mask::Mask,
};

/// Channel spread that maps to a full color score.
const SPREAD_NORMALIZER: f64 = 50.0;

/// Mean of the per-channel HSV standard deviations over masked pixels,
/// scaled by 1/50 and capped at 1.0.
///
/// `image` and `mask` must share dimensions; `FeatureExtractor::analyze` checks this.
pub(crate) fn color_score(image: &RgbImage, mask: &Mask) -> f64 {
    let mut channels: [Vec<f64>; 3] = Default::default();

    for (x, y, inside) in mask.iter() {
        if !inside {
            continue;
        }
        let hsv = rgb_to_hsv(image.get_pixel(x, y));
        for (values, v) in channels.iter_mut().zip(hsv) {
            values.push(v as f64);
        }
    }

    if channels[0].is_empty() {
        return 0.0;
    }

    let mean_std = channels
        .iter()
        .map(|values| values.population_std_dev())
        .sum::<f64>()
        / 3.0;

    round3((mean_std / SPREAD_NORMALIZER).min(1.0))
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_uniform_color_scores_zero() {
        let image = RgbImage::from_pixel(10, 10, Rgb([120, 60, 30]));
        let mask = Mask::from_fn(10, 10, |x, y| x > 2 && y > 2);
        assert_eq!(color_score(&image, &mask), 0.0);
    }

    #[test]
    fn test_empty_mask_scores_zero() {
        let image = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 30) as u8, (y * 30) as u8, 0]));
        assert_eq!(color_score(&image, &Mask::new(8, 8)), 0.0);
    }

    #[test]
    fn test_two_tone_value_spread() {
        // black and white halves: only V varies, std = 127.5
        let image = RgbImage::from_fn(10, 2, |x, _| {
            if x < 5 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let mask = Mask::from_fn(10, 2, |_, _| true);
        // (0 + 0 + 127.5) / 3 / 50 = 0.85
        assert_eq!(color_score(&image, &mask), 0.85);
    }

    #[test]
    fn test_only_masked_pixels_count() {
        let image = RgbImage::from_fn(10, 2, |x, _| {
            if x < 5 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let mask = Mask::from_fn(10, 2, |x, _| x < 5);
        assert_eq!(color_score(&image, &mask), 0.0);
    }

    #[test]
    fn test_multicolor_clamps_to_one() {
        let palette = [Rgb([255, 0, 0]), Rgb([0, 0, 255]), Rgb([0, 0, 0]), Rgb([255, 255, 255])];
        let image = RgbImage::from_fn(8, 8, |x, y| palette[((x + y) % 4) as usize]);
        let mask = Mask::from_fn(8, 8, |_, _| true);
        let score = color_score(&image, &mask);
        assert!(score > 0.9 && score <= 1.0, "score {score}");
    }
}
