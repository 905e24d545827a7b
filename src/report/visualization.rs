use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{BresenhamLineIter, draw_filled_rect_mut},
    point::Point,
    rect::Rect,
};

use crate::{analysis::border::largest_external_contour, mask::Mask};

#[derive(Debug, Clone)]
pub struct VisualizationConfig {
    pub highlight_color: Rgb<u8>,
    pub outline_color: Rgb<u8>,
    /// Weight of the highlight color in masked pixels, clamped to `[0, 1]`.
    pub overlay_opacity: f64,
    pub border_thickness: u32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            highlight_color: Rgb([0, 0, 255]),
            outline_color: Rgb([255, 255, 255]),
            overlay_opacity: 0.6,
            border_thickness: 2,
        }
    }
}

pub struct Visualizer {
    config: VisualizationConfig,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            config: VisualizationConfig::default(),
        }
    }

    pub fn with_config(mut config: VisualizationConfig) -> Self {
        config.overlay_opacity = if config.overlay_opacity.is_nan() {
            VisualizationConfig::default().overlay_opacity
        } else {
            config.overlay_opacity.clamp(0.0, 1.0)
        };
        Self { config }
    }

    /// Tints the masked pixels and outlines the largest external contour.
    /// Works on a copy; `original` is left untouched.
    pub fn render_overlay(&self, original: &RgbImage, mask: &Mask) -> RgbImage {
        let mut vis = original.clone();

        self.draw_mask_filled(&mut vis, mask);

        if let Some(contour) = largest_external_contour(mask) {
            self.draw_closed_polyline(&mut vis, &contour.points, self.config.outline_color);
        }

        vis
    }

    fn draw_mask_filled(&self, image: &mut RgbImage, mask: &Mask) {
        let opacity = self.config.overlay_opacity;
        let color = self.config.highlight_color;
        let (width, height) = image.dimensions();

        for (x, y, inside) in mask.iter() {
            if !inside || x >= width || y >= height {
                continue;
            }
            let original = image.get_pixel(x, y);
            let blended = Rgb([
                ((1.0 - opacity) * original[0] as f64 + opacity * color[0] as f64) as u8,
                ((1.0 - opacity) * original[1] as f64 + opacity * color[1] as f64) as u8,
                ((1.0 - opacity) * original[2] as f64 + opacity * color[2] as f64) as u8,
            ]);
            image.put_pixel(x, y, blended);
        }
    }

    fn draw_closed_polyline(&self, image: &mut RgbImage, points: &[Point<i32>], color: Rgb<u8>) {
        match points {
            [] => {}
            [p] => self.stamp(image, p.x, p.y, color),
            _ => {
                for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
                    let start = (a.x as f32, a.y as f32);
                    let end = (b.x as f32, b.y as f32);
                    let line = BresenhamLineIter::new(start, end);
                    for (x, y) in line {
                        self.stamp(image, x, y, color);
                    }
                }
            }
        }
    }

    /// Square brush `border_thickness` pixels wide; clipped at the image edge.
    fn stamp(&self, image: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
        let thickness = self.config.border_thickness.max(1);
        let half = ((thickness - 1) / 2) as i32;
        draw_filled_rect_mut(
            image,
            Rect::at(x - half, y - half).of_size(thickness, thickness),
            color,
        );
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
