use std::f64::consts::PI;

use imageproc::{
    contours::{BorderType, Contour, find_contours},
    point::Point,
};

use crate::{image_utils::round3, mask::Mask};

/// Outermost outer borders of the mask, in raster-scan discovery order.
pub fn external_contours(mask: &Mask) -> Vec<Contour<i32>> {
    find_contours::<i32>(mask.as_gray())
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .collect()
}

/// Absolute polygon area enclosed by the contour points (shoelace).
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64)
        .sum::<f64>();

    (twice_area / 2.0).abs()
}

/// Length of the contour as a closed polyline.
pub fn arc_length(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| {
            let dx = (a.x - b.x) as f64;
            let dy = (a.y - b.y) as f64;
            dx.hypot(dy)
        })
        .sum()
}

/// External contour with the largest enclosed area. On equal areas the
/// contour found first in raster order wins.
pub fn largest_external_contour(mask: &Mask) -> Option<Contour<i32>> {
    let mut best: Option<(f64, Contour<i32>)> = None;

    for contour in external_contours(mask) {
        let area = contour_area(&contour.points);
        match &best {
            Some((best_area, _)) if area <= *best_area => {}
            _ => best = Some((area, contour)),
        }
    }

    best.map(|(_, contour)| contour)
}

/// `1 - circularity` of the largest external contour, where
/// circularity is `4π·area / perimeter²`.
pub fn border_score(mask: &Mask) -> f64 {
    let Some(contour) = largest_external_contour(mask) else {
        return 0.0;
    };

    let area = contour_area(&contour.points);
    let perimeter = arc_length(&contour.points);
    if perimeter == 0.0 {
        return 0.0;
    }

    let circularity = 4.0 * PI * area / (perimeter * perimeter);
    round3(1.0 - circularity)
}
