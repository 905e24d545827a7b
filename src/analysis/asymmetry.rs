use crate::{image_utils::round3, mask::Mask};

/// `1 - IoU` between the mask and its horizontal mirror.
///
/// A mask with no lesion pixels scores 0.0 without being flipped.
pub fn asymmetry_score(mask: &Mask) -> f64 {
    if mask.area() == 0 {
        return 0.0;
    }

    let flipped = mask.flipped_horizontal();
    let mut intersection = 0u64;
    let mut union = 0u64;

    for (x, y, inside) in mask.iter() {
        let mirrored = flipped.get(x, y);
        if inside && mirrored {
            intersection += 1;
        }
        if inside || mirrored {
            union += 1;
        }
    }

    round3(1.0 - intersection as f64 / union as f64)
}
