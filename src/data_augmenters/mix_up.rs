//! Mix-up augmentation primitives: image blending and annotation merging.

use image::RgbImage;
use ndarray::{concatenate, Axis};

use crate::common_structs::Annotation;
use crate::error::{Error, Result};

/// Pixel-wise linear blend of two equally sized RGB images.
/// `ratio` is the weight of `b`; 0.5 averages the two.
pub fn blend(a: &RgbImage, b: &RgbImage, ratio: f32) -> Result<RgbImage> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::BlendSize(a.width(), a.height(), b.width(), b.height()));
    }
    let mut out = RgbImage::new(a.width(), a.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let pa = a.get_pixel(x, y);
        let pb = b.get_pixel(x, y);
        for c in 0..3 {
            pixel[c] = (pa[c] as f32 * (1.0 - ratio) + pb[c] as f32 * ratio).round() as u8;
        }
    }
    Ok(out)
}

/// Row-stacks the ground-truth fields of two annotations. The ignore sets of
/// `a` are kept as-is; `b`'s are intentionally not merged.
pub fn mix_annotations(mut a: Annotation, b: &Annotation) -> Annotation {
    a.rboxes = concatenate![Axis(0), a.rboxes, b.rboxes];
    a.hboxes = concatenate![Axis(0), a.hboxes, b.hboxes];
    a.polys = concatenate![Axis(0), a.polys, b.polys];
    a.labels = concatenate![Axis(0), a.labels, b.labels];
    a
}
