//! Oriented-box geometry.

use ndarray::Array2;

/// Converts oriented boxes (n, 5: cx, cy, w, h, angle in radians) into
/// axis-aligned boxes (n, 4: xmin, ymin, xmax, ymax) and polygon corners
/// (n, 8: x0, y0, ..., x3, y3).
///
/// Corner order before rotation is top-left, top-right, bottom-right,
/// bottom-left. An empty input yields empty outputs.
pub fn rotated_boxes_to_aligned(rboxes: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let n = rboxes.nrows();
    let mut hboxes = Array2::zeros((n, 4));
    let mut polys = Array2::zeros((n, 8));

    for (i, rbox) in rboxes.outer_iter().enumerate() {
        let (cx, cy, w, h, angle) = (rbox[0], rbox[1], rbox[2], rbox[3], rbox[4]);
        let (sin, cos) = angle.sin_cos();
        let offsets = [
            (-w / 2.0, -h / 2.0),
            (w / 2.0, -h / 2.0),
            (w / 2.0, h / 2.0),
            (-w / 2.0, h / 2.0),
        ];

        let (mut xmin, mut ymin) = (f32::INFINITY, f32::INFINITY);
        let (mut xmax, mut ymax) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for (corner, (dx, dy)) in offsets.iter().enumerate() {
            let x = cx + dx * cos - dy * sin;
            let y = cy + dx * sin + dy * cos;
            polys[[i, 2 * corner]] = x;
            polys[[i, 2 * corner + 1]] = y;
            xmin = xmin.min(x);
            ymin = ymin.min(y);
            xmax = xmax.max(x);
            ymax = ymax.max(y);
        }
        hboxes[[i, 0]] = xmin;
        hboxes[[i, 1]] = ymin;
        hboxes[[i, 2]] = xmax;
        hboxes[[i, 3]] = ymax;
    }

    (hboxes, polys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn empty_input_gives_empty_outputs() {
        let rboxes = Array2::<f32>::zeros((0, 5));
        let (hboxes, polys) = rotated_boxes_to_aligned(&rboxes);
        assert_eq!(hboxes.dim(), (0, 4));
        assert_eq!(polys.dim(), (0, 8));
    }

    #[test]
    fn zero_angle_box_is_its_own_hull() {
        let rboxes = array![[10.0, 20.0, 4.0, 2.0, 0.0]];
        let (hboxes, polys) = rotated_boxes_to_aligned(&rboxes);
        assert_abs_diff_eq!(hboxes[[0, 0]], 8.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hboxes[[0, 1]], 19.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hboxes[[0, 2]], 12.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hboxes[[0, 3]], 21.0, epsilon = 1e-5);
        // top-left corner first
        assert_abs_diff_eq!(polys[[0, 0]], 8.0, epsilon = 1e-5);
        assert_abs_diff_eq!(polys[[0, 1]], 19.0, epsilon = 1e-5);
    }

    #[test]
    fn quarter_turn_swaps_extents() {
        let rboxes = array![[10.0, 10.0, 4.0, 2.0, std::f32::consts::FRAC_PI_2]];
        let (hboxes, _polys) = rotated_boxes_to_aligned(&rboxes);
        assert_abs_diff_eq!(hboxes[[0, 0]], 9.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hboxes[[0, 1]], 8.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hboxes[[0, 2]], 11.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hboxes[[0, 3]], 12.0, epsilon = 1e-5);
    }
}
