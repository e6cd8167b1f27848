//! Coordinate conversion between editor space and PDF space
//!
//! The editor places fields with the origin at the top-left corner and Y
//! growing downward. PDF user space has the origin at the bottom-left corner
//! and Y growing upward.

/// Left padding applied to text inside its field box
pub const TEXT_PADDING_X: f64 = 5.0;

/// Offset from the vertical middle of the box down to the text baseline
pub const TEXT_BASELINE_DROP: f64 = 5.0;

/// Native Y of the bottom edge of a box authored at top-left `y` with `height`
pub fn native_y(page_height: f64, y: f64, height: f64) -> f64 {
    page_height - y - height
}

/// Baseline origin for a single line of text inside a field box
pub fn text_origin(page_height: f64, x: f64, y: f64, height: f64) -> (f64, f64) {
    let bottom = native_y(page_height, y, height);
    (x + TEXT_PADDING_X, bottom + height / 2.0 - TEXT_BASELINE_DROP)
}

/// Lower-left corner of an image scaled to fill a field box
pub fn image_origin(page_height: f64, x: f64, y: f64, height: f64) -> (f64, f64) {
    (x, native_y(page_height, y, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_y_letter_page() {
        // 40pt tall box, 100pt from the top of a Letter page
        assert_eq!(native_y(792.0, 100.0, 40.0), 652.0);
    }

    #[test]
    fn test_box_at_top_touches_top_edge() {
        let bottom = native_y(792.0, 0.0, 50.0);
        assert_eq!(bottom + 50.0, 792.0);
    }

    #[test]
    fn test_box_at_bottom_touches_origin() {
        assert_eq!(native_y(842.0, 800.0, 42.0), 0.0);
    }

    #[test]
    fn test_text_origin_offsets() {
        let (x, y) = text_origin(792.0, 50.0, 100.0, 30.0);
        assert_eq!(x, 55.0);
        // bottom = 662, middle = 677, baseline = 672
        assert_eq!(y, 672.0);
    }

    #[test]
    fn test_image_origin_is_box_corner() {
        assert_eq!(image_origin(600.0, 12.0, 100.0, 50.0), (12.0, 450.0));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = f64> {
        1.0f64..2000.0
    }

    proptest! {
        /// Converting twice returns the authored top-left Y
        #[test]
        fn native_y_is_an_involution(
            page_h in dimension(),
            y in 0.0f64..2000.0,
            h in dimension(),
        ) {
            let bottom = native_y(page_h, y, h);
            let back = native_y(page_h, bottom, h);
            prop_assert!((back - y).abs() < 1e-9);
        }

        /// A box inside the page stays inside the page after conversion
        #[test]
        fn boxes_inside_page_stay_inside(
            page_h in dimension(),
            y_pct in 0.0f64..=1.0,
            h_pct in 0.0f64..=1.0,
        ) {
            let h = page_h * h_pct;
            let y = (page_h - h) * y_pct;
            let bottom = native_y(page_h, y, h);
            prop_assert!(bottom >= -1e-9);
            prop_assert!(bottom + h <= page_h + 1e-9);
        }

        /// Text sits a fixed distance from the box middle
        #[test]
        fn text_baseline_relative_to_middle(
            page_h in dimension(),
            x in 0.0f64..1000.0,
            y in 0.0f64..1000.0,
            h in dimension(),
        ) {
            let (tx, ty) = text_origin(page_h, x, y, h);
            let middle = page_h - y - h / 2.0;
            prop_assert!((tx - x - TEXT_PADDING_X).abs() < 1e-9);
            prop_assert!((middle - ty - TEXT_BASELINE_DROP).abs() < 1e-6);
        }
    }
}
