//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the largest size that fits inside `bound` while keeping the
/// source aspect ratio.
///
/// Returns `None` when the source already fits: images are only ever
/// scaled down, never up.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `bound` - Maximum allowed dimensions (width, height)
///
/// # Examples
/// ```
/// # use upload_optimizer::imaging::calculate_fit_dimensions;
/// // 2000x1500 into an 800x800 box → width is the limiting edge
/// assert_eq!(calculate_fit_dimensions((2000, 1500), (800, 800)), Some((800, 600)));
///
/// // Already small enough
/// assert_eq!(calculate_fit_dimensions((640, 480), (800, 800)), None);
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), bound: (u32, u32)) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bound;

    if src_w <= max_w && src_h <= max_h {
        return None;
    }
    if src_w == 0 || src_h == 0 {
        return None;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    Some((w, h))
}

/// Bounding box used for the resize decision.
///
/// Uploads already under the field's gentle-compression threshold get
/// twice the configured dimensions as headroom.
pub fn resize_bound(max_size: [u32; 2], gentle: bool) -> (u32, u32) {
    let [w, h] = max_size;
    if gentle {
        (w.saturating_mul(2), h.saturating_mul(2))
    } else {
        (w, h)
    }
}

/// Cap the width at `max_width`, scaling the height by the same ratio
/// (truncated). Returns `None` if the width is already within the cap.
pub fn calculate_width_cap(source: (u32, u32), max_width: u32) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    if src_w <= max_width {
        return None;
    }
    let ratio = max_width as f64 / src_w as f64;
    let h = ((src_h as f64 * ratio) as u32).max(1);
    Some((max_width, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_fit_dimensions
    // =========================================================================

    #[test]
    fn fit_landscape_into_square() {
        assert_eq!(
            calculate_fit_dimensions((2000, 1500), (800, 800)),
            Some((800, 600))
        );
    }

    #[test]
    fn fit_portrait_into_square() {
        assert_eq!(
            calculate_fit_dimensions((1500, 2000), (800, 800)),
            Some((600, 800))
        );
    }

    #[test]
    fn fit_preserves_aspect_within_rounding() {
        let (w, h) = calculate_fit_dimensions((3000, 2000), (800, 800)).unwrap();
        assert_eq!((w, h), (800, 533));
        let ratio_in = 3000.0 / 2000.0;
        let ratio_out = w as f64 / h as f64;
        assert!((ratio_in - ratio_out).abs() < 0.01);
    }

    #[test]
    fn fit_only_height_over_bound() {
        assert_eq!(
            calculate_fit_dimensions((700, 1000), (800, 800)),
            Some((560, 800))
        );
    }

    #[test]
    fn fit_non_square_bound() {
        // 1920x1080 into 1280x720 is an exact 2/3 scale
        assert_eq!(
            calculate_fit_dimensions((1920, 1080), (1280, 720)),
            Some((1280, 720))
        );
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(calculate_fit_dimensions((400, 300), (800, 800)), None);
        assert_eq!(calculate_fit_dimensions((800, 800), (800, 800)), None);
    }

    #[test]
    fn fit_extreme_aspect_keeps_one_pixel() {
        assert_eq!(
            calculate_fit_dimensions((10000, 2), (800, 800)),
            Some((800, 1))
        );
    }

    // =========================================================================
    // resize_bound
    // =========================================================================

    #[test]
    fn bound_standard() {
        assert_eq!(resize_bound([800, 600], false), (800, 600));
    }

    #[test]
    fn bound_gentle_doubles() {
        assert_eq!(resize_bound([800, 600], true), (1600, 1200));
    }

    #[test]
    fn bound_gentle_saturates() {
        assert_eq!(resize_bound([u32::MAX, 10], true), (u32::MAX, 20));
    }

    // =========================================================================
    // calculate_width_cap
    // =========================================================================

    #[test]
    fn width_cap_scales_height_down() {
        assert_eq!(calculate_width_cap((3840, 2160), 1920), Some((1920, 1080)));
    }

    #[test]
    fn width_cap_truncates_height() {
        // 999 * (1920 / 2500) = 767.232
        assert_eq!(calculate_width_cap((2500, 999), 1920), Some((1920, 767)));
    }

    #[test]
    fn width_cap_leaves_narrow_images() {
        assert_eq!(calculate_width_cap((1920, 5000), 1920), None);
        assert_eq!(calculate_width_cap((640, 480), 1920), None);
    }
}
