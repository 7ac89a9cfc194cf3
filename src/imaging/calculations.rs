//! Pure calculation functions for print-layout geometry.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the scaled dimensions that fit a source inside a target canvas.
///
/// Width-first: scale uniformly so the source spans the full target width;
/// if the resulting height overflows the canvas, scale to the target height
/// instead. The result always fits inside the canvas on both axes and
/// preserves the source aspect ratio — no crop, no distortion.
///
/// # Arguments
/// * `source` - Source image dimensions (width, height)
/// * `target` - Target canvas dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Scaled dimensions, both `<=` the target
pub fn calculate_fit_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    // Fit to width
    let scale = tgt_w as f64 / src_w as f64;
    let fit_h = (src_h as f64 * scale).round() as u32;
    if fit_h <= tgt_h {
        return (tgt_w, fit_h);
    }

    // Overflowed vertically: fit to height instead
    let scale = tgt_h as f64 / src_h as f64;
    let fit_w = (src_w as f64 * scale).round() as u32;
    (fit_w, tgt_h)
}

/// Calculate the top-left offset that centers an inner rectangle on a canvas.
///
/// Integer floor division, so an odd pixel of slack goes to the right/bottom.
/// Callers must guarantee `inner` fits inside `canvas` on both axes.
pub fn calculate_center_offsets(canvas: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
    let (canvas_w, canvas_h) = canvas;
    let (inner_w, inner_h) = inner;
    ((canvas_w - inner_w) / 2, (canvas_h - inner_h) / 2)
}
