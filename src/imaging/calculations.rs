//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Width-over-height ratio of a source image, captured once when the image
/// is loaded.
///
/// Derived dimensions are always computed from this original ratio, never
/// from a previously derived width/height pair, so repeated edits cannot
/// drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio(f64);

impl AspectRatio {
    /// Ratio of `width / height`. Returns `None` if either side is zero.
    ///
    /// # Examples
    /// ```
    /// # use qrsize::imaging::AspectRatio;
    /// let r = AspectRatio::from_dimensions(1000, 500).unwrap();
    /// assert_eq!(r.value(), 2.0);
    /// assert!(AspectRatio::from_dimensions(0, 500).is_none());
    /// ```
    pub fn from_dimensions(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self(width as f64 / height as f64))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Height that keeps this ratio for the given width: `round(width / r)`.
    ///
    /// Clamped to at least 1 so extreme ratios still yield a drawable size.
    pub fn height_for_width(self, width: u32) -> u32 {
        round_to_pixels(width as f64 / self.0)
    }

    /// Width that keeps this ratio for the given height: `round(height * r)`.
    pub fn width_for_height(self, height: u32) -> u32 {
        round_to_pixels(height as f64 * self.0)
    }
}

/// Round half away from zero, then clamp into `1..=u32::MAX`.
fn round_to_pixels(value: f64) -> u32 {
    value.round().clamp(1.0, u32::MAX as f64) as u32
}

/// Calculate dimensions that fit entirely inside `bounds` while keeping the
/// source aspect ratio (CSS `object-fit: contain`).
///
/// One dimension matches the bounds exactly, the other is equal or smaller.
///
/// # Arguments
/// * `source` - Source image dimensions (width, height)
/// * `bounds` - Box to fit into (width, height)
pub fn calculate_contain_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (box_w, box_h) = bounds;

    let src_aspect = src_w as f64 / src_h as f64;
    let box_aspect = box_w as f64 / box_h as f64;

    if src_aspect > box_aspect {
        // Source is wider: width fills, height shrinks
        let w = box_w;
        let h = round_to_pixels(w as f64 / src_aspect).min(box_h);
        (w, h)
    } else {
        // Source is taller (or same): height fills, width shrinks
        let h = box_h;
        let w = round_to_pixels(h as f64 * src_aspect).min(box_w);
        (w, h)
    }
}

/// Offset that centers an `inner` extent inside an `outer` extent.
///
/// Returns 0 when `inner` is not smaller than `outer`.
pub fn center_offset(outer: u32, inner: u32) -> u32 {
    outer.saturating_sub(inner) / 2
}

/// Layout of a square module grid rendered into a square canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleLayout {
    /// Pixels per module edge.
    pub scale: u32,
    /// Canvas edge length in pixels.
    pub canvas: u32,
    /// Offset of the grid's top-left corner from the canvas edge.
    pub offset: u32,
}

/// Calculate how a `modules`×`modules` grid is drawn onto a `size`×`size`
/// canvas with whole-pixel modules.
///
/// Modules are scaled by the largest integer that fits, with a minimum of
/// one pixel; the grid is centered. If even one pixel per module does not
/// fit, the canvas grows to the grid size.
pub fn calculate_module_layout(modules: u32, size: u32) -> ModuleLayout {
    let scale = (size / modules.max(1)).max(1);
    let grid = modules * scale;
    let canvas = size.max(grid);
    ModuleLayout {
        scale,
        canvas,
        offset: center_offset(canvas, grid),
    }
}
