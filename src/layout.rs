//! Layout computation for constrained resize.
//!
//! Given the source dimensions and [`Instructions`], computes which region of
//! the source to sample, where it lands on the output, and how large the
//! output canvas is. Pure geometry: no pixel operations, no allocations,
//! `no_std` compatible.
//!
//! # Example
//!
//! ```
//! use zenresize::{FitMode, Instructions, Size, layout};
//!
//! let inst = Instructions::new().with_size(12, 34)?.with_mode(FitMode::Crop);
//! let l = layout(Size::new(100, 100), &inst);
//!
//! // A centered 35×100 strip of the source fills the whole 12×34 canvas.
//! assert_eq!(l.canvas, Size::new(12, 34));
//! assert_eq!(l.copy_rect.width, 35.0);
//! assert!(!l.needs_padding());
//! # Ok::<(), zenresize::ValidationError>(())
//! ```

use crate::boxmath::{RectF, Size, SizeF, center_inside, fits_inside, scale_inside, to_pixels};
use crate::instructions::{FitMode, Instructions, ScaleMode};

/// Computed layout from applying [`Instructions`] to a source size.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutResult {
    /// Original source dimensions.
    pub source: Size,
    /// Region of the source to sample, in source pixel space.
    pub copy_rect: RectF,
    /// Where the sampled region lands, centered on the canvas.
    pub target_rect: RectF,
    /// Final output dimensions. Both are at least 1.
    pub canvas: Size,
}

impl LayoutResult {
    /// Whether resampling is needed (the copied region changes size).
    pub fn needs_resize(&self) -> bool {
        self.copy_rect.width != self.target_rect.width
            || self.copy_rect.height != self.target_rect.height
    }

    /// Whether part of the canvas is not covered by the image.
    pub fn needs_padding(&self) -> bool {
        self.target_rect.x > 0.0
            || self.target_rect.y > 0.0
            || self.target_rect.right() < self.canvas.width as f64
            || self.target_rect.bottom() < self.canvas.height as f64
    }

    /// Whether only part of the source is sampled.
    pub fn needs_crop(&self) -> bool {
        self.copy_rect != self.source.to_rect()
    }

    /// Target size in whole pixels.
    pub fn target_size(&self) -> Size {
        to_pixels(self.target_rect.size())
    }
}

/// Compute the layout for a source image of the given dimensions.
///
/// `original` must be non-zero on both axes. The result always has a
/// canvas of at least 1×1 and a target rectangle centered on the canvas.
pub fn layout(original: Size, instructions: &Instructions) -> LayoutResult {
    let source = original.to_f64();
    let source_rect = original.to_rect();

    // Step 1: treat anything below 1 as unset.
    let width = instructions.width().filter(|&w| w >= 1);
    let height = instructions.height().filter(|&h| h >= 1);

    // Step 2: derive a missing axis from the source aspect ratio.
    let ratio = source.ratio();
    let bounds = match (width, height) {
        (None, None) => None,
        (Some(w), Some(h)) => Some(SizeF::new(w as f64, h as f64)),
        (Some(w), None) => Some(SizeF::new(w as f64, w as f64 / ratio)),
        (None, Some(h)) => Some(SizeF::new(h as f64 * ratio, h as f64)),
    };

    let mut copy_rect = source_rect;
    let (mut canvas, mut target) = match bounds {
        // No constraint → native size.
        None => (source, source),
        // Step 3: fit mode.
        Some(bounds) => match instructions.mode() {
            FitMode::Max => {
                let t = scale_inside(source, bounds);
                (t, t)
            }
            FitMode::Pad => (bounds, scale_inside(source, bounds)),
            FitMode::Crop => {
                let region = to_pixels(scale_inside(bounds, source)).to_f64();
                copy_rect = center_inside(region, source_rect);
                (bounds, bounds)
            }
            FitMode::Stretch => (bounds, bounds),
        },
    };

    // Step 4: refuse to enlarge content unless asked to.
    let scale = instructions.scale();
    if scale != ScaleMode::Both && fits_inside(source, target) {
        target = source;
        copy_rect = source_rect;
        if scale != ScaleMode::UpscaleCanvas {
            canvas = target;
        }
    }

    // Step 5: whole pixels, never zero-area.
    let canvas = to_pixels(canvas);
    let target = to_pixels(target);

    // Step 6: center the content.
    let target_rect = center_inside(target.to_f64(), canvas.to_rect());

    LayoutResult {
        source: original,
        copy_rect,
        target_rect,
        canvas,
    }
}
