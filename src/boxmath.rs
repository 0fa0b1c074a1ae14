//! Box geometry used by the layout engine.
//!
//! Everything here works in `f64` so that intermediate results are not
//! rounded until the layout engine decides to. Pure functions, no
//! allocations, `no_std` compatible.
//!
//! Zero or negative denominators are a caller contract violation: the
//! functions do not check for them and will produce non-finite values.
//!
//! # Example
//!
//! ```
//! use zenresize::boxmath::{SizeF, scale_inside};
//!
//! // 2:1 content into a 4:3 box is bound by width.
//! let s = scale_inside(SizeF::new(1000.0, 500.0), SizeF::new(400.0, 300.0));
//! assert_eq!(s, SizeF::new(400.0, 200.0));
//! ```

#[cfg(not(feature = "std"))]
use num_traits::Float;

/// Width × height dimensions in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Convert to floating point.
    pub fn to_f64(self) -> SizeF {
        SizeF::new(self.width as f64, self.height as f64)
    }

    /// Rectangle at the origin covering this size.
    pub fn to_rect(self) -> RectF {
        RectF::new(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

/// Floating-point size, kept unrounded between layout steps.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SizeF {
    pub width: f64,
    pub height: f64,
}

impl SizeF {
    /// Create a new size.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn ratio(self) -> f64 {
        self.width / self.height
    }
}

/// Floating-point rectangle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectF {
    /// Create a new rect.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin with the given size.
    pub fn from_size(size: SizeF) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Size of this rectangle.
    pub fn size(&self) -> SizeF {
        SizeF::new(self.width, self.height)
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Largest size with `inner`'s aspect ratio that fits inside `bounding`.
///
/// When the bounding box is relatively wider than `inner`, height binds;
/// otherwise width binds. Equal ratios return `bounding` unchanged so that
/// an exact match is not perturbed by a division round trip.
pub fn scale_inside(inner: SizeF, bounding: SizeF) -> SizeF {
    let inner_ratio = inner.ratio();
    let outer_ratio = bounding.ratio();
    if outer_ratio > inner_ratio {
        SizeF::new(inner_ratio * bounding.height, bounding.height)
    } else if outer_ratio == inner_ratio {
        bounding
    } else {
        SizeF::new(bounding.width, bounding.width / inner_ratio)
    }
}

/// True when both dimensions of `inner` are ≤ those of `outer`.
pub fn fits_inside(inner: SizeF, outer: SizeF) -> bool {
    inner.width <= outer.width && inner.height <= outer.height
}

/// Rectangle of `size` sharing the center of `bounds`. Not rounded.
pub fn center_inside(size: SizeF, bounds: RectF) -> RectF {
    RectF::new(
        bounds.x + (bounds.width - size.width) / 2.0,
        bounds.y + (bounds.height - size.height) / 2.0,
        size.width,
        size.height,
    )
}

/// Round each component to the nearest integer, halves away from zero.
pub fn round_size(size: SizeF) -> SizeF {
    SizeF::new(size.width.round(), size.height.round())
}

/// Round each component to the nearest integer, halves away from zero.
pub fn round_rect(rect: RectF) -> RectF {
    RectF::new(
        rect.x.round(),
        rect.y.round(),
        rect.width.round(),
        rect.height.round(),
    )
}

/// Round to whole pixels, never below 1×1.
pub fn to_pixels(size: SizeF) -> Size {
    let r = round_size(size);
    Size::new(clamp_dim(r.width), clamp_dim(r.height))
}

fn clamp_dim(v: f64) -> u32 {
    if v >= u32::MAX as f64 {
        u32::MAX
    } else if v >= 1.0 {
        v as u32
    } else {
        // Also covers NaN.
        1
    }
}
