//! Built-in separable resampler.
//!
//! Samples the copy rectangle of the source, scales it into the target
//! rectangle, and composites the result over the canvas background.
//! Work happens in premultiplied `f32` so transparent edges do not bleed
//! color. Taps outside the copy region clamp to its edge pixels.

use crate::boxmath::RectF;
use crate::codec::{Filter, Rasterizer};
use crate::error::RenderError;
use crate::instructions::CanvasColor;
use crate::layout::LayoutResult;
use crate::pixels::{BYTES_PER_PIXEL, PixelBuffer};

/// Largest canvas the resampler will allocate, in pixels.
const MAX_CANVAS_PIXELS: u64 = 1 << 30;

impl Filter {
    /// Kernel radius at 1:1 scale.
    fn support(self) -> f64 {
        match self {
            Filter::Nearest => 0.5,
            Filter::Bilinear => 1.0,
            Filter::Bicubic => 2.0,
        }
    }

    fn weight(self, x: f64) -> f64 {
        let ax = x.abs();
        match self {
            Filter::Nearest => {
                if ax < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Filter::Bilinear => (1.0 - ax).max(0.0),
            Filter::Bicubic => mitchell(ax),
        }
    }
}

/// Mitchell-Netravali, B = C = 1/3.
fn mitchell(ax: f64) -> f64 {
    const B: f64 = 1.0 / 3.0;
    const C: f64 = 1.0 / 3.0;
    if ax < 1.0 {
        ((12.0 - 9.0 * B - 6.0 * C) * ax * ax * ax
            + (-18.0 + 12.0 * B + 6.0 * C) * ax * ax
            + (6.0 - 2.0 * B))
            / 6.0
    } else if ax < 2.0 {
        ((-B - 6.0 * C) * ax * ax * ax
            + (6.0 * B + 30.0 * C) * ax * ax
            + (-12.0 * B - 48.0 * C) * ax
            + (8.0 * B + 24.0 * C))
            / 6.0
    } else {
        0.0
    }
}

/// The built-in [`Rasterizer`].
#[derive(Copy, Clone, Debug, Default)]
pub struct Resampler;

impl Rasterizer for Resampler {
    fn render(
        &self,
        source: &PixelBuffer,
        layout: &LayoutResult,
        background: CanvasColor,
        filter: Filter,
    ) -> Result<PixelBuffer, RenderError> {
        let expected = PixelBuffer::byte_len(source.width(), source.height());
        if source.as_bytes().len() != expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: source.as_bytes().len(),
            });
        }
        let canvas = layout.canvas;
        if canvas.width as u64 * canvas.height as u64 > MAX_CANVAS_PIXELS {
            return Err(RenderError::CanvasTooLarge {
                width: canvas.width,
                height: canvas.height,
            });
        }

        let bg = premultiply(background.to_rgba());
        let mut out = PixelBuffer::filled(canvas.width, canvas.height, background.to_rgba());
        if source.width() == 0 || source.height() == 0 {
            return Ok(out);
        }

        let target = Placement::of(&layout.target_rect);
        if target.width == 0 || target.height == 0 {
            return Ok(out);
        }
        let scaled = match aligned_copy(source, &layout.copy_rect, &target) {
            Some(pixels) => pixels,
            None => resample(source, &layout.copy_rect, target.width, target.height, filter),
        };

        let cw = canvas.width as i64;
        let ch = canvas.height as i64;
        let data = out.as_bytes_mut();
        for ty in 0..target.height {
            let cy = target.y + ty as i64;
            if cy < 0 || cy >= ch {
                continue;
            }
            for tx in 0..target.width {
                let cx = target.x + tx as i64;
                if cx < 0 || cx >= cw {
                    continue;
                }
                let s = (ty * target.width + tx) * 4;
                let px = [scaled[s], scaled[s + 1], scaled[s + 2], scaled[s + 3]];
                let d = (cy * cw + cx) as usize * BYTES_PER_PIXEL;
                data[d..d + 4].copy_from_slice(&unpremultiply(over(px, bg)));
            }
        }
        Ok(out)
    }
}

/// Target rectangle snapped to whole canvas pixels.
struct Placement {
    x: i64,
    y: i64,
    width: usize,
    height: usize,
}

impl Placement {
    fn of(r: &RectF) -> Self {
        let x = r.x.round();
        let y = r.y.round();
        Self {
            x: x as i64,
            y: y as i64,
            width: ((r.right().round() - x).max(0.0)) as usize,
            height: ((r.bottom().round() - y).max(0.0)) as usize,
        }
    }
}

/// Premultiplied pixels of `copy` when it is pixel-aligned, inside the
/// source, and the same size as the target. Mitchell does not interpolate,
/// so unscaled copies skip the filter.
fn aligned_copy(src: &PixelBuffer, copy: &RectF, target: &Placement) -> Option<Vec<f32>> {
    let whole = |v: f64| v.fract() == 0.0 && v >= 0.0;
    if !(whole(copy.x) && whole(copy.y))
        || copy.width != target.width as f64
        || copy.height != target.height as f64
        || copy.right() > src.width() as f64
        || copy.bottom() > src.height() as f64
    {
        return None;
    }
    let (x0, y0) = (copy.x as usize, copy.y as usize);
    let mut out = Vec::with_capacity(target.width * target.height * 4);
    for y in 0..target.height {
        let line = src.row((y0 + y) as u32);
        for x in 0..target.width {
            let i = (x0 + x) * 4;
            out.extend_from_slice(&premultiply_slice(&line[i..i + 4]));
        }
    }
    Some(out)
}

/// Filter taps for one output sample.
struct Taps {
    start: usize,
    weights: Vec<f32>,
}

/// Compute taps mapping `dst_len` outputs onto `[src_start, src_start +
/// src_len)`, clamping every tap to pixel indices `lo..=hi`.
fn taps(dst_len: usize, src_start: f64, src_len: f64, lo: usize, hi: usize, filter: Filter) -> Vec<Taps> {
    let scale = src_len / dst_len as f64;
    let blur = scale.max(1.0);
    let support = filter.support() * blur;
    let clamp = |k: i64| k.clamp(lo as i64, hi as i64) as usize;

    (0..dst_len)
        .map(|i| {
            // Pixel k covers [k, k + 1) and samples at k + 0.5.
            let center = src_start + (i as f64 + 0.5) * scale;
            let first = (center - support - 0.5).floor() as i64;
            let last = (center + support - 0.5).ceil() as i64;
            let start = clamp(first);
            let mut weights = vec![0.0f64; clamp(last) - start + 1];
            for k in first..=last {
                let w = filter.weight((k as f64 + 0.5 - center) / blur);
                weights[clamp(k) - start] += w;
            }
            let sum: f64 = weights.iter().sum();
            if sum.abs() < 1e-12 {
                // Kernel missed every pixel; take the nearest one.
                let nearest = clamp(center.floor() as i64);
                return Taps {
                    start: nearest,
                    weights: vec![1.0],
                };
            }
            Taps {
                start,
                weights: weights.iter().map(|w| (w / sum) as f32).collect(),
            }
        })
        .collect()
}

/// Index range of pixels the region `[start, start + len)` touches.
fn pixel_span(start: f64, len: f64, size: u32) -> (usize, usize) {
    let max = size as i64 - 1;
    let lo = (start.floor() as i64).clamp(0, max);
    let hi = ((start + len).ceil() as i64 - 1).clamp(lo, max);
    (lo as usize, hi as usize)
}

/// Resample `copy` from `src` to `dw × dh` premultiplied RGBA `f32`.
fn resample(src: &PixelBuffer, copy: &RectF, dw: usize, dh: usize, filter: Filter) -> Vec<f32> {
    let (x_lo, x_hi) = pixel_span(copy.x, copy.width, src.width());
    let (y_lo, y_hi) = pixel_span(copy.y, copy.height, src.height());
    let x_taps = taps(dw, copy.x, copy.width, x_lo, x_hi, filter);
    let y_taps = taps(dh, copy.y, copy.height, y_lo, y_hi, filter);

    // Horizontal pass over the rows the copy region touches.
    let rows = y_hi - y_lo + 1;
    let mut horiz = vec![0.0f32; rows * dw * 4];
    for r in 0..rows {
        let line = src.row((y_lo + r) as u32);
        for (x, t) in x_taps.iter().enumerate() {
            let mut acc = [0.0f32; 4];
            for (j, &w) in t.weights.iter().enumerate() {
                let p = premultiply_slice(&line[(t.start + j) * 4..(t.start + j) * 4 + 4]);
                for c in 0..4 {
                    acc[c] += p[c] * w;
                }
            }
            horiz[(r * dw + x) * 4..(r * dw + x) * 4 + 4].copy_from_slice(&acc);
        }
    }

    // Vertical pass.
    let mut out = vec![0.0f32; dw * dh * 4];
    for (y, t) in y_taps.iter().enumerate() {
        for x in 0..dw {
            let mut acc = [0.0f32; 4];
            for (j, &w) in t.weights.iter().enumerate() {
                let i = ((t.start - y_lo + j) * dw + x) * 4;
                for c in 0..4 {
                    acc[c] += horiz[i + c] * w;
                }
            }
            // Negative lobes can push values out of range.
            let a = acc[3].clamp(0.0, 1.0);
            let o = (y * dw + x) * 4;
            for c in 0..3 {
                out[o + c] = acc[c].clamp(0.0, a);
            }
            out[o + 3] = a;
        }
    }
    out
}

fn premultiply(rgba: [u8; 4]) -> [f32; 4] {
    premultiply_slice(&rgba)
}

fn premultiply_slice(p: &[u8]) -> [f32; 4] {
    let a = p[3] as f32 / 255.0;
    [
        p[0] as f32 / 255.0 * a,
        p[1] as f32 / 255.0 * a,
        p[2] as f32 / 255.0 * a,
        a,
    ]
}

/// Porter-Duff source-over on premultiplied colors.
fn over(src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
    let k = 1.0 - src[3];
    [
        src[0] + dst[0] * k,
        src[1] + dst[1] * k,
        src[2] + dst[2] * k,
        src[3] + dst[3] * k,
    ]
}

fn unpremultiply(p: [f32; 4]) -> [u8; 4] {
    let a = p[3];
    if a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let q = |v: f32| ((v / a).clamp(0.0, 1.0) * 255.0).round() as u8;
    [q(p[0]), q(p[1]), q(p[2]), (a.clamp(0.0, 1.0) * 255.0).round() as u8]
}
