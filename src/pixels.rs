//! Pixel buffers exchanged between the decoder, rasterizer and encoder.
//!
//! Every buffer is 8-bit RGBA with straight (non-premultiplied) alpha,
//! tightly packed: `width × 4` bytes per row, no padding.

use crate::boxmath::Size;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Pixel layout of the encoded source, as reported by the decoder.
///
/// Decoded buffers are always RGBA8; this records what they came from.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Gray8,
    GrayAlpha8,
    Rgb8,
    Rgba8,
    Gray16,
    GrayAlpha16,
    Rgb16,
    Rgba16,
    Indexed,
    Cmyk8,
}

impl PixelFormat {
    /// Whether the source carried an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::GrayAlpha8 | Self::Rgba8 | Self::GrayAlpha16 | Self::Rgba16
        )
    }
}

/// An owned RGBA8 image.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl core::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PixelBuffer {
    /// A buffer filled with a single color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let len = width as usize * height as usize;
        let mut data = Vec::with_capacity(len * BYTES_PER_PIXEL);
        for _ in 0..len {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap existing RGBA8 bytes. Returns `None` if the length does not
    /// match `width × height × 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == Self::byte_len(width, height)).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Expand packed RGB8 bytes to opaque RGBA8.
    pub fn from_rgb(width: u32, height: u32, rgb: &[u8]) -> Option<Self> {
        if rgb.len() != width as usize * height as usize * 3 {
            return None;
        }
        let data = rgb
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect();
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Bytes needed for an RGBA8 image of this size.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Raw RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// One row of RGBA8 bytes.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * BYTES_PER_PIXEL;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Packed RGB8 bytes, alpha dropped.
    pub fn to_rgb(&self) -> Vec<u8> {
        self.data
            .chunks_exact(BYTES_PER_PIXEL)
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect()
    }
}

/// A decoded source image, owned by the job until teardown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// Decoded pixels, normalized to RGBA8.
    pub pixels: PixelBuffer,
    /// Layout of the encoded source.
    pub format: PixelFormat,
}

impl DecodedImage {
    pub fn size(&self) -> Size {
        self.pixels.size()
    }
}
