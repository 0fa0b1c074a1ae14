//! Collaborator interfaces used by [`ImageBuilder`](crate::ImageBuilder).
//!
//! The builder owns no codec or resampling logic of its own. It drives a
//! [`Decoder`], a [`Rasterizer`] and an [`Encoder`], and reaches the file
//! system through [`FileSystem`]. Every trait is object-safe so each can be
//! swapped independently.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::Path;

use crate::error::{DecodeError, EncodeError, RenderError};
use crate::instructions::CanvasColor;
use crate::layout::LayoutResult;
use crate::pixels::{DecodedImage, PixelBuffer};

/// Hints passed to the decoder.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeHints {
    /// Skip embedded ICC profiles.
    pub ignore_icc: bool,
}

/// Decodes an encoded stream into pixels.
pub trait Decoder {
    fn decode(
        &self,
        source: &mut dyn Read,
        hints: &DecodeHints,
    ) -> Result<DecodedImage, DecodeError>;
}

/// Interpolation kernel used when resampling.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Mitchell-Netravali bicubic.
    #[default]
    Bicubic,
    /// Tent filter.
    Bilinear,
    /// Box filter; nearest neighbor when upscaling.
    Nearest,
}

/// Draws the copy region of a source buffer into a new canvas.
///
/// `layout.copy_rect` is sampled from `source`, scaled into
/// `layout.target_rect`, and every canvas pixel outside the target is
/// filled with `background`.
pub trait Rasterizer {
    fn render(
        &self,
        source: &PixelBuffer,
        layout: &LayoutResult,
        background: CanvasColor,
        filter: Filter,
    ) -> Result<PixelBuffer, RenderError>;
}

/// Encodes pixels to in-memory JPEG or PNG bytes.
pub trait Encoder {
    /// Encode as baseline JPEG. `quality` is within `0..=100`; alpha is
    /// discarded.
    fn encode_jpeg(&self, pixels: &PixelBuffer, quality: u8) -> Result<Vec<u8>, EncodeError>;

    /// Encode as 8-bit RGBA PNG.
    fn encode_png(&self, pixels: &PixelBuffer) -> Result<Vec<u8>, EncodeError>;
}

/// A readable, seekable stream.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// File system access used by the path-based build operations.
pub trait FileSystem {
    /// Open an existing file for reading.
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>>;

    /// Open a file for writing, creating it if missing.
    fn open_write(&self, path: &Path, truncate: bool) -> io::Result<Box<dyn Write>>;

    /// Create `dir` and any missing ancestors.
    fn ensure_directory(&self, dir: &Path) -> io::Result<()>;

    /// Whether two paths name the same file.
    ///
    /// Paths are canonicalized when both exist; otherwise they are compared
    /// as given.
    fn same_file(&self, a: &Path, b: &Path) -> bool {
        match (fs::canonicalize(a), fs::canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => a == b,
        }
    }
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>> {
        Ok(Box::new(File::open(path)?))
    }

    fn open_write(&self, path: &Path, truncate: bool) -> io::Result<Box<dyn Write>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(truncate)
            .open(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn ensure_directory(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }
}
