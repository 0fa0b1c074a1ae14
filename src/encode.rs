//! Writing encoded output to a sink.

use std::io::{self, Cursor, Write};

use crate::codec::Encoder;
use crate::error::Result;
use crate::instructions::OutputFormat;
use crate::pixels::PixelBuffer;

/// Encode `pixels` as `format` and write the bytes to `sink`.
///
/// The encoder produces the complete file in memory first, so sinks that
/// cannot seek (sockets, pipes) receive a finished stream. Returns the
/// number of bytes written.
pub fn encode_to(
    encoder: &dyn Encoder,
    pixels: &PixelBuffer,
    format: OutputFormat,
    quality: u8,
    sink: &mut dyn Write,
) -> Result<u64> {
    let bytes = match format {
        OutputFormat::Jpeg => encoder.encode_jpeg(pixels, quality)?,
        OutputFormat::Png => encoder.encode_png(pixels)?,
    };
    let written = io::copy(&mut Cursor::new(bytes), sink)?;
    sink.flush()?;
    Ok(written)
}
