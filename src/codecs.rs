//! Default PNG and JPEG codecs.
//!
//! [`Codecs`] implements both [`Decoder`] and [`Encoder`] on top of the
//! `png`, `jpeg-decoder` and `jpeg-encoder` crates. The format is sniffed
//! from the leading bytes. Color profiles are not applied, so
//! [`DecodeHints::ignore_icc`] has no effect here.

use std::io::{Cursor, Read};

use crate::codec::{DecodeHints, Decoder, Encoder};
use crate::error::{DecodeError, EncodeError};
use crate::pixels::{DecodedImage, PixelBuffer, PixelFormat};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SOI: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Largest edge baseline JPEG can store.
const JPEG_MAX_DIMENSION: u32 = u16::MAX as u32;

/// PNG and JPEG decoding and encoding.
#[derive(Copy, Clone, Debug, Default)]
pub struct Codecs;

impl Decoder for Codecs {
    fn decode(
        &self,
        source: &mut dyn Read,
        _hints: &DecodeHints,
    ) -> Result<DecodedImage, DecodeError> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;

        let image = if bytes.starts_with(PNG_SIGNATURE) {
            decode_png(&bytes)?
        } else if bytes.starts_with(JPEG_SOI) {
            decode_jpeg(&bytes)?
        } else {
            return Err(DecodeError::UnsupportedFormat);
        };
        if image.pixels.width() == 0 || image.pixels.height() == 0 {
            return Err(DecodeError::EmptyImage);
        }
        Ok(image)
    }
}

fn malformed(e: impl core::fmt::Display) -> DecodeError {
    DecodeError::Malformed(e.to_string())
}

fn decode_png(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(malformed)?;

    let format = {
        let info = reader.info();
        match (info.color_type, info.bit_depth) {
            (png::ColorType::Grayscale, png::BitDepth::Sixteen) => PixelFormat::Gray16,
            (png::ColorType::Grayscale, _) => PixelFormat::Gray8,
            (png::ColorType::GrayscaleAlpha, png::BitDepth::Sixteen) => PixelFormat::GrayAlpha16,
            (png::ColorType::GrayscaleAlpha, _) => PixelFormat::GrayAlpha8,
            (png::ColorType::Rgb, png::BitDepth::Sixteen) => PixelFormat::Rgb16,
            (png::ColorType::Rgb, _) => PixelFormat::Rgb8,
            (png::ColorType::Rgba, png::BitDepth::Sixteen) => PixelFormat::Rgba16,
            (png::ColorType::Rgba, _) => PixelFormat::Rgba8,
            (png::ColorType::Indexed, _) => PixelFormat::Indexed,
        }
    };

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| DecodeError::Malformed("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let frame = reader.next_frame(&mut buf).map_err(malformed)?;
    let data = &buf[..frame.buffer_size()];

    let rgba: Vec<u8> = match frame.color_type {
        png::ColorType::Rgba => data.to_vec(),
        png::ColorType::Rgb => data.chunks_exact(3).flat_map(|p| [p[0], p[1], p[2], 255]).collect(),
        png::ColorType::GrayscaleAlpha => {
            data.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0], p[1]]).collect()
        }
        png::ColorType::Grayscale => data.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::Indexed => {
            return Err(DecodeError::Malformed("palette was not expanded".into()));
        }
    };
    let pixels = PixelBuffer::from_rgba(frame.width, frame.height, rgba)
        .ok_or_else(|| DecodeError::Malformed("PNG frame size mismatch".into()))?;
    Ok(DecodedImage { pixels, format })
}

fn decode_jpeg(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(bytes));
    let data = decoder.decode().map_err(malformed)?;
    let info = decoder
        .info()
        .ok_or_else(|| DecodeError::Malformed("missing JPEG info".into()))?;
    let (width, height) = (info.width as u32, info.height as u32);

    let (rgba, format): (Vec<u8>, _) = match info.pixel_format {
        jpeg_decoder::PixelFormat::RGB24 => (
            data.chunks_exact(3).flat_map(|p| [p[0], p[1], p[2], 255]).collect(),
            PixelFormat::Rgb8,
        ),
        jpeg_decoder::PixelFormat::L8 => (
            data.iter().flat_map(|&g| [g, g, g, 255]).collect(),
            PixelFormat::Gray8,
        ),
        // Big-endian samples; keep the high byte.
        jpeg_decoder::PixelFormat::L16 => (
            data.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0], 255]).collect(),
            PixelFormat::Gray16,
        ),
        jpeg_decoder::PixelFormat::CMYK32 => (
            data.chunks_exact(4).flat_map(cmyk_to_rgba).collect(),
            PixelFormat::Cmyk8,
        ),
    };
    let pixels = PixelBuffer::from_rgba(width, height, rgba)
        .ok_or_else(|| DecodeError::Malformed("JPEG frame size mismatch".into()))?;
    Ok(DecodedImage { pixels, format })
}

/// Naive CMYK to RGB, no profile.
fn cmyk_to_rgba(p: &[u8]) -> [u8; 4] {
    let k = 255 - p[3] as u16;
    let channel = |v: u8| ((255 - v as u16) * k / 255) as u8;
    [channel(p[0]), channel(p[1]), channel(p[2]), 255]
}

impl Encoder for Codecs {
    fn encode_jpeg(&self, pixels: &PixelBuffer, quality: u8) -> Result<Vec<u8>, EncodeError> {
        if pixels.width() > JPEG_MAX_DIMENSION || pixels.height() > JPEG_MAX_DIMENSION {
            return Err(EncodeError::DimensionsUnsupported {
                format: "jpeg",
                width: pixels.width(),
                height: pixels.height(),
            });
        }
        let rgb = pixels.to_rgb();
        let mut out = Vec::new();
        // jpeg-encoder takes 1..=100.
        let encoder = jpeg_encoder::Encoder::new(&mut out, quality.clamp(1, 100));
        encoder
            .encode(
                &rgb,
                pixels.width() as u16,
                pixels.height() as u16,
                jpeg_encoder::ColorType::Rgb,
            )
            .map_err(|e: jpeg_encoder::EncodingError| EncodeError::Codec {
                format: "jpeg",
                message: e.to_string(),
            })?;
        Ok(out)
    }

    fn encode_png(&self, pixels: &PixelBuffer) -> Result<Vec<u8>, EncodeError> {
        let codec_err = |e: png::EncodingError| EncodeError::Codec {
            format: "png",
            message: e.to_string(),
        };
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, pixels.width(), pixels.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().map_err(codec_err)?;
            writer.write_image_data(pixels.as_bytes()).map_err(codec_err)?;
            writer.finish().map_err(codec_err)?;
        }
        Ok(out)
    }
}
