//! Error types for resize jobs.
//!
//! Collaborator failures keep their own type ([`DecodeError`],
//! [`RenderError`], [`EncodeError`]) and are wrapped unmodified by [`Error`].

use std::io;

use thiserror::Error;

use crate::instructions::ValidationError;

/// The decoder could not produce an image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The data is not in a format the decoder handles.
    #[error("unsupported or unrecognized image format")]
    UnsupportedFormat,

    /// The data is corrupt or truncated.
    #[error("malformed image: {0}")]
    Malformed(String),

    /// The decoder reported a zero width or height.
    #[error("decoded image has zero width or height")]
    EmptyImage,

    /// Reading the source failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The rasterizer could not produce a destination buffer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The source buffer is inconsistent with its declared dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize {
        /// Bytes required by the dimensions.
        expected: usize,
        /// Bytes present.
        actual: usize,
    },

    /// The canvas would not fit in memory.
    #[error("canvas {width}x{height} is too large")]
    CanvasTooLarge { width: u32, height: u32 },
}

/// The encoder could not produce output bytes.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The format cannot represent these dimensions.
    #[error("{format} cannot encode {width}x{height}")]
    DimensionsUnsupported {
        format: &'static str,
        width: u32,
        height: u32,
    },

    /// The codec library failed.
    #[error("{format} encoder failed: {message}")]
    Codec {
        format: &'static str,
        message: String,
    },
}

/// Error from a resize job.
#[derive(Debug, Error)]
pub enum Error {
    /// Instructions were out of range.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Decoding the source failed.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Rendering the destination buffer failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Encoding the output failed.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Stream or filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type for resize jobs.
pub type Result<T, E = Error> = core::result::Result<T, E>;
