//! Constrained image resizing: layout math plus a resize-encode job with
//! guaranteed stream cleanup.
//!
//! The geometry half (`boxmath`, `layout`, `instructions`, `color`, `query`)
//! is pure and `no_std` compatible. The `std` half drives a decoder, a
//! rasterizer and an encoder through one job per call and releases every
//! stream and buffer it touched, in a fixed order, however the call ends.
//!
//! # Modules
//!
//! - [`boxmath`]: scale-to-fit, fits-inside, centering, rounding
//! - [`layout`]: copy rect, target rect and canvas from a source size and [`Instructions`]
//! - [`instructions`]: fit/scale modes, output format, quality, background
//! - [`job`]: [`ImageBuilder`] and the job lifecycle
//! - [`codec`]: decoder, rasterizer, encoder and file system interfaces
//!
//! # Example
//!
//! ```
//! use zenresize::{FitMode, Instructions, Size, layout};
//!
//! let instructions = Instructions::new().with_size(12, 34)?.with_mode(FitMode::Crop);
//! let plan = layout(Size::new(100, 100), &instructions);
//! assert_eq!(plan.canvas, Size::new(12, 34));
//! assert_eq!(plan.copy_rect.width, 35.0);
//! # Ok::<(), zenresize::ValidationError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(any(feature = "alloc", test))]
extern crate alloc;

pub mod boxmath;
pub mod color;
pub mod instructions;
pub mod layout;
#[cfg(feature = "query")]
pub mod query;

#[cfg(feature = "std")]
pub mod codec;
#[cfg(feature = "codecs")]
pub mod codecs;
#[cfg(feature = "std")]
pub mod encode;
#[cfg(feature = "std")]
pub mod error;
#[cfg(feature = "std")]
pub mod job;
#[cfg(feature = "std")]
pub mod options;
#[cfg(feature = "std")]
pub mod pixels;
#[cfg(feature = "std")]
pub mod raster;
#[cfg(feature = "std")]
pub mod stream;

pub use boxmath::{RectF, Size, SizeF};
pub use instructions::{
    CanvasColor, DEFAULT_QUALITY, FitMode, Instructions, OutputFormat, ScaleMode, ValidationError,
};
pub use layout::{LayoutResult, layout};

#[cfg(feature = "std")]
pub use codec::Filter;
#[cfg(feature = "std")]
pub use error::{Error, Result};
#[cfg(feature = "std")]
pub use job::{Built, ImageBuilder, Stage};
#[cfg(feature = "std")]
pub use options::BuildOptions;
#[cfg(feature = "std")]
pub use pixels::PixelBuffer;
#[cfg(feature = "std")]
pub use stream::IoHandle;
