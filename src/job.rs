//! Resize jobs: acquire, decode, lay out, render, hand off, tear down.
//!
//! [`ImageBuilder`] runs one job per call. A job moves through the
//! [`Stage`]s in order and always releases what it holds, on success, on
//! error and on unwind:
//!
//! 1. If [`BuildOptions::buffer_source`] is set, the source is copied into
//!    memory and, unless it is kept open, closed right away.
//! 2. The (possibly buffered) source is decoded.
//! 3. [`layout`] computes the copy rect, target rect and canvas.
//! 4. The rasterizer renders the destination buffer.
//! 5. Teardown drops the decoded image, then the private buffer, then
//!    closes the source, rewinds it, or leaves it untouched.
//! 6. The consumer receives the rendered buffer.
//! 7. The buffer is dropped unless
//!    [`BuildOptions::preserve_destination_buffer`] was requested.
//!
//! Because the source is released before the consumer runs, a buffered job
//! can write its output over the file it read from.

use core::fmt;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::codec::{DecodeHints, Decoder, Encoder, FileSystem, Filter, Rasterizer, StdFileSystem};
use crate::encode::encode_to;
use crate::error::{DecodeError, Error, Result};
use crate::instructions::Instructions;
use crate::layout::{LayoutResult, layout};
use crate::options::BuildOptions;
use crate::pixels::{DecodedImage, PixelBuffer};
use crate::raster::Resampler;
use crate::stream::{IoHandle, closed_error};

/// Where a job is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Created,
    Acquiring,
    Decoding,
    LayingOut,
    Rendering,
    Consuming,
    Disposing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Created => "created",
            Stage::Acquiring => "acquiring",
            Stage::Decoding => "decoding",
            Stage::LayingOut => "laying-out",
            Stage::Rendering => "rendering",
            Stage::Consuming => "consuming",
            Stage::Disposing => "disposing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        })
    }
}

/// Outcome of a successful build.
#[derive(Debug)]
pub struct Built<T> {
    /// What the consumer returned. For stream and path builds, the number
    /// of encoded bytes written.
    pub value: T,
    /// The layout that was rendered.
    pub layout: LayoutResult,
    /// The destination buffer, if
    /// [`BuildOptions::preserve_destination_buffer`] was set.
    pub preserved: Option<PixelBuffer>,
}

/// Keep the first error. A later failure is logged and dropped when an
/// earlier one is already propagating.
fn first_error<T>(primary: Result<T>, secondary: Result<()>, what: &str) -> Result<T> {
    match (primary, secondary) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
        (Err(e), Err(suppressed)) => {
            warn!(error = %suppressed, "{what} failed while handling an earlier error");
            Err(e)
        }
    }
}

/// A read failure inside the decoder is a source I/O error, the same one
/// buffering would have reported from `read_to_end`.
fn source_error(error: DecodeError) -> Error {
    match error {
        DecodeError::Io(e) => Error::Io(e),
        other => Error::Decode(other),
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    trace!(from = %stage, to = %next, "job stage");
    *stage = next;
}

/// Working state of one build.
struct Job<'a, S: Read + Seek> {
    source: &'a mut IoHandle<S>,
    options: BuildOptions,
    /// Source position at acquisition, recorded only when rewinding.
    origin: Option<u64>,
    buffer: Option<Cursor<Vec<u8>>>,
    image: Option<DecodedImage>,
    stage: Stage,
    torn_down: bool,
}

impl<'a, S: Read + Seek> Job<'a, S> {
    fn new(source: &'a mut IoHandle<S>, options: BuildOptions) -> Self {
        trace!(?options, "job created");
        Self {
            source,
            options,
            origin: None,
            buffer: None,
            image: None,
            stage: Stage::Created,
            torn_down: false,
        }
    }

    /// Acquire, decode, lay out and render.
    fn produce(
        &mut self,
        builder: &ImageBuilder,
        instructions: &Instructions,
    ) -> Result<(PixelBuffer, LayoutResult)> {
        self.acquire()?;

        enter(&mut self.stage, Stage::Decoding);
        let hints = DecodeHints {
            ignore_icc: instructions.ignore_icc(),
        };
        let decoded = match self.buffer.as_mut() {
            Some(buffer) => builder.decoder.decode(buffer, &hints),
            None => builder.decoder.decode(&mut *self.source, &hints),
        }
        .map_err(source_error)?;
        let size = decoded.size();
        if size.width == 0 || size.height == 0 {
            return Err(DecodeError::EmptyImage.into());
        }
        trace!(width = size.width, height = size.height, format = ?decoded.format, "decoded");
        let image = self.image.insert(decoded);

        enter(&mut self.stage, Stage::LayingOut);
        let plan = layout(size, instructions);
        debug!(
            copy = ?plan.copy_rect,
            target = ?plan.target_rect,
            canvas_width = plan.canvas.width,
            canvas_height = plan.canvas.height,
            "layout"
        );

        enter(&mut self.stage, Stage::Rendering);
        let pixels = builder.rasterizer.render(
            &image.pixels,
            &plan,
            instructions.effective_background(),
            builder.filter,
        )?;
        Ok((pixels, plan))
    }

    fn acquire(&mut self) -> Result<()> {
        enter(&mut self.stage, Stage::Acquiring);
        if self.source.is_closed() {
            return Err(closed_error().into());
        }
        if self.options.rewinds_source() {
            self.origin = Some(self.source.stream_position()?);
        }
        if self.options.buffers_source() {
            let mut bytes = Vec::new();
            self.source.read_to_end(&mut bytes)?;
            debug!(bytes = bytes.len(), "buffered source");
            self.buffer = Some(Cursor::new(bytes));
            if !self.options.keeps_source_open() {
                self.source.close();
                debug!("closed source after buffering");
            }
        }
        Ok(())
    }

    /// Release the decoded image, the private buffer, then the source.
    /// Runs at most once.
    fn teardown(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        if self.stage != Stage::Failed {
            enter(&mut self.stage, Stage::Disposing);
        }
        if self.image.take().is_some() {
            debug!("released decoded image");
        }
        if self.buffer.take().is_some() {
            debug!("released source buffer");
        }
        self.release_source()
    }

    fn release_source(&mut self) -> Result<()> {
        if self.source.is_closed() {
            return Ok(());
        }
        if self.options.rewinds_source() {
            if let Some(origin) = self.origin {
                self.source.seek(SeekFrom::Start(origin))?;
                debug!(position = origin, "rewound source");
            }
        } else if !self.options.keeps_source_open() {
            self.source.close();
            debug!("closed source");
        }
        Ok(())
    }

    fn fail(&mut self, error: &Error) {
        debug!(stage = %self.stage, %error, "job failed");
        enter(&mut self.stage, Stage::Failed);
    }
}

impl<S: Read + Seek> Drop for Job<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!(error = %e, "source teardown failed during unwind");
        }
    }
}

/// Runs resize jobs with a fixed set of collaborators.
///
/// ```
/// # #[cfg(feature = "codecs")] {
/// use zenresize::{FitMode, ImageBuilder, Instructions, OutputFormat};
/// use zenresize::pixels::PixelBuffer;
/// use zenresize::codec::Encoder as _;
/// use zenresize::codecs::Codecs;
///
/// let png = Codecs.encode_png(&PixelBuffer::filled(100, 100, [0, 0, 255, 255])).unwrap();
/// let instructions = Instructions::new()
///     .with_size(12, 34).unwrap()
///     .with_mode(FitMode::Crop)
///     .with_format(OutputFormat::Png);
/// let out = ImageBuilder::new().build_bytes(&png, &instructions).unwrap();
/// assert!(out.starts_with(b"\x89PNG"));
/// # }
/// ```
pub struct ImageBuilder {
    decoder: Box<dyn Decoder>,
    rasterizer: Box<dyn Rasterizer>,
    encoder: Box<dyn Encoder>,
    filesystem: Box<dyn FileSystem>,
    filter: Filter,
}

impl fmt::Debug for ImageBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuilder")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "codecs")]
impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    /// Builder using the bundled PNG/JPEG codecs.
    #[cfg(feature = "codecs")]
    pub fn new() -> Self {
        Self::with_codecs(crate::codecs::Codecs, crate::codecs::Codecs)
    }

    /// Builder with the given codecs, the built-in [`Resampler`] and
    /// [`StdFileSystem`].
    pub fn with_codecs(decoder: impl Decoder + 'static, encoder: impl Encoder + 'static) -> Self {
        Self {
            decoder: Box::new(decoder),
            rasterizer: Box::new(Resampler),
            encoder: Box::new(encoder),
            filesystem: Box::new(StdFileSystem),
            filter: Filter::default(),
        }
    }

    /// Replace the decoder.
    pub fn with_decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Replace the rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self
    }

    /// Replace the encoder.
    pub fn with_encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    /// Replace the filesystem used by the path entry points.
    pub fn with_filesystem(mut self, filesystem: impl FileSystem + 'static) -> Self {
        self.filesystem = Box::new(filesystem);
        self
    }

    /// Interpolation kernel passed to the rasterizer.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Run a job and hand the rendered buffer to `consumer`.
    ///
    /// The source is released (per `options`) before `consumer` runs. Errors
    /// from any stage, including the consumer, propagate after cleanup.
    pub fn build_with<S, T, F>(
        &self,
        source: &mut IoHandle<S>,
        instructions: &Instructions,
        options: BuildOptions,
        consumer: F,
    ) -> Result<Built<T>>
    where
        S: Read + Seek,
        F: FnOnce(&mut PixelBuffer) -> Result<T>,
    {
        let mut job = Job::new(source, options);
        let produced = job.produce(self, instructions);
        if let Err(e) = &produced {
            job.fail(e);
        }
        let released = job.teardown();
        let (mut pixels, plan) = match first_error(produced, released, "source teardown") {
            Ok(v) => v,
            Err(e) => {
                if job.stage != Stage::Failed {
                    job.fail(&e);
                }
                return Err(e);
            }
        };

        enter(&mut job.stage, Stage::Consuming);
        let consumed = consumer(&mut pixels);

        enter(&mut job.stage, Stage::Disposing);
        // The source side is already released; only the rendered buffer is left.
        let preserved = if options.preserves_destination_buffer() && consumed.is_ok() {
            Some(pixels)
        } else {
            drop(pixels);
            debug!("released destination buffer");
            None
        };

        match consumed {
            Ok(value) => {
                enter(&mut job.stage, Stage::Done);
                Ok(Built {
                    value,
                    layout: plan,
                    preserved,
                })
            }
            Err(e) => {
                job.fail(&e);
                Err(e)
            }
        }
    }

    /// Resize `source` and write the encoded result to `destination`.
    ///
    /// The destination is flushed and closed afterwards, whether or not the
    /// job succeeded, unless [`BuildOptions::leave_destination_open`] is set.
    pub fn build<S, W>(
        &self,
        source: &mut IoHandle<S>,
        destination: &mut IoHandle<W>,
        instructions: &Instructions,
        options: BuildOptions,
    ) -> Result<Built<u64>>
    where
        S: Read + Seek,
        W: Write,
    {
        let result = self.build_with(source, instructions, options, |pixels| {
            self.encode(pixels, instructions, &mut *destination)
        });
        if options.keeps_destination_open() {
            return result;
        }
        let closed = destination.finish().map_err(Error::from);
        first_error(result, closed, "closing destination")
    }

    /// Resize `source` and write the encoded result to a file.
    ///
    /// The file is opened, truncated, only after the source has been
    /// released and the output fully encoded. Parent directories, if
    /// requested, are created at the same point. The file is always closed
    /// before returning.
    pub fn build_to_path<S>(
        &self,
        source: &mut IoHandle<S>,
        destination: &Path,
        instructions: &Instructions,
        options: BuildOptions,
    ) -> Result<Built<u64>>
    where
        S: Read + Seek,
    {
        self.build_with(source, instructions, options, |pixels| {
            let mut encoded = Vec::new();
            self.encode(pixels, instructions, &mut encoded)?;
            if options.creates_parent_directory() {
                if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
                    self.filesystem.ensure_directory(parent)?;
                }
            }
            let mut file = IoHandle::new(self.filesystem.open_write(destination, true)?);
            let written = file
                .write_all(&encoded)
                .map(|()| encoded.len() as u64)
                .map_err(Error::from);
            let closed = file.finish().map_err(Error::from);
            first_error(written, closed, "closing destination")
        })
    }

    /// Resize one file into another.
    ///
    /// When both paths name the same file the source is buffered in memory
    /// first, so the file can be overwritten in place.
    pub fn build_file(
        &self,
        source: &Path,
        destination: &Path,
        instructions: &Instructions,
        options: BuildOptions,
    ) -> Result<Built<u64>> {
        let options = if self.filesystem.same_file(source, destination) {
            debug!(path = %source.display(), "in-place resize, buffering source");
            options.buffer_source()
        } else {
            options
        };
        let mut input = IoHandle::new(self.filesystem.open_read(source)?);
        self.build_to_path(&mut input, destination, instructions, options)
    }

    /// Resize an in-memory image and return the encoded output.
    pub fn build_bytes(&self, source: &[u8], instructions: &Instructions) -> Result<Vec<u8>> {
        let mut input = IoHandle::new(Cursor::new(source));
        let built = self.build_with(&mut input, instructions, BuildOptions::new(), |pixels| {
            let mut out = Vec::new();
            self.encode(pixels, instructions, &mut out)?;
            Ok(out)
        })?;
        Ok(built.value)
    }

    fn encode(
        &self,
        pixels: &PixelBuffer,
        instructions: &Instructions,
        sink: &mut dyn Write,
    ) -> Result<u64> {
        let written = encode_to(
            &*self.encoder,
            pixels,
            instructions.format(),
            instructions.quality(),
            sink,
        )?;
        trace!(format = ?instructions.format(), bytes = written, "encoded");
        Ok(written)
    }
}
