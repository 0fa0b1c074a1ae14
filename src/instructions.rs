//! Resize instructions: target box, fit policy, scale policy, output encoding.
//!
//! [`Instructions`] validates on every assignment. A value that exists is
//! always within range, so nothing downstream re-checks it.

use thiserror::Error;

/// How to reconcile the requested box with the source aspect ratio.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FitMode {
    /// Scale proportionally to fit within the box.
    /// Output may be smaller than the box on one axis.
    #[default]
    Max,
    /// Scale proportionally to fit within the box, pad the remainder.
    /// Canvas is exactly the box.
    Pad,
    /// Scale proportionally to fill the box, cropping the source overflow.
    /// Canvas is exactly the box.
    Crop,
    /// Scale to the box exactly, distorting the aspect ratio.
    Stretch,
}

/// Whether content and canvas may grow beyond the source resolution.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ScaleMode {
    /// Never upscale. Images that already fit are emitted at native size.
    #[default]
    DownscaleOnly,
    /// Scale in both directions.
    Both,
    /// Never upscale content, but let the canvas grow to the requested box
    /// (the image is centered on padding).
    UpscaleCanvas,
}

/// Encoded output format.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Lossy, quality-parameterized, no alpha.
    #[default]
    Jpeg,
    /// Lossless, with alpha.
    Png,
}

impl OutputFormat {
    /// Whether the format can carry an alpha channel.
    pub const fn supports_alpha(self) -> bool {
        matches!(self, Self::Png)
    }

    /// Conventional file extension, without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// MIME type.
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Canvas background color.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CanvasColor {
    /// Transparent black `[0, 0, 0, 0]`.
    #[default]
    Transparent,
    /// sRGB color with straight alpha.
    Srgb { r: u8, g: u8, b: u8, a: u8 },
}

impl CanvasColor {
    /// White, fully opaque.
    pub const fn white() -> Self {
        Self::Srgb {
            r: 255,
            g: 255,
            b: 255,
            a: 255,
        }
    }

    /// Black, fully opaque.
    pub const fn black() -> Self {
        Self::Srgb {
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        }
    }

    /// Channel values as `[r, g, b, a]`.
    pub const fn to_rgba(self) -> [u8; 4] {
        match self {
            Self::Transparent => [0, 0, 0, 0],
            Self::Srgb { r, g, b, a } => [r, g, b, a],
        }
    }

    /// Whether any part of the background shows through.
    pub const fn is_transparent(self) -> bool {
        self.to_rgba()[3] == 0
    }
}

/// An instruction value was out of range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("width must be at least 1, got {0}")]
    NonPositiveWidth(i32),
    #[error("height must be at least 1, got {0}")]
    NonPositiveHeight(i32),
    #[error("quality must be within 0..=100, got {0}")]
    QualityOutOfRange(i32),
}

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 90;

/// Validated resize instructions.
///
/// Leaving both width and height unset means "keep the native size".
///
/// ```
/// use zenresize::{FitMode, Instructions, OutputFormat};
///
/// let inst = Instructions::new()
///     .with_size(800, 600)?
///     .with_mode(FitMode::Crop)
///     .with_format(OutputFormat::Png);
/// assert_eq!(inst.width(), Some(800));
///
/// assert!(Instructions::new().with_quality(101).is_err());
/// # Ok::<(), zenresize::ValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instructions {
    width: Option<u32>,
    height: Option<u32>,
    mode: FitMode,
    scale: ScaleMode,
    format: OutputFormat,
    quality: u8,
    background: CanvasColor,
    ignore_icc: bool,
}

impl Default for Instructions {
    fn default() -> Self {
        Self::new()
    }
}

impl Instructions {
    /// Native size, `Max`, `DownscaleOnly`, JPEG at quality 90, transparent background.
    pub const fn new() -> Self {
        Self {
            width: None,
            height: None,
            mode: FitMode::Max,
            scale: ScaleMode::DownscaleOnly,
            format: OutputFormat::Jpeg,
            quality: DEFAULT_QUALITY,
            background: CanvasColor::Transparent,
            ignore_icc: false,
        }
    }

    // ---- Builder ----

    /// Set the target width.
    pub fn with_width(mut self, width: i32) -> Result<Self, ValidationError> {
        self.set_width(Some(width))?;
        Ok(self)
    }

    /// Set the target height.
    pub fn with_height(mut self, height: i32) -> Result<Self, ValidationError> {
        self.set_height(Some(height))?;
        Ok(self)
    }

    /// Set both target dimensions.
    pub fn with_size(self, width: i32, height: i32) -> Result<Self, ValidationError> {
        self.with_width(width)?.with_height(height)
    }

    /// Set how the image fits the requested box.
    pub fn with_mode(mut self, mode: FitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set whether the image may be enlarged.
    pub fn with_scale(mut self, scale: ScaleMode) -> Self {
        self.scale = scale;
        self
    }

    /// Set the output encoding.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set JPEG quality. Rejects values outside `0..=100`.
    pub fn with_quality(mut self, quality: i32) -> Result<Self, ValidationError> {
        self.set_quality(quality)?;
        Ok(self)
    }

    /// Set JPEG quality, clamping into `0..=100` instead of rejecting.
    ///
    /// Only for callers that must reproduce clamping entry points; prefer
    /// [`with_quality`](Self::with_quality).
    pub fn with_quality_clamped(mut self, quality: i32) -> Self {
        self.quality = quality.clamp(0, 100) as u8;
        self
    }

    /// Set the color behind padding and transparent pixels.
    pub fn with_background(mut self, background: CanvasColor) -> Self {
        self.background = background;
        self
    }

    /// Skip embedded color profiles when decoding.
    pub fn with_ignore_icc(mut self, ignore: bool) -> Self {
        self.ignore_icc = ignore;
        self
    }

    // ---- Setters ----

    /// Set or clear the target width.
    pub fn set_width(&mut self, width: Option<i32>) -> Result<(), ValidationError> {
        self.width = match width {
            Some(w) if w < 1 => return Err(ValidationError::NonPositiveWidth(w)),
            Some(w) => Some(w as u32),
            None => None,
        };
        Ok(())
    }

    /// Set or clear the target height.
    pub fn set_height(&mut self, height: Option<i32>) -> Result<(), ValidationError> {
        self.height = match height {
            Some(h) if h < 1 => return Err(ValidationError::NonPositiveHeight(h)),
            Some(h) => Some(h as u32),
            None => None,
        };
        Ok(())
    }

    /// Set JPEG quality in place. Rejects values outside `0..=100`.
    pub fn set_quality(&mut self, quality: i32) -> Result<(), ValidationError> {
        if !(0..=100).contains(&quality) {
            return Err(ValidationError::QualityOutOfRange(quality));
        }
        self.quality = quality as u8;
        Ok(())
    }

    /// In-place form of [`with_mode`](Self::with_mode).
    pub fn set_mode(&mut self, mode: FitMode) {
        self.mode = mode;
    }

    /// In-place form of [`with_scale`](Self::with_scale).
    pub fn set_scale(&mut self, scale: ScaleMode) {
        self.scale = scale;
    }

    /// In-place form of [`with_format`](Self::with_format).
    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    /// In-place form of [`with_background`](Self::with_background).
    pub fn set_background(&mut self, background: CanvasColor) {
        self.background = background;
    }

    /// In-place form of [`with_ignore_icc`](Self::with_ignore_icc).
    pub fn set_ignore_icc(&mut self, ignore: bool) {
        self.ignore_icc = ignore;
    }

    // ---- Accessors ----

    /// Requested width, `None` when unset.
    pub fn width(&self) -> Option<u32> {
        self.width
    }

    /// Requested height, `None` when unset.
    pub fn height(&self) -> Option<u32> {
        self.height
    }

    pub fn mode(&self) -> FitMode {
        self.mode
    }

    pub fn scale(&self) -> ScaleMode {
        self.scale
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// JPEG quality, [`DEFAULT_QUALITY`] unless set.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn background(&self) -> CanvasColor {
        self.background
    }

    pub fn ignore_icc(&self) -> bool {
        self.ignore_icc
    }

    /// Background actually painted for the chosen output format.
    ///
    /// Formats without alpha cannot show transparency, so a transparent
    /// background becomes opaque white for them.
    pub fn effective_background(&self) -> CanvasColor {
        if !self.format.supports_alpha() && self.background.is_transparent() {
            CanvasColor::white()
        } else {
            self.background
        }
    }
}
