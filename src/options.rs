//! Lifecycle flags for a build.

/// Controls what happens to the source, the destination and the buffers
/// around a build.
///
/// All flags default to off: the source and destination are closed and the
/// destination buffer is released once the job finishes.
///
/// ```
/// use zenresize::BuildOptions;
///
/// let opts = BuildOptions::new().rewind_source();
/// // Rewinding implies the source stays open.
/// assert!(opts.keeps_source_open());
/// assert!(!opts.keeps_destination_open());
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BuildOptions {
    leave_source_open: bool,
    rewind_source: bool,
    leave_destination_open: bool,
    preserve_destination_buffer: bool,
    create_parent_directory: bool,
    buffer_source: bool,
}

impl BuildOptions {
    /// All flags off. Both streams are closed and the source is decoded in place.
    pub const fn new() -> Self {
        Self {
            leave_source_open: false,
            rewind_source: false,
            leave_destination_open: false,
            preserve_destination_buffer: false,
            create_parent_directory: false,
            buffer_source: false,
        }
    }

    /// Do not close the source stream.
    pub const fn leave_source_open(mut self) -> Self {
        self.leave_source_open = true;
        self
    }

    /// Seek the source back to where it was when the job started. Implies
    /// [`leave_source_open`](Self::leave_source_open).
    pub const fn rewind_source(mut self) -> Self {
        self.rewind_source = true;
        self.leave_source_open = true;
        self
    }

    /// Do not close the destination stream.
    pub const fn leave_destination_open(mut self) -> Self {
        self.leave_destination_open = true;
        self
    }

    /// Hand the rendered buffer back to the caller instead of dropping it.
    pub const fn preserve_destination_buffer(mut self) -> Self {
        self.preserve_destination_buffer = true;
        self
    }

    /// Create missing parent directories of a destination path.
    pub const fn create_parent_directory(mut self) -> Self {
        self.create_parent_directory = true;
        self
    }

    /// Copy the whole source into memory before decoding, so the source
    /// can be released before the destination is written.
    pub const fn buffer_source(mut self) -> Self {
        self.buffer_source = true;
        self
    }

    /// Whether the source stays open after the job. True when rewinding.
    ///
    /// ```
    /// use zenresize::BuildOptions;
    /// assert!(BuildOptions::new().rewind_source().keeps_source_open());
    /// assert!(!BuildOptions::new().keeps_source_open());
    /// ```
    pub const fn keeps_source_open(&self) -> bool {
        self.leave_source_open || self.rewind_source
    }

    /// Whether the source is seeked back to its starting position.
    pub const fn rewinds_source(&self) -> bool {
        self.rewind_source
    }

    /// Whether the destination stream stays open.
    pub const fn keeps_destination_open(&self) -> bool {
        self.leave_destination_open
    }

    /// Whether the rendered buffer is returned in [`Built`](crate::Built).
    pub const fn preserves_destination_buffer(&self) -> bool {
        self.preserve_destination_buffer
    }

    /// Whether missing parent directories of a path destination are created.
    pub const fn creates_parent_directory(&self) -> bool {
        self.create_parent_directory
    }

    /// Whether the source is read into memory before decoding.
    pub const fn buffers_source(&self) -> bool {
        self.buffer_source
    }
}
