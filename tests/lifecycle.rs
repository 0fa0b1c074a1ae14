//! Stream lifecycle: what state the source and destination are left in for
//! every option combination, on success and on failure.
//!
//! The codecs here are stand-ins. The "image" is two header bytes holding
//! the width and height; the "encoding" writes the output width and height.

#![cfg(feature = "std")]

use std::cell::{Cell, RefCell};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::rc::Rc;

use zenresize::codec::{
    DecodeHints, Decoder, Encoder, FileSystem, ReadSeek, StdFileSystem,
};
use zenresize::error::{DecodeError, EncodeError};
use zenresize::pixels::{DecodedImage, PixelBuffer, PixelFormat};
use zenresize::{BuildOptions, Error, FitMode, ImageBuilder, Instructions, IoHandle, Size};

// ---- Stand-in collaborators ----

struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    fn decode(&self, source: &mut dyn Read, _: &DecodeHints) -> Result<DecodedImage, DecodeError> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        let &[w, h, ..] = bytes.as_slice() else {
            return Err(DecodeError::Malformed("short header".into()));
        };
        Ok(DecodedImage {
            pixels: PixelBuffer::filled(w as u32, h as u32, [50, 60, 70, 255]),
            format: PixelFormat::Rgba8,
        })
    }
}

struct PanickingDecoder;

impl Decoder for PanickingDecoder {
    fn decode(&self, _: &mut dyn Read, _: &DecodeHints) -> Result<DecodedImage, DecodeError> {
        panic!("decoder blew up");
    }
}

struct SizeEncoder;

impl Encoder for SizeEncoder {
    fn encode_jpeg(&self, p: &PixelBuffer, _: u8) -> Result<Vec<u8>, EncodeError> {
        Ok(vec![p.width() as u8, p.height() as u8])
    }

    fn encode_png(&self, p: &PixelBuffer) -> Result<Vec<u8>, EncodeError> {
        self.encode_jpeg(p, 0)
    }
}

/// Source whose absolute seeks fail.
struct NoRewind(Cursor<Vec<u8>>);

impl Read for NoRewind {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Seek for NoRewind {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Start(_) => Err(io::Error::other("cannot rewind")),
            _ => self.0.seek(pos),
        }
    }
}

/// Source whose reads always fail.
struct Unreadable;

impl Read for Unreadable {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "bad sector"))
    }
}

impl Seek for Unreadable {
    fn seek(&mut self, _: SeekFrom) -> io::Result<u64> {
        Ok(0)
    }
}

/// Destination whose flush fails.
struct BadFlush(Vec<u8>);

impl Write for BadFlush {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::other("disk full"))
    }
}

/// Source that records when it is dropped.
struct Watched {
    inner: Cursor<Vec<u8>>,
    dropped: Rc<Cell<bool>>,
}

impl Read for Watched {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for Watched {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl Drop for Watched {
    fn drop(&mut self) {
        self.dropped.set(true);
    }
}

/// Records whether the watched source was already gone when decoding began.
struct ObservingDecoder {
    dropped: Rc<Cell<bool>>,
    seen: Rc<Cell<Option<bool>>>,
}

impl Decoder for ObservingDecoder {
    fn decode(&self, source: &mut dyn Read, hints: &DecodeHints) -> Result<DecodedImage, DecodeError> {
        self.seen.set(Some(self.dropped.get()));
        HeaderDecoder.decode(source, hints)
    }
}

type Log = Rc<RefCell<Vec<String>>>;

/// File system that records opens and source closes.
#[derive(Clone, Default)]
struct RecordingFs {
    log: Log,
}

struct LoggedReader {
    inner: Box<dyn ReadSeek>,
    log: Log,
}

impl Read for LoggedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for LoggedReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl Drop for LoggedReader {
    fn drop(&mut self) {
        self.log.borrow_mut().push("close_read".into());
    }
}

impl FileSystem for RecordingFs {
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>> {
        self.log.borrow_mut().push("open_read".into());
        Ok(Box::new(LoggedReader {
            inner: StdFileSystem.open_read(path)?,
            log: Rc::clone(&self.log),
        }))
    }

    fn open_write(&self, path: &Path, truncate: bool) -> io::Result<Box<dyn Write>> {
        self.log.borrow_mut().push(format!("open_write truncate={truncate}"));
        StdFileSystem.open_write(path, truncate)
    }

    fn ensure_directory(&self, dir: &Path) -> io::Result<()> {
        self.log.borrow_mut().push("ensure_directory".into());
        StdFileSystem.ensure_directory(dir)
    }
}

// ---- Helpers ----

const PREFIX: usize = 3;

fn builder() -> ImageBuilder {
    ImageBuilder::with_codecs(HeaderDecoder, SizeEncoder)
}

/// A source positioned after a few unrelated bytes.
fn source(w: u8, h: u8) -> IoHandle<Cursor<Vec<u8>>> {
    let mut c = Cursor::new(vec![0xEE, 0xEE, 0xEE, w, h]);
    c.set_position(PREFIX as u64);
    IoHandle::new(c)
}

fn options(leave_open: bool, rewind: bool, buffer: bool) -> BuildOptions {
    let mut o = BuildOptions::new();
    if leave_open {
        o = o.leave_source_open();
    }
    if rewind {
        o = o.rewind_source();
    }
    if buffer {
        o = o.buffer_source();
    }
    o
}

/// Expected source state: `None` for closed, `Some(position)` for open.
fn expected(leave_open: bool, rewind: bool, len: u64) -> Option<u64> {
    if rewind {
        Some(PREFIX as u64)
    } else if leave_open {
        Some(len)
    } else {
        None
    }
}

fn observed(src: &mut IoHandle<Cursor<Vec<u8>>>) -> Option<u64> {
    if src.is_closed() {
        None
    } else {
        Some(src.stream_position().unwrap())
    }
}

fn each_combination(mut f: impl FnMut(bool, bool, bool)) {
    for leave_open in [false, true] {
        for rewind in [false, true] {
            for buffer in [false, true] {
                f(leave_open, rewind, buffer);
            }
        }
    }
}

// ---- Source option matrix ----

#[test]
fn source_state_after_success() {
    each_combination(|leave_open, rewind, buffer| {
        let mut src = source(40, 20);
        let len = src.get_ref().unwrap().get_ref().len() as u64;
        let mut dst = IoHandle::new(Vec::new());
        let i = Instructions::new().with_size(10, 10).unwrap();
        let built = builder()
            .build(&mut src, &mut dst, &i, options(leave_open, rewind, buffer))
            .unwrap();
        assert_eq!(built.layout.canvas, Size::new(10, 5));
        assert_eq!(
            observed(&mut src),
            expected(leave_open, rewind, len),
            "leave_open={leave_open} rewind={rewind} buffer={buffer}"
        );
        assert!(dst.is_closed());
    });
}

#[test]
fn source_state_after_decode_failure() {
    each_combination(|leave_open, rewind, buffer| {
        // One header byte only.
        let mut src = IoHandle::new(Cursor::new(vec![0xEE, 0xEE, 0xEE, 9]));
        src.seek(SeekFrom::Start(PREFIX as u64)).unwrap();
        let err = builder()
            .build_with(
                &mut src,
                &Instructions::new(),
                options(leave_open, rewind, buffer),
                |_| Ok(()),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::Malformed(_))), "{err:?}");
        assert_eq!(
            observed(&mut src),
            expected(leave_open, rewind, 4),
            "leave_open={leave_open} rewind={rewind} buffer={buffer}"
        );
    });
}

#[test]
fn source_state_after_consumer_failure() {
    each_combination(|leave_open, rewind, buffer| {
        let mut src = source(8, 8);
        let err = builder()
            .build_with(
                &mut src,
                &Instructions::new(),
                options(leave_open, rewind, buffer).preserve_destination_buffer(),
                |_| -> zenresize::Result<()> { Err(io::Error::other("consumer refused").into()) },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "consumer refused");
        assert_eq!(observed(&mut src), expected(leave_open, rewind, 5));
    });
}

#[test]
fn buffered_source_closes_before_decode() {
    for buffer in [false, true] {
        let dropped = Rc::new(Cell::new(false));
        let seen = Rc::new(Cell::new(None));
        let mut src = IoHandle::new(Watched {
            inner: Cursor::new(vec![4, 4]),
            dropped: Rc::clone(&dropped),
        });
        builder()
            .with_decoder(ObservingDecoder {
                dropped: Rc::clone(&dropped),
                seen: Rc::clone(&seen),
            })
            .build_with(&mut src, &Instructions::new(), options(false, false, buffer), |_| {
                Ok(())
            })
            .unwrap();
        assert_eq!(seen.get(), Some(buffer), "buffer={buffer}");
        assert!(src.is_closed());
    }
}

#[test]
fn panicking_decoder_still_closes_source() {
    let mut src = source(4, 4);
    let b = builder().with_decoder(PanickingDecoder);
    let result = catch_unwind(AssertUnwindSafe(|| {
        b.build_with(&mut src, &Instructions::new(), BuildOptions::new(), |_| Ok(()))
    }));
    assert!(result.is_err());
    assert!(src.is_closed());
}

#[test]
fn failed_rewind_is_reported() {
    let mut src = IoHandle::new(NoRewind(Cursor::new(vec![4, 4])));
    let err = builder()
        .build_with(
            &mut src,
            &Instructions::new(),
            BuildOptions::new().rewind_source(),
            |_| Ok(()),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "cannot rewind");
    // Rewinding keeps the source open even when the seek fails.
    assert!(!src.is_closed());
}

#[test]
fn decode_error_wins_over_failed_rewind() {
    let mut src = IoHandle::new(NoRewind(Cursor::new(vec![4])));
    let err = builder()
        .build_with(
            &mut src,
            &Instructions::new(),
            BuildOptions::new().rewind_source(),
            |_| Ok(()),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Decode(_)), "{err:?}");
}

#[test]
fn read_failure_is_the_same_io_error_with_or_without_buffering() {
    for o in [BuildOptions::new(), BuildOptions::new().buffer_source()] {
        let mut src = IoHandle::new(Unreadable);
        let err = builder()
            .build_with(&mut src, &Instructions::new(), o, |_| Ok(()))
            .unwrap_err();
        match err {
            Error::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof, "{o:?}");
                assert_eq!(e.to_string(), "bad sector");
            }
            other => panic!("{o:?}: unexpected {other:?}"),
        }
        assert!(src.is_closed(), "{o:?}");
    }
}

// ---- Destination ----

#[test]
fn destination_closed_by_default_and_on_failure() {
    let i = Instructions::new()
        .with_size(12, 34)
        .unwrap()
        .with_mode(FitMode::Crop);

    let mut src = source(100, 100);
    let mut dst = IoHandle::new(Vec::new());
    let built = builder()
        .build(&mut src, &mut dst, &i, BuildOptions::new())
        .unwrap();
    assert_eq!(built.layout.canvas, Size::new(12, 34));
    assert!(dst.is_closed());

    let mut bad = IoHandle::new(Cursor::new(vec![1u8]));
    let mut dst = IoHandle::new(Vec::new());
    assert!(builder().build(&mut bad, &mut dst, &i, BuildOptions::new()).is_err());
    assert!(dst.is_closed());
}

#[test]
fn destination_left_open_on_request() {
    let mut src = source(100, 66);
    let mut dst = IoHandle::new(Vec::new());
    let i = Instructions::new().with_size(12, 34).unwrap();
    builder()
        .build(&mut src, &mut dst, &i, BuildOptions::new().leave_destination_open())
        .unwrap();
    assert!(!dst.is_closed());
    dst.write_all(b"!").unwrap();
    assert_eq!(dst.into_inner().unwrap(), [12, 8, b'!']);
}

#[test]
fn destination_flush_failure_surfaces() {
    let mut src = source(10, 10);
    let mut dst = IoHandle::new(BadFlush(Vec::new()));
    let err = builder()
        .build(&mut src, &mut dst, &Instructions::new(), BuildOptions::new())
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(dst.is_closed());
}

#[test]
fn preserved_buffer_is_returned() {
    let mut src = source(30, 10);
    let i = Instructions::new().with_size(15, 15).unwrap();
    let built = builder()
        .build_with(&mut src, &i, BuildOptions::new().preserve_destination_buffer(), |p| {
            p.as_bytes_mut()[0] = 1;
            Ok(p.size())
        })
        .unwrap();
    assert_eq!(built.value, Size::new(15, 5));
    let kept = built.preserved.unwrap();
    assert_eq!(kept.as_bytes()[0], 1);
}

// ---- Paths ----

#[test]
fn same_path_is_buffered_and_rewritten_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.jpg");
    std::fs::write(&path, [100, 66]).unwrap();

    let fs = RecordingFs::default();
    let log = Rc::clone(&fs.log);
    let i = Instructions::new().with_size(12, 34).unwrap();
    let built = builder()
        .with_filesystem(fs)
        .build_file(&path, &path, &i, BuildOptions::new())
        .unwrap();

    assert_eq!(built.value, 2);
    assert_eq!(std::fs::read(&path).unwrap(), [12, 8]);
    assert_eq!(
        *log.borrow(),
        ["open_read", "close_read", "open_write truncate=true"]
    );
}

#[test]
fn missing_parent_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a/b/out.jpg");
    let mut src = source(10, 10);
    let err = builder()
        .build_to_path(&mut src, &dest, &Instructions::new(), BuildOptions::new())
        .unwrap_err();
    match err {
        Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
        other => panic!("unexpected {other:?}"),
    }
    // The source is still released.
    assert!(src.is_closed());
}

#[test]
fn parent_directory_created_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a/b/out.jpg");
    let mut src = source(10, 10);
    builder()
        .build_to_path(
            &mut src,
            &dest,
            &Instructions::new(),
            BuildOptions::new().create_parent_directory(),
        )
        .unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), [10, 10]);
}

#[test]
fn failed_parent_creation_still_releases_source() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let dest = blocker.join("sub/out.jpg");

    let mut src = source(10, 10);
    let err = builder()
        .build_to_path(
            &mut src,
            &dest,
            &Instructions::new(),
            BuildOptions::new().create_parent_directory(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err:?}");
    assert!(src.is_closed());
    assert_eq!(std::fs::read(&blocker).unwrap(), b"not a directory");

    let mut src = source(10, 10);
    builder()
        .build_to_path(
            &mut src,
            &dest,
            &Instructions::new(),
            BuildOptions::new().create_parent_directory().rewind_source(),
        )
        .unwrap_err();
    assert!(!src.is_closed());
    assert_eq!(src.stream_position().unwrap(), PREFIX as u64);
}

#[test]
fn missing_source_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = builder()
        .build_file(
            &dir.path().join("nope.jpg"),
            &dir.path().join("out.jpg"),
            &Instructions::new(),
            BuildOptions::new(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    assert!(!dir.path().join("out.jpg").exists());
}
