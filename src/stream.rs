//! Closable stream handles.
//!
//! An [`IoHandle`] owns a stream and can be closed in place. The builder
//! borrows handles mutably, so after a job the caller can observe whether
//! the stream was closed, left open, or rewound. I/O on a closed handle
//! fails with [`io::ErrorKind::NotConnected`].

use std::io::{self, Read, Seek, SeekFrom, Write};

/// A stream that can be closed while still borrowed.
#[derive(Debug)]
pub struct IoHandle<T> {
    inner: Option<T>,
}

impl<T> IoHandle<T> {
    /// Wrap an open stream.
    pub fn new(inner: T) -> Self {
        Self { inner: Some(inner) }
    }

    /// Drop the wrapped stream. Idempotent.
    pub fn close(&mut self) {
        self.inner = None;
    }

    /// True once [`close`](Self::close) or [`finish`](Self::finish) has run.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// The wrapped stream, or `None` if closed.
    pub fn get_ref(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.inner.as_mut()
    }

    /// The wrapped stream, or `None` if closed.
    pub fn into_inner(self) -> Option<T> {
        self.inner
    }

    fn live(&mut self) -> io::Result<&mut T> {
        self.inner.as_mut().ok_or_else(closed_error)
    }
}

impl<T: Write> IoHandle<T> {
    /// Flush, then close. The stream is closed even when the flush fails.
    pub fn finish(&mut self) -> io::Result<()> {
        let flushed = match self.inner.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        };
        self.close();
        flushed
    }
}

impl<T> From<T> for IoHandle<T> {
    fn from(inner: T) -> Self {
        Self::new(inner)
    }
}

pub(crate) fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream is closed")
}

impl<T: Read> Read for IoHandle<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.live()?.read(buf)
    }
}

impl<T: Write> Write for IoHandle<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.live()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.live()?.flush()
    }
}

impl<T: Seek> Seek for IoHandle<T> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.live()?.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_until_closed() {
        let mut h = IoHandle::new(Cursor::new(vec![1u8, 2, 3]));
        let mut buf = [0u8; 2];
        assert_eq!(h.read(&mut buf).unwrap(), 2);
        assert!(!h.is_closed());

        h.close();
        assert!(h.is_closed());
        let err = h.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert!(h.seek(SeekFrom::Start(0)).is_err());
        assert!(h.into_inner().is_none());
    }

    #[test]
    fn close_is_idempotent() {
        let mut h = IoHandle::new(Cursor::new(Vec::<u8>::new()));
        h.close();
        h.close();
        assert!(h.is_closed());
    }

    #[test]
    fn finish_flushes_and_closes() {
        let mut h: IoHandle<Vec<u8>> = Vec::new().into();
        h.write_all(b"abc").unwrap();
        assert_eq!(h.get_ref().map(Vec::len), Some(3));
        h.finish().unwrap();
        assert!(h.is_closed());
        assert!(h.write(b"x").is_err());
        // Finishing an already-closed handle is fine.
        h.finish().unwrap();
    }
}
