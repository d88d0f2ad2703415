//! Output sinks for encoded JPEG bytes.
//!
//! The encoder never touches files or sockets itself. It hands ordered byte
//! buffers to an [`OutputSink`]; entropy-coded data arrives in chunks of
//! [`OUT_BUF_SIZE`](crate::bits::OUT_BUF_SIZE) bytes, headers in smaller
//! pieces. Any failed write aborts the current image.

use std::io::Write;

use crate::error::{Error, Result};

/// Destination for encoded bytes.
pub trait OutputSink {
    /// Accept the next buffer of output, in order.
    fn put_buf(&mut self, buf: &[u8]) -> Result<()>;
}

/// Write a fixed-size record, e.g. a big-endian marker from `u16::to_be_bytes`.
#[inline]
pub fn put_obj<S: OutputSink + ?Sized, const N: usize>(sink: &mut S, obj: &[u8; N]) -> Result<()> {
    sink.put_buf(obj)
}

impl OutputSink for Vec<u8> {
    fn put_buf(&mut self, buf: &[u8]) -> Result<()> {
        self.try_reserve(buf.len())?;
        self.extend_from_slice(buf);
        Ok(())
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn put_buf(&mut self, buf: &[u8]) -> Result<()> {
        (**self).put_buf(buf)
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn put_buf(&mut self, buf: &[u8]) -> Result<()> {
        (**self).put_buf(buf)
    }
}

/// Sink over any [`std::io::Write`], such as a buffered file.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    inner: W,
    bytes_written: usize,
}

impl<W: Write> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Total bytes accepted so far.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Recover the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn put_buf(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write_all(buf)?;
        self.bytes_written += buf.len();
        Ok(())
    }
}

/// Sink over a caller-provided, fixed-size memory region.
///
/// Writing past the end of the region fails with [`Error::BufferTooSmall`];
/// the bytes already written are not a valid image after that.
#[derive(Debug)]
pub struct MemorySink<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> MemorySink<'a> {
    /// Wrap a memory region. Nothing is written until the encoder emits.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Number of bytes written into the region.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Capacity of the region.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl OutputSink for MemorySink<'_> {
    fn put_buf(&mut self, buf: &[u8]) -> Result<()> {
        let end = self.len + buf.len();
        if end > self.buf.len() {
            return Err(Error::BufferTooSmall {
                required: end,
                actual: self.buf.len(),
            });
        }
        self.buf[self.len..end].copy_from_slice(buf);
        self.len = end;
        Ok(())
    }
}

/// Sink that forwards every buffer to a closure returning success or failure.
pub struct CallbackSink<F>
where
    F: FnMut(&[u8]) -> bool,
{
    callback: F,
}

impl<F> CallbackSink<F>
where
    F: FnMut(&[u8]) -> bool,
{
    /// Create a sink from a closure. Returning `false` rejects the write.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> OutputSink for CallbackSink<F>
where
    F: FnMut(&[u8]) -> bool,
{
    fn put_buf(&mut self, buf: &[u8]) -> Result<()> {
        if (self.callback)(buf) {
            Ok(())
        } else {
            Err(Error::SinkWrite("callback rejected write".into()))
        }
    }
}
