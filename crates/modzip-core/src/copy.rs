//! Bounded copy with a reusable buffer.
//!
//! ZIP entries are written with a declared length, so entry bodies are copied
//! with [`copy_exact`]: exactly `len` bytes, never more, and a short source is
//! an error rather than a silently truncated entry.

use std::io;
use std::io::Read;
use std::io::Write;

/// Buffer size for entry copies (64KB).
///
/// Matches typical filesystem block sizes.
pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Heap buffer reused across every entry of one archive.
///
/// # Examples
///
/// ```
/// use modzip_core::copy::CopyBuffer;
///
/// let buffer = CopyBuffer::new();
/// assert_eq!(buffer.size(), 64 * 1024);
/// ```
#[derive(Debug)]
pub struct CopyBuffer {
    buf: Box<[u8]>,
}

impl CopyBuffer {
    /// Allocates a zeroed copy buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; COPY_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    /// Returns the buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies exactly `len` bytes from `reader` to `writer`.
///
/// Reads are capped so that nothing past `len` is consumed from `reader`.
/// Interrupted reads are retried.
///
/// # Errors
///
/// Returns the underlying error if reading or writing fails, and
/// `ErrorKind::UnexpectedEof` if `reader` ends before `len` bytes.
///
/// # Examples
///
/// ```
/// use modzip_core::copy::CopyBuffer;
/// use modzip_core::copy::copy_exact;
/// use std::io::Cursor;
///
/// let mut buffer = CopyBuffer::new();
/// let mut input = Cursor::new(b"package x\n// trailing".to_vec());
/// let mut output = Vec::new();
///
/// let copied = copy_exact(&mut input, &mut output, 9, &mut buffer)?;
/// assert_eq!(copied, 9);
/// assert_eq!(output, b"package x");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn copy_exact<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    len: u64,
    buffer: &mut CopyBuffer,
) -> io::Result<u64> {
    let mut remaining = len;

    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(buffer.buf.len(), |r| r.min(buffer.buf.len()));
        let bytes_read = match reader.read(&mut buffer.buf[..want]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "source ended after {} of {len} bytes",
                        len - remaining
                    ),
                ));
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        writer.write_all(&buffer.buf[..bytes_read])?;
        remaining -= bytes_read as u64;
    }

    Ok(len)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_copy_buffer_default() {
        let buffer = CopyBuffer::default();
        assert_eq!(buffer.size(), COPY_BUFFER_SIZE);
    }

    #[test]
    fn test_copy_zero_bytes() {
        let mut buffer = CopyBuffer::new();
        let mut input = Cursor::new(b"ignored".to_vec());
        let mut output = Vec::new();

        let copied = copy_exact(&mut input, &mut output, 0, &mut buffer).unwrap();
        assert_eq!(copied, 0);
        assert!(output.is_empty());
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn test_copy_stops_at_declared_length() {
        let mut buffer = CopyBuffer::new();
        let mut input = Cursor::new(b"0123456789".to_vec());
        let mut output = Vec::new();

        copy_exact(&mut input, &mut output, 4, &mut buffer).unwrap();
        assert_eq!(output, b"0123");
        assert_eq!(input.position(), 4, "must not read past the declared length");
    }

    #[test]
    fn test_copy_multiple_chunks() {
        let mut buffer = CopyBuffer::new();
        let data = vec![0x55u8; COPY_BUFFER_SIZE * 3 + 1000];
        let mut input = Cursor::new(&data);
        let mut output = Vec::new();

        let copied = copy_exact(&mut input, &mut output, data.len() as u64, &mut buffer).unwrap();
        assert_eq!(copied, data.len() as u64);
        assert_eq!(output, data);
    }

    #[test]
    fn test_copy_short_source_is_unexpected_eof() {
        let mut buffer = CopyBuffer::new();
        let mut input = Cursor::new(b"abc".to_vec());
        let mut output = Vec::new();

        let err = copy_exact(&mut input, &mut output, 10, &mut buffer).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(err.to_string().contains("3 of 10"));
    }

    #[test]
    fn test_copy_with_interrupted_reads() {
        struct InterruptedReader {
            data: Vec<u8>,
            position: usize,
            calls: usize,
        }

        impl Read for InterruptedReader {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.calls += 1;
                if self.calls % 2 == 1 {
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
                }
                let remaining = self.data.len() - self.position;
                let n = remaining.min(buf.len()).min(7);
                buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
                self.position += n;
                Ok(n)
            }
        }

        let data = vec![0x42u8; 100];
        let mut reader = InterruptedReader {
            data: data.clone(),
            position: 0,
            calls: 0,
        };
        let mut buffer = CopyBuffer::new();
        let mut output = Vec::new();

        copy_exact(&mut reader, &mut output, 100, &mut buffer).unwrap();
        assert_eq!(output, data);
    }

    #[test]
    fn test_copy_propagates_write_failure() {
        struct FailingWriter;

        impl Write for FailingWriter {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("sink closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut buffer = CopyBuffer::new();
        let mut input = Cursor::new(vec![1u8; 32]);

        let err = copy_exact(&mut input, &mut FailingWriter, 32, &mut buffer).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
