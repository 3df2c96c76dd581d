use std::io::{self, Read, Seek, SeekFrom};

use crate::endian::{Endian, Scalar};
use crate::error::WireError;

/// Seekable read cursor over any `Read + Seek` source.
///
/// The cursor tracks its own absolute position and the total stream
/// length, which lets every read check for truncation *before* touching
/// the underlying reader. A short read is always reported as
/// [`WireError::UnexpectedEof`], never zero-filled.
///
/// ```text
///   0                      pos                     len
///   ├───────── consumed ─────┼────── remaining ──────┤
/// ```
///
/// The cursor owns its source. Dropping it releases the source, which
/// is how file handles get closed on every exit path, failed decodes
/// included.
pub struct ByteCursor<R> {
    inner: R,
    pos: u64,
    len: u64,
}

impl<'a> ByteCursor<io::Cursor<&'a [u8]>> {
    /// Cursor over an in-memory buffer. Infallible: the length is known.
    #[must_use]
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self {
            inner: io::Cursor::new(bytes),
            pos: 0,
            len: bytes.len() as u64,
        }
    }
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wrap a seekable reader, starting at its current position.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] if the stream length cannot be
    /// determined by seeking.
    pub fn new(mut inner: R) -> Result<Self, WireError> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;
        Ok(Self { inner, pos, len })
    }

    /// Current absolute position in the stream.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Total stream length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes left between the cursor and the end of the stream. Zero
    /// when the cursor has been seeked past the end.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.len
    }

    /// Move to an absolute offset. Seeking past the end is allowed; the
    /// next read will fail with [`WireError::UnexpectedEof`].
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] if the underlying seek fails.
    pub fn seek_to(&mut self, offset: u64) -> Result<(), WireError> {
        if offset != self.pos {
            self.inner.seek(SeekFrom::Start(offset))?;
            self.pos = offset;
        }
        Ok(())
    }

    /// Move to an offset produced by arithmetic on decoded values, which
    /// may be negative.
    ///
    /// # Errors
    ///
    /// - [`WireError::InvalidSeek`] if `target` is negative.
    /// - [`WireError::Io`] if the underlying seek fails.
    pub fn seek_signed(&mut self, target: i64) -> Result<(), WireError> {
        let offset = u64::try_from(target).map_err(|_| WireError::InvalidSeek { target })?;
        self.seek_to(offset)
    }

    /// Advance to the next multiple of `boundary`. A boundary of 0 or 1,
    /// or an already aligned cursor, is a no-op.
    ///
    /// Returns the number of padding bytes skipped.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] if the underlying seek fails.
    pub fn align_to(&mut self, boundary: u32) -> Result<u64, WireError> {
        let boundary = u64::from(boundary);
        if boundary <= 1 {
            return Ok(0);
        }
        let rem = self.pos % boundary;
        if rem == 0 {
            return Ok(0);
        }
        let padding = boundary - rem;
        self.seek_to(self.pos + padding)?;
        Ok(padding)
    }

    fn ensure(&self, needed: u64) -> Result<(), WireError> {
        let available = self.remaining();
        if available < needed {
            return Err(WireError::UnexpectedEof {
                offset: self.pos,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Fill `buf` completely from the stream.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnexpectedEof`] if fewer than `buf.len()` bytes remain.
    /// - [`WireError::Io`] if the reader fails.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<(), WireError> {
        let needed = buf.len() as u64;
        self.ensure(needed)?;
        self.inner.read_exact(buf)?;
        self.pos += needed;
        Ok(())
    }

    /// Read one fixed-width numeric in the given byte order.
    ///
    /// # Errors
    ///
    /// Same as [`read_into`](Self::read_into).
    pub fn read_scalar<T: Scalar>(&mut self, endian: Endian) -> Result<T, WireError> {
        let mut bytes = T::Bytes::default();
        self.read_into(bytes.as_mut())?;
        Ok(T::from_bytes(bytes, endian))
    }

    /// # Errors
    ///
    /// Same as [`read_into`](Self::read_into).
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        let mut byte = [0u8; 1];
        self.read_into(&mut byte)?;
        Ok(byte[0])
    }

    /// Bulk-read exactly `count` bytes.
    ///
    /// The length check happens before allocating, so a corrupt count
    /// cannot trigger a huge allocation.
    ///
    /// # Errors
    ///
    /// Same as [`read_into`](Self::read_into).
    pub fn read_bytes(&mut self, count: u64) -> Result<Vec<u8>, WireError> {
        self.ensure(count)?;
        let len = usize::try_from(count).map_err(|_| WireError::UnexpectedEof {
            offset: self.pos,
            needed: count,
            available: self.remaining(),
        })?;
        let mut buf = vec![0u8; len];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Read up to and including a zero byte. The terminator is consumed
    /// but not returned, so a leading zero yields an empty vector.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnterminatedString`] if the stream ends first.
    /// - [`WireError::Io`] if the reader fails.
    pub fn read_cstring(&mut self) -> Result<Vec<u8>, WireError> {
        let start = self.pos;
        let mut bytes = Vec::new();
        loop {
            if self.is_eof() {
                return Err(WireError::UnterminatedString { offset: start });
            }
            let byte = self.read_u8()?;
            if byte == 0 {
                return Ok(bytes);
            }
            bytes.push(byte);
        }
    }

    /// Release the cursor and hand back the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_scalars_in_both_orders() {
        let data = [0x01, 0x00, 0x00, 0x01];
        let mut cursor = ByteCursor::from_slice(&data);
        assert_eq!(cursor.read_scalar::<u16>(Endian::Little).unwrap(), 1);
        assert_eq!(cursor.read_scalar::<u16>(Endian::Big).unwrap(), 1);
        assert!(cursor.is_eof());
    }

    #[test]
    fn short_read_is_an_error_not_zero_fill() {
        let data = [0xAA, 0xBB];
        let mut cursor = ByteCursor::from_slice(&data);
        let result = cursor.read_scalar::<u32>(Endian::Little);
        assert!(matches!(
            result,
            Err(WireError::UnexpectedEof {
                offset: 0,
                needed: 4,
                available: 2
            })
        ));
        // A failed read leaves the position untouched.
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn cstring_hello() {
        let data = b"Hello\0rest";
        let mut cursor = ByteCursor::from_slice(data);
        assert_eq!(cursor.read_cstring().unwrap(), b"Hello");
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn cstring_empty_when_terminator_first() {
        let mut cursor = ByteCursor::from_slice(&[0x00]);
        assert!(cursor.read_cstring().unwrap().is_empty());
        assert!(cursor.is_eof());
    }

    #[test]
    fn cstring_without_terminator() {
        let mut cursor = ByteCursor::from_slice(b"abc");
        assert!(matches!(
            cursor.read_cstring(),
            Err(WireError::UnterminatedString { offset: 0 })
        ));
    }

    #[test]
    fn align_skips_to_boundary() {
        let data = [0u8; 16];
        let mut cursor = ByteCursor::from_slice(&data);
        cursor.read_u8().unwrap();
        assert_eq!(cursor.align_to(4).unwrap(), 3);
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.align_to(4).unwrap(), 0);
        assert_eq!(cursor.align_to(0).unwrap(), 0);
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn seek_past_end_then_read_fails() {
        let data = [1u8, 2, 3];
        let mut cursor = ByteCursor::from_slice(&data);
        cursor.seek_to(10).unwrap();
        assert_eq!(cursor.remaining(), 0);
        assert!(matches!(
            cursor.read_u8(),
            Err(WireError::UnexpectedEof { offset: 10, .. })
        ));
    }

    #[test]
    fn negative_seek_rejected() {
        let mut cursor = ByteCursor::from_slice(&[0u8; 4]);
        assert!(matches!(
            cursor.seek_signed(-1),
            Err(WireError::InvalidSeek { target: -1 })
        ));
    }

    #[test]
    fn wraps_reader_at_current_position() {
        let mut inner = io::Cursor::new(vec![9u8, 8, 7, 6]);
        inner.set_position(2);
        let mut cursor = ByteCursor::new(inner).unwrap();
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.len(), 4);
        assert_eq!(cursor.read_bytes(2).unwrap(), vec![7, 6]);
    }

    #[test]
    fn oversized_count_fails_before_allocating() {
        let mut cursor = ByteCursor::from_slice(&[0u8; 2]);
        assert!(matches!(
            cursor.read_bytes(u64::MAX),
            Err(WireError::UnexpectedEof { needed: u64::MAX, .. })
        ));
    }
}
