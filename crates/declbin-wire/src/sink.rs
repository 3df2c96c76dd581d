use crate::endian::{Endian, Scalar};

/// Growable, seekable output buffer, the write-side mirror of
/// [`ByteCursor`](crate::ByteCursor).
///
/// Writes overwrite bytes already present at the current position and
/// extend the buffer when they run past the end. Seeking beyond the end
/// zero-fills the gap, so data placed at an absolute offset always lands
/// where a reader seeking to that offset will look for it.
#[derive(Clone, Debug, Default)]
pub struct ByteSink {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Move to an absolute offset, zero-extending the buffer if needed.
    pub fn seek_to(&mut self, offset: usize) {
        if offset > self.buf.len() {
            self.buf.resize(offset, 0);
        }
        self.pos = offset;
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    pub fn write_scalar<T: Scalar>(&mut self, value: T, endian: Endian) {
        self.write_bytes(value.to_bytes(endian).as_ref());
    }

    /// Write `bytes` followed by a single NUL terminator.
    pub fn write_cstring(&mut self, bytes: &[u8]) {
        self.write_bytes(bytes);
        self.write_bytes(&[0]);
    }

    /// Zero-pad up to the next multiple of `boundary`. Returns the number
    /// of padding bytes written.
    pub fn align_to(&mut self, boundary: u32) -> usize {
        let boundary = boundary as usize;
        if boundary <= 1 {
            return 0;
        }
        let rem = self.pos % boundary;
        if rem == 0 {
            return 0;
        }
        let padding = boundary - rem;
        self.write_bytes(&vec![0u8; padding]);
        padding
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
