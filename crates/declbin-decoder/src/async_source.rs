use declbin_schema::BinaryLayout;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::decoder::LayoutDecoder;
use crate::error::{DecodeError, FieldContext};

impl LayoutDecoder {
    /// Decode one `T` from an async byte stream.
    ///
    /// Deferred fields can seek anywhere in the stream, so the whole
    /// stream is buffered before decoding starts.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Io`] if reading the stream fails, otherwise as
    /// [`decode_bytes`](Self::decode_bytes).
    pub async fn decode_async<T, R>(&self, mut reader: R) -> Result<T, DecodeError>
    where
        T: BinaryLayout,
        R: AsyncRead + Unpin,
    {
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .map_err(|source| DecodeError::Io {
                source,
                context: FieldContext::new(T::NAME, "", 0),
            })?;
        self.decode_bytes(&buf)
    }
}
