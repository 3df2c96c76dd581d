use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use declbin_schema::{BinaryLayout, Record, SchemaError, SchemaRegistry, registry_for};
use declbin_wire::ByteCursor;
use tracing::debug;

use crate::config::DecoderConfig;
use crate::engine::DecodeContext;
use crate::error::{DecodeError, FieldContext};

/// One decoded root record and the byte range it covered.
///
/// `end` is the position right after the record's inline fields, which
/// is where the next record in the stream would begin, even if deferred
/// fields were read from further on.
///
/// ```text
///   0        start              end            stream_len
///   ├────────┼─── inline fields ─┼──────────────┤
///                     ▲ deferred fields may live anywhere
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedRecord {
    pub record: Record,
    pub start: u64,
    pub end: u64,
    pub stream_len: u64,
}

impl DecodedRecord {
    /// Bytes after `end` that the root record did not consume inline.
    pub fn trailing_bytes(&self) -> u64 {
        self.stream_len.saturating_sub(self.end)
    }
}

/// Schema-driven decoder.
///
/// Typed entry points build the layout of `T` once per process (see
/// [`registry_for`]) and decode a single instance from the start of the
/// source. The dynamic entry point,
/// [`decode_record`](Self::decode_record), decodes any registered type
/// from a caller-owned cursor.
///
/// # Example
///
/// ```rust
/// use declbin_decoder::LayoutDecoder;
/// use declbin_schema::{BinaryLayout, FieldDescriptor, Record, SchemaError, StructSchema, TypeRef};
///
/// struct Items { count: u32, items: Vec<u8> }
///
/// impl BinaryLayout for Items {
///     const NAME: &'static str = "Items";
///
///     fn schema() -> Result<StructSchema, SchemaError> {
///         StructSchema::builder(Self::NAME)
///             .field(FieldDescriptor::new("count", TypeRef::U32))
///             .field(FieldDescriptor::new("items", TypeRef::bytes()).size_from("count"))
///             .build()
///     }
///
///     fn from_record(mut record: Record) -> Result<Self, SchemaError> {
///         Ok(Self { count: record.take("count")?, items: record.take("items")? })
///     }
/// }
///
/// let decoded: Items = LayoutDecoder::new()
///     .decode_bytes(&[0x03, 0, 0, 0, 0xAA, 0xBB, 0xCC])
///     .unwrap();
/// assert_eq!(decoded.count, 3);
/// assert_eq!(decoded.items, [0xAA, 0xBB, 0xCC]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct LayoutDecoder {
    config: DecoderConfig,
}

impl LayoutDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one `T` from the start of an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`]; see [`decode_record`](Self::decode_record).
    pub fn decode_bytes<T: BinaryLayout>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        let mut cursor = ByteCursor::from_slice(bytes);
        self.decode_from_cursor(&mut cursor)
    }

    /// Decode one `T` from a seekable reader, starting at its current
    /// position.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Io`] if the stream length cannot be determined,
    /// otherwise as [`decode_record`](Self::decode_record).
    pub fn decode_reader<T: BinaryLayout, R: Read + Seek>(&self, reader: R) -> Result<T, DecodeError> {
        let mut cursor = ByteCursor::new(reader)
            .map_err(|e| DecodeError::wire(e, FieldContext::new(T::NAME, "", 0)))?;
        self.decode_from_cursor(&mut cursor)
    }

    /// Decode one `T` from a file. The file is opened once and closed
    /// when this call returns, whether or not decoding succeeded.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Io`] if the file cannot be opened, otherwise as
    /// [`decode_reader`](Self::decode_reader).
    pub fn decode_file<T: BinaryLayout>(&self, path: impl AsRef<Path>) -> Result<T, DecodeError> {
        let file = File::open(path.as_ref()).map_err(|source| DecodeError::Io {
            source,
            context: FieldContext::new(T::NAME, "", 0),
        })?;
        self.decode_reader(BufReader::new(file))
    }

    /// Decode one `T` at the cursor, leaving the cursor right after the
    /// record's inline region.
    ///
    /// # Errors
    ///
    /// As [`decode_record`](Self::decode_record), plus
    /// [`DecodeError::Schema`] if the record does not convert into `T`.
    pub fn decode_from_cursor<T: BinaryLayout, R: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<R>,
    ) -> Result<T, DecodeError> {
        let registry = typed_registry::<T>(cursor.position())?;
        let decoded = self.decode_record(&registry, T::NAME, cursor)?;
        T::from_record(decoded.record).map_err(|source| {
            DecodeError::schema(source, FieldContext::new(T::NAME, "", decoded.start))
        })
    }

    /// Decode the registered structured type `root` at the cursor.
    ///
    /// On success the cursor sits at [`DecodedRecord::end`]. On failure the
    /// cursor position is unspecified and nothing partial is returned.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Schema`] for unresolvable members, negative
    ///   counts, or nesting past [`DecoderConfig::max_depth`].
    /// - [`DecodeError::UnsupportedType`] if `root` or a field type has no
    ///   decode rule.
    /// - [`DecodeError::TruncatedInput`] if the stream ends early.
    /// - [`DecodeError::Io`] for source failures and negative offsets.
    pub fn decode_record<R: Read + Seek>(
        &self,
        registry: &SchemaRegistry,
        root: &str,
        cursor: &mut ByteCursor<R>,
    ) -> Result<DecodedRecord, DecodeError> {
        let start = cursor.position();
        let stream_len = cursor.len();
        debug!(root, start, stream_len, "decode started");

        let record = DecodeContext::new(registry, cursor, &self.config).decode_named_struct(root)?;

        let end = cursor.position();
        debug!(root, start, end, "decode finished");
        Ok(DecodedRecord {
            record,
            start,
            end,
            stream_len,
        })
    }

    /// Iterate over consecutive `T` records until the end of the stream.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Schema`] if the layout of `T` is invalid, or
    /// [`DecodeError::Io`] if the stream length cannot be determined.
    pub fn records<T: BinaryLayout, R: Read + Seek>(&self, reader: R) -> Result<Records<T, R>, DecodeError> {
        let cursor = ByteCursor::new(reader)
            .map_err(|e| DecodeError::wire(e, FieldContext::new(T::NAME, "", 0)))?;
        let registry = typed_registry::<T>(cursor.position())?;
        Ok(Records {
            decoder: self.clone(),
            registry,
            cursor,
            done: false,
            _marker: PhantomData,
        })
    }

    /// [`records`](Self::records) over an in-memory buffer.
    ///
    /// # Errors
    ///
    /// As [`records`](Self::records).
    pub fn records_in<'a, T: BinaryLayout>(
        &self,
        bytes: &'a [u8],
    ) -> Result<Records<T, Cursor<&'a [u8]>>, DecodeError> {
        self.records(Cursor::new(bytes))
    }
}

fn typed_registry<T: BinaryLayout>(offset: u64) -> Result<Arc<SchemaRegistry>, DecodeError> {
    registry_for::<T>().map_err(|source: SchemaError| {
        DecodeError::schema(source, FieldContext::new(T::NAME, "", offset))
    })
}

/// Decode one `T` from a seekable source with the default configuration
/// (little-endian).
///
/// # Errors
///
/// See [`LayoutDecoder::decode_reader`].
pub fn decode<T: BinaryLayout>(source: impl Read + Seek) -> Result<T, DecodeError> {
    LayoutDecoder::new().decode_reader(source)
}

/// Iterator over consecutive records of one type, created by
/// [`LayoutDecoder::records`].
///
/// Stops at end-of-stream. After the first error it yields nothing more.
pub struct Records<T, R> {
    decoder: LayoutDecoder,
    registry: Arc<SchemaRegistry>,
    cursor: ByteCursor<R>,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: BinaryLayout, R: Read + Seek> Records<T, R> {
    /// Current position in the underlying stream.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }
}

impl<T: BinaryLayout, R: Read + Seek> Iterator for Records<T, R> {
    type Item = Result<T, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor.is_eof() {
            return None;
        }

        let result = self
            .decoder
            .decode_record(&self.registry, T::NAME, &mut self.cursor)
            .and_then(|decoded| {
                // A record with no inline bytes would repeat forever.
                if decoded.end == decoded.start {
                    self.done = true;
                }
                T::from_record(decoded.record).map_err(|source| {
                    DecodeError::schema(source, FieldContext::new(T::NAME, "", decoded.start))
                })
            });
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}
