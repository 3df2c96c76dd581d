//! Shared fixtures for the declbin integration tests, benches and the
//! golden generator.
//!
//! The `Archive` layout touches most of the engine in one structure:
//!
//! ```text
//! offset  field                       rule
//! ──────  ──────────────────────────  ─────────────────────────────────
//!  0      header.magic    u8[4]       fixed size
//!  4      header.version  u16         big-endian override
//!  6      header.entry_count u16
//!  8      header.table_offset u32
//! 12      here            u32         current offset, not read
//!  -      reserved        u32         internal, default 0
//! 12      note            string      NUL-terminated
//!  ?      entries         Entry[]     at table_offset(), entry_count long
//! ```

#![allow(clippy::pedantic)]

use declbin_schema::{
    BinaryLayout, EnumDef, EnumValue, FieldDescriptor, InstanceView, IntoRecord, Primitive,
    Record, SchemaError, SchemaRegistry, StructSchema, TypeRef, Value,
};

// ── Kind ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    File,
    Dir,
    Other(i64),
}

impl Kind {
    pub const NAME: &'static str = "Kind";

    pub fn def() -> Result<EnumDef, SchemaError> {
        Ok(EnumDef::new(Self::NAME, Primitive::U8)?
            .variant("File", 1)
            .variant("Dir", 2))
    }

    /// Register the enum unless another layout already did.
    pub fn register(registry: &mut SchemaRegistry) -> Result<(), SchemaError> {
        if registry.contains(Self::NAME) {
            return Ok(());
        }
        registry.register_enum(Self::def()?)
    }

    pub fn raw(self) -> i64 {
        match self {
            Self::File => 1,
            Self::Dir => 2,
            Self::Other(raw) => raw,
        }
    }

    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => Self::File,
            2 => Self::Dir,
            other => Self::Other(other),
        }
    }

    fn to_value(self) -> Value {
        let variant = match self {
            Self::File => Some("File".into()),
            Self::Dir => Some("Dir".into()),
            Self::Other(_) => None,
        };
        Value::Enum(EnumValue {
            type_name: Self::NAME.into(),
            variant,
            raw: self.raw(),
        })
    }
}

// ── Entry ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub kind: Kind,
    pub size: u32,
    pub name: String,
}

impl BinaryLayout for Entry {
    const NAME: &'static str = "Entry";

    fn schema() -> Result<StructSchema, SchemaError> {
        StructSchema::builder(Self::NAME)
            .field(FieldDescriptor::new("kind", TypeRef::named(Kind::NAME)))
            .field(FieldDescriptor::new("size", TypeRef::U32))
            .field(FieldDescriptor::new("name", TypeRef::String))
            .build()
    }

    fn register_dependencies(registry: &mut SchemaRegistry) -> Result<(), SchemaError> {
        Kind::register(registry)
    }

    fn from_record(mut record: Record) -> Result<Self, SchemaError> {
        let kind: EnumValue = record.take("kind")?;
        Ok(Self {
            kind: Kind::from_raw(kind.raw),
            size: record.take("size")?,
            name: record.take("name")?,
        })
    }
}

impl IntoRecord for Entry {
    fn to_record(&self) -> Record {
        Record::new(Self::NAME)
            .with("kind", self.kind.to_value())
            .with("size", self.size)
            .with("name", self.name.as_str())
    }
}

// ── Header ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: Vec<u8>,
    pub version: u16,
    pub entry_count: u16,
    pub table_offset: u32,
}

impl Header {
    pub const MAGIC: &'static [u8; 4] = b"DBAR";
}

impl BinaryLayout for Header {
    const NAME: &'static str = "Header";

    fn schema() -> Result<StructSchema, SchemaError> {
        StructSchema::builder(Self::NAME)
            .field(FieldDescriptor::new("magic", TypeRef::bytes()).fixed_size(4))
            .field(FieldDescriptor::new("version", TypeRef::U16).big_endian())
            .field(FieldDescriptor::new("entry_count", TypeRef::U16))
            .field(FieldDescriptor::new("table_offset", TypeRef::U32))
            .build()
    }

    fn from_record(mut record: Record) -> Result<Self, SchemaError> {
        Ok(Self {
            magic: record.take("magic")?,
            version: record.take("version")?,
            entry_count: record.take("entry_count")?,
            table_offset: record.take("table_offset")?,
        })
    }
}

impl IntoRecord for Header {
    fn to_record(&self) -> Record {
        Record::new(Self::NAME)
            .with("magic", Value::Bytes(self.magic.clone()))
            .with("version", self.version)
            .with("entry_count", self.entry_count)
            .with("table_offset", self.table_offset)
    }
}

// ── Archive ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Archive {
    pub header: Header,
    pub here: u32,
    pub reserved: u32,
    pub note: String,
    pub entries: Vec<Entry>,
}

/// Integer field of the nested header, for the `entry_count` property and
/// the `table_offset()` method.
fn header_field(view: &InstanceView<'_>, name: &str) -> Result<i64, SchemaError> {
    match view.value("header")? {
        Value::Struct(header) => header
            .get(name)
            .ok_or_else(|| SchemaError::MissingField {
                type_name: Header::NAME.to_string(),
                field: name.to_string(),
            })?
            .to_i64(name),
        other => Err(SchemaError::NotAnInteger {
            member: "header".to_string(),
            found: other.kind().to_string(),
        }),
    }
}

impl BinaryLayout for Archive {
    const NAME: &'static str = "Archive";

    fn schema() -> Result<StructSchema, SchemaError> {
        StructSchema::builder(Self::NAME)
            .property("entry_count", |view| header_field(view, "entry_count"))
            .method("table_offset", |view| header_field(view, "table_offset"))
            .field(FieldDescriptor::new("header", TypeRef::named(Header::NAME)))
            .field(FieldDescriptor::new("here", TypeRef::U32).current_offset())
            .field(FieldDescriptor::new("reserved", TypeRef::U32).internal())
            .field(FieldDescriptor::new("note", TypeRef::String))
            .field(
                FieldDescriptor::new("entries", TypeRef::array_of(TypeRef::named(Entry::NAME)))
                    .size_from("entry_count")
                    .offset_from("table_offset()"),
            )
            .build()
    }

    fn register_dependencies(registry: &mut SchemaRegistry) -> Result<(), SchemaError> {
        registry.register::<Header>()?;
        registry.register::<Entry>()
    }

    fn from_record(mut record: Record) -> Result<Self, SchemaError> {
        Ok(Self {
            header: record.nested("header")?,
            here: record.take("here")?,
            reserved: record.take("reserved")?,
            note: record.take("note")?,
            entries: record.list("entries")?,
        })
    }
}

impl IntoRecord for Archive {
    fn to_record(&self) -> Record {
        let entries = self
            .entries
            .iter()
            .map(|e| Value::Struct(e.to_record()))
            .collect::<Vec<_>>();
        Record::new(Self::NAME)
            .with("header", self.header.to_record())
            .with("here", self.here)
            .with("reserved", self.reserved)
            .with("note", self.note.as_str())
            .with("entries", Value::Array(entries))
    }
}

/// The archive whose encoding is [`SAMPLE_ARCHIVE_BYTES`].
pub fn sample_archive() -> Archive {
    Archive {
        header: Header {
            magic: Header::MAGIC.to_vec(),
            version: 1,
            entry_count: 2,
            table_offset: 16,
        },
        here: 12,
        reserved: 0,
        note: "hi".to_string(),
        entries: vec![
            Entry {
                kind: Kind::File,
                size: 512,
                name: "a.txt".to_string(),
            },
            Entry {
                kind: Kind::Dir,
                size: 0,
                name: "docs".to_string(),
            },
        ],
    }
}

/// Hand-assembled little-endian encoding of [`sample_archive`]. The
/// inline region ends at 15; byte 15 is padding before the table.
pub const SAMPLE_ARCHIVE_BYTES: [u8; 37] = [
    b'D', b'B', b'A', b'R', // magic
    0x00, 0x01, // version (big-endian)
    0x02, 0x00, // entry_count
    0x10, 0x00, 0x00, 0x00, // table_offset
    b'h', b'i', 0x00, // note
    0x00, // padding
    0x01, 0x00, 0x02, 0x00, 0x00, b'a', b'.', b't', b'x', b't', 0x00, // File, 512, "a.txt"
    0x02, 0x00, 0x00, 0x00, 0x00, b'd', b'o', b'c', b's', 0x00, // Dir, 0, "docs"
];

// ── Discriminated payloads ────────────────────────────────────────────────────

/// Payload selected when the tag is 0: one little-endian u16.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeA {
    pub value: u16,
}

impl BinaryLayout for TypeA {
    const NAME: &'static str = "TypeA";

    fn schema() -> Result<StructSchema, SchemaError> {
        StructSchema::builder(Self::NAME)
            .field(FieldDescriptor::new("value", TypeRef::U16))
            .build()
    }

    fn from_record(mut record: Record) -> Result<Self, SchemaError> {
        Ok(Self {
            value: record.take("value")?,
        })
    }
}

/// Payload selected when the tag is 1: a u32 and a string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeB {
    pub id: u32,
    pub label: String,
}

impl BinaryLayout for TypeB {
    const NAME: &'static str = "TypeB";

    fn schema() -> Result<StructSchema, SchemaError> {
        StructSchema::builder(Self::NAME)
            .field(FieldDescriptor::new("id", TypeRef::U32))
            .field(FieldDescriptor::new("label", TypeRef::String))
            .build()
    }

    fn from_record(mut record: Record) -> Result<Self, SchemaError> {
        Ok(Self {
            id: record.take("id")?,
            label: record.take("label")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    A(TypeA),
    B(TypeB),
}

/// `{tag: u8, payload}` where the tag selects the payload type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tagged {
    pub tag: u8,
    pub payload: Payload,
}

impl BinaryLayout for Tagged {
    const NAME: &'static str = "Tagged";

    fn schema() -> Result<StructSchema, SchemaError> {
        StructSchema::builder(Self::NAME)
            .field(FieldDescriptor::new("tag", TypeRef::U8))
            .field(
                FieldDescriptor::new("payload", TypeRef::named(TypeA::NAME))
                    .read_as("tag", 0, TypeRef::named(TypeA::NAME))
                    .read_as("tag", 1, TypeRef::named(TypeB::NAME)),
            )
            .build()
    }

    fn register_dependencies(registry: &mut SchemaRegistry) -> Result<(), SchemaError> {
        registry.register::<TypeA>()?;
        registry.register::<TypeB>()
    }

    fn from_record(mut record: Record) -> Result<Self, SchemaError> {
        let tag = record.take("tag")?;
        let payload: Record = record.take("payload")?;
        let payload = if payload.type_name() == TypeB::NAME {
            Payload::B(TypeB::from_record(payload)?)
        } else {
            Payload::A(TypeA::from_record(payload)?)
        };
        Ok(Self { tag, payload })
    }
}

impl IntoRecord for Tagged {
    fn to_record(&self) -> Record {
        let payload = match &self.payload {
            Payload::A(a) => Record::new(TypeA::NAME).with("value", a.value),
            Payload::B(b) => Record::new(TypeB::NAME)
                .with("id", b.id)
                .with("label", b.label.as_str()),
        };
        Record::new(Self::NAME)
            .with("tag", self.tag)
            .with("payload", payload)
    }
}

// ── JSON schema document ──────────────────────────────────────────────────────

/// The `Archive` layout as a JSON schema document, for the CLI and for
/// checking that documents and builder code agree.
///
/// JSON cannot carry the `entry_count` property or `table_offset()`
/// method, so the document flattens the header into the root.
pub const ARCHIVE_SCHEMA_JSON: &str = r#"{
  "root": "FlatArchive",
  "enums": [
    { "name": "Kind", "repr": "u8", "variants": { "File": 1, "Dir": 2 } }
  ],
  "structs": [
    { "name": "Entry",
      "fields": [
        { "name": "kind", "type": "Kind" },
        { "name": "size", "type": "u32" },
        { "name": "name", "type": "string" }
      ] },
    { "name": "FlatArchive",
      "fields": [
        { "name": "magic", "type": "u8[]", "size": 4 },
        { "name": "version", "type": "u16", "endian": "big" },
        { "name": "entry_count", "type": "u16" },
        { "name": "table_offset", "type": "u32" },
        { "name": "here", "type": "u32", "current_offset": true },
        { "name": "reserved", "type": "u32", "skip": true },
        { "name": "note", "type": "string" },
        { "name": "entries", "type": "Entry[]", "size": "entry_count", "offset": "table_offset" }
      ] }
  ]
}"#;
