//! Leaf formatting shared by the text renderers.

use declbin_schema::Value;

/// Type label shown next to a field name.
pub(crate) fn type_label(value: &Value) -> String {
    match value {
        Value::Bytes(bytes) => format!("u8[{}]", bytes.len()),
        Value::Array(items) => format!("array[{}]", items.len()),
        Value::Enum(e) => e.type_name.to_string(),
        Value::Struct(record) => record.type_name().to_string(),
        other => other.kind().to_string(),
    }
}

/// Text of a leaf value, or `None` for arrays and structs.
pub(crate) fn leaf_text(value: &Value, max_bytes: usize) -> Option<String> {
    Some(match value {
        Value::U8(v) => v.to_string(),
        Value::I8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Bytes(bytes) => hex_preview(bytes, max_bytes),
        Value::Enum(e) => match &e.variant {
            Some(variant) => format!("{variant} ({})", e.raw),
            None => e.raw.to_string(),
        },
        Value::Array(_) | Value::Struct(_) => return None,
    })
}

/// Lowercase hex of at most `max_bytes` bytes, with a `…(+N)` marker for
/// the rest. `max_bytes == 0` shows everything.
pub(crate) fn hex_preview(bytes: &[u8], max_bytes: usize) -> String {
    if max_bytes == 0 || bytes.len() <= max_bytes {
        return hex::encode(bytes);
    }
    format!(
        "{}…(+{})",
        hex::encode(&bytes[..max_bytes]),
        bytes.len() - max_bytes
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_preview_truncates() {
        assert_eq!(hex_preview(&[0xAA, 0xBB, 0xCC], 2), "aabb…(+1)");
        assert_eq!(hex_preview(&[0xAA, 0xBB], 2), "aabb");
        assert_eq!(hex_preview(&[0x01; 20], 0).len(), 40);
    }
}
