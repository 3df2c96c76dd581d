use declbin_wire::Endian;

/// Configuration for [`LayoutEncoder`](crate::LayoutEncoder).
///
/// `endian` applies to fields with no field- or type-level byte order,
/// and must match the decoder's setting for a round trip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncoderConfig {
    pub endian: Endian,
}
