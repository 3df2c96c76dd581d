/// Byte order of a fixed-width numeric value on the wire.
///
/// Little-endian is the default, matching the common case for
/// reverse-engineered PC file formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    pub fn is_little(self) -> bool {
        self == Self::Little
    }
}

/// A fixed-width numeric that converts to and from raw bytes in either
/// byte order.
///
/// `Bytes` is always a `[u8; N]` where `N` is the width of the type, so
/// callers can allocate the scratch buffer with `Default` and read
/// straight into it.
pub trait Scalar: Copy {
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default;

    /// Width on the wire in bytes.
    const WIDTH: usize;

    fn from_bytes(bytes: Self::Bytes, endian: Endian) -> Self;

    fn to_bytes(self, endian: Endian) -> Self::Bytes;
}

// ── Scalar impls ──────────────────────────────────────────────────────
//
// Every numeric type uses the same from_le/from_be pair from core, so
// one macro arm per type keeps the list readable.

macro_rules! scalar {
    ($($ty:ty => $width:literal),+ $(,)?) => {
        $(
            impl Scalar for $ty {
                type Bytes = [u8; $width];

                const WIDTH: usize = $width;

                fn from_bytes(bytes: Self::Bytes, endian: Endian) -> Self {
                    match endian {
                        Endian::Little => <$ty>::from_le_bytes(bytes),
                        Endian::Big => <$ty>::from_be_bytes(bytes),
                    }
                }

                fn to_bytes(self, endian: Endian) -> Self::Bytes {
                    match endian {
                        Endian::Little => self.to_le_bytes(),
                        Endian::Big => self.to_be_bytes(),
                    }
                }
            }
        )+
    };
}

scalar! {
    u8 => 1,
    i8 => 1,
    u16 => 2,
    i16 => 2,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
    f32 => 4,
    f64 => 8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_little_and_big() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(u32::from_bytes(bytes, Endian::Little), 0x0403_0201);
        assert_eq!(u32::from_bytes(bytes, Endian::Big), 0x0102_0304);
    }

    #[test]
    fn negative_i16_big_endian() {
        assert_eq!(i16::from_bytes([0xFF, 0xFE], Endian::Big), -2);
        assert_eq!((-2i16).to_bytes(Endian::Big), [0xFF, 0xFE]);
    }

    #[test]
    fn f64_bytes_follow_order() {
        let value = 1.5f64;
        let mut reversed = value.to_bytes(Endian::Little);
        reversed.reverse();
        assert_eq!(reversed, value.to_bytes(Endian::Big));
    }

    #[test]
    fn default_is_little() {
        assert!(Endian::default().is_little());
    }

    proptest::proptest! {
        // Reading big-endian over reversed bytes equals reading
        // little-endian over the original bytes.
        #[test]
        fn byte_order_mirror_u64(bytes in proptest::array::uniform8(proptest::num::u8::ANY)) {
            let mut reversed = bytes;
            reversed.reverse();
            proptest::prop_assert_eq!(
                u64::from_bytes(reversed, Endian::Big),
                u64::from_bytes(bytes, Endian::Little)
            );
        }

        #[test]
        fn byte_order_mirror_i32(bytes in proptest::array::uniform4(proptest::num::u8::ANY)) {
            let mut reversed = bytes;
            reversed.reverse();
            proptest::prop_assert_eq!(
                i32::from_bytes(reversed, Endian::Big),
                i32::from_bytes(bytes, Endian::Little)
            );
        }
    }
}
