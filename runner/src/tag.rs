use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::util::{fe_from_u64, fe_to_u128, low_mask, FieldElement};

/// Type tag carried by every memory value.
///
/// The discriminants are the on-trace encoding of the tag column, so their
/// order is fixed.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Tag {
    #[default]
    Field = 0,
    U1 = 1,
    U8 = 2,
    U16 = 3,
    U32 = 4,
    U64 = 5,
    U128 = 6,
}

impl Tag {
    pub const ALL: [Tag; 7] = [
        Tag::Field,
        Tag::U1,
        Tag::U8,
        Tag::U16,
        Tag::U32,
        Tag::U64,
        Tag::U128,
    ];

    /// Bit-width of values carrying this tag.  `Field` has no width and
    /// reports 0.
    #[must_use]
    pub fn bits(self) -> u8 {
        match self {
            Tag::Field => 0,
            Tag::U1 => 1,
            Tag::U8 => 8,
            Tag::U16 => 16,
            Tag::U32 => 32,
            Tag::U64 => 64,
            Tag::U128 => 128,
        }
    }

    #[must_use]
    pub fn is_field(self) -> bool { self == Tag::Field }

    /// Largest value of an integer tag, `None` for `Field`.
    #[must_use]
    pub fn max_value(self) -> Option<u128> {
        (!self.is_field()).then(|| low_mask(u32::from(self.bits())))
    }

    /// The tag column encoding.
    #[must_use]
    pub fn as_fe(self) -> FieldElement { fe_from_u64(u64::from(self as u8)) }

    /// Decode a tag column entry.
    #[must_use]
    pub fn from_fe(x: FieldElement) -> Option<Tag> {
        fe_to_u128(x)
            .and_then(|raw| u8::try_from(raw).ok())
            .and_then(|raw| Tag::try_from(raw).ok())
    }
}

impl TryFrom<u8> for Tag {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Tag::ALL.get(usize::from(raw)).copied().ok_or(raw)
    }
}
