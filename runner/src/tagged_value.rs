use std::cmp::Ordering;

use derive_more::Display;
use plonky2::field::types::{Field, PrimeField};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tag::Tag;
use crate::util::{fe_from_u128, fe_low_u128, fe_to_u128, low_mask, FieldElement};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("operands carry different tags: {lhs} and {rhs}")]
    TagMismatch { lhs: Tag, rhs: Tag },
    #[error("division by zero")]
    DivisionByZero,
    #[error("{op} is not defined on {tag} operands")]
    InvalidOperationTag { op: &'static str, tag: Tag },
    #[error("value {value} does not fit tag {tag}")]
    ValueOutOfRange { tag: Tag, value: FieldElement },
    #[error("range check rejected {value} as wider than {bits} bits")]
    RangeCheckFailed { value: u128, bits: u8 },
}

/// A field element paired with its type tag.
///
/// Integer tagged values always fit the width of their tag; the constructors
/// below are the only way to build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[display("{tag}({value})")]
pub struct TaggedValue {
    tag: Tag,
    value: FieldElement,
}

#[allow(clippy::should_implement_trait)]
impl TaggedValue {
    /// Tag `value`, failing when it does not fit.
    pub fn from_tag(tag: Tag, value: FieldElement) -> Result<Self, TagError> {
        match tag.max_value() {
            Some(max) if fe_to_u128(value).map_or(true, |v| v > max) =>
                Err(TagError::ValueOutOfRange { tag, value }),
            _ => Ok(Self { tag, value }),
        }
    }

    /// Tag `value`, reducing it modulo `2^bits` of the tag.
    #[must_use]
    pub fn from_tag_truncating(tag: Tag, value: FieldElement) -> Self {
        match tag.max_value() {
            None => Self { tag, value },
            Some(max) => Self::integer(tag, fe_low_u128(value) & max),
        }
    }

    pub fn from_u128(tag: Tag, value: u128) -> Result<Self, TagError> {
        Self::from_tag(tag, fe_from_u128(value))
    }

    #[must_use]
    pub fn field(value: FieldElement) -> Self {
        Self {
            tag: Tag::Field,
            value,
        }
    }

    #[must_use]
    pub fn u1(value: bool) -> Self { Self::integer(Tag::U1, u128::from(value)) }

    #[must_use]
    pub fn u8(value: u8) -> Self { Self::integer(Tag::U8, u128::from(value)) }

    #[must_use]
    pub fn u16(value: u16) -> Self { Self::integer(Tag::U16, u128::from(value)) }

    #[must_use]
    pub fn u32(value: u32) -> Self { Self::integer(Tag::U32, u128::from(value)) }

    #[must_use]
    pub fn u64(value: u64) -> Self { Self::integer(Tag::U64, u128::from(value)) }

    #[must_use]
    pub fn u128(value: u128) -> Self { Self::integer(Tag::U128, value) }

    /// Caller guarantees `value` fits `tag`.
    fn integer(tag: Tag, value: u128) -> Self {
        Self {
            tag,
            value: fe_from_u128(value),
        }
    }

    #[must_use]
    pub fn tag(&self) -> Tag { self.tag }

    #[must_use]
    pub fn value(&self) -> FieldElement { self.value }

    /// The value as a `u128`; always `Some` for integer tags.
    #[must_use]
    pub fn as_u128(&self) -> Option<u128> { fe_to_u128(self.value) }

    /// Integer payload.  For `Field` operands this is only the low 128 bits,
    /// so callers must have rejected `Field` first.
    fn bits(&self) -> u128 { fe_low_u128(self.value) }

    fn mask(&self) -> u128 { low_mask(u32::from(self.tag.bits())) }

    fn matching_tag(&self, rhs: &Self) -> Result<Tag, TagError> {
        if self.tag == rhs.tag {
            Ok(self.tag)
        } else {
            Err(TagError::TagMismatch {
                lhs: self.tag,
                rhs: rhs.tag,
            })
        }
    }

    fn integer_only(&self, op: &'static str) -> Result<(), TagError> {
        if self.tag.is_field() {
            Err(TagError::InvalidOperationTag { op, tag: self.tag })
        } else {
            Ok(())
        }
    }

    fn wrapping(
        &self,
        rhs: &Self,
        on_field: impl FnOnce(FieldElement, FieldElement) -> FieldElement,
        on_integer: impl FnOnce(u128, u128) -> u128,
    ) -> Result<Self, TagError> {
        let tag = self.matching_tag(rhs)?;
        Ok(if tag.is_field() {
            Self::field(on_field(self.value, rhs.value))
        } else {
            Self::integer(tag, on_integer(self.bits(), rhs.bits()) & self.mask())
        })
    }

    pub fn add(&self, rhs: &Self) -> Result<Self, TagError> {
        self.wrapping(rhs, |a, b| a + b, u128::wrapping_add)
    }

    pub fn sub(&self, rhs: &Self) -> Result<Self, TagError> {
        self.wrapping(rhs, |a, b| a - b, u128::wrapping_sub)
    }

    pub fn mul(&self, rhs: &Self) -> Result<Self, TagError> {
        self.wrapping(rhs, |a, b| a * b, u128::wrapping_mul)
    }

    /// Integer division, rounding towards zero.
    pub fn div(&self, rhs: &Self) -> Result<Self, TagError> {
        let tag = self.matching_tag(rhs)?;
        if rhs.value.is_zero() {
            return Err(TagError::DivisionByZero);
        }
        self.integer_only("DIV")?;
        Ok(Self::integer(tag, self.bits() / rhs.bits()))
    }

    /// Field division.
    pub fn fdiv(&self, rhs: &Self) -> Result<Self, TagError> {
        let tag = self.matching_tag(rhs)?;
        let inverse = rhs.value.try_inverse().ok_or(TagError::DivisionByZero)?;
        if !tag.is_field() {
            return Err(TagError::InvalidOperationTag { op: "FDIV", tag });
        }
        Ok(Self::field(self.value * inverse))
    }

    fn compare(&self, rhs: &Self) -> Result<Ordering, TagError> {
        let tag = self.matching_tag(rhs)?;
        Ok(if tag.is_field() {
            self.value
                .to_canonical_biguint()
                .cmp(&rhs.value.to_canonical_biguint())
        } else {
            self.bits().cmp(&rhs.bits())
        })
    }

    pub fn eq(&self, rhs: &Self) -> Result<Self, TagError> {
        self.matching_tag(rhs)?;
        Ok(Self::u1(self.value == rhs.value))
    }

    pub fn lt(&self, rhs: &Self) -> Result<Self, TagError> {
        Ok(Self::u1(self.compare(rhs)? == Ordering::Less))
    }

    pub fn lte(&self, rhs: &Self) -> Result<Self, TagError> {
        Ok(Self::u1(self.compare(rhs)? != Ordering::Greater))
    }

    pub fn not(&self) -> Result<Self, TagError> {
        self.integer_only("NOT")?;
        Ok(Self::integer(self.tag, !self.bits() & self.mask()))
    }

    /// Shift amount, or `None` when it reaches the tag width.
    fn shift_amount(&self, rhs: &Self, op: &'static str) -> Result<Option<u32>, TagError> {
        self.matching_tag(rhs)?;
        self.integer_only(op)?;
        Ok(u32::try_from(rhs.bits())
            .ok()
            .filter(|&shift| shift < u32::from(self.tag.bits())))
    }

    pub fn shl(&self, rhs: &Self) -> Result<Self, TagError> {
        let shifted = self
            .shift_amount(rhs, "SHL")?
            .map_or(0, |shift| (self.bits() << shift) & self.mask());
        Ok(Self::integer(self.tag, shifted))
    }

    pub fn shr(&self, rhs: &Self) -> Result<Self, TagError> {
        let shifted = self
            .shift_amount(rhs, "SHR")?
            .map_or(0, |shift| self.bits() >> shift);
        Ok(Self::integer(self.tag, shifted))
    }
}

#[cfg(test)]
mod tests {
    use plonky2::field::types::Field;
    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;
    use crate::test_utils::tagged_value_pair;

    #[test]
    fn checked_constructor_rejects_wide_values() {
        assert_eq!(
            TaggedValue::from_u128(Tag::U8, 256),
            Err(TagError::ValueOutOfRange {
                tag: Tag::U8,
                value: fe_from_u128(256)
            })
        );
        assert_eq!(TaggedValue::from_u128(Tag::U8, 255), Ok(TaggedValue::u8(255)));
        assert!(TaggedValue::from_tag(Tag::U128, FieldElement::NEG_ONE).is_err());
        assert!(TaggedValue::from_tag(Tag::Field, FieldElement::NEG_ONE).is_ok());
    }

    #[test]
    fn truncating_constructor_reduces() {
        assert_eq!(
            TaggedValue::from_tag_truncating(Tag::U8, fe_from_u128(0x1234)),
            TaggedValue::u8(0x34)
        );
        assert_eq!(
            TaggedValue::from_tag_truncating(Tag::U1, fe_from_u128(3)),
            TaggedValue::u1(true)
        );
        assert_eq!(
            TaggedValue::from_tag_truncating(Tag::Field, FieldElement::NEG_ONE).value(),
            FieldElement::NEG_ONE
        );
    }

    #[test]
    fn default_is_field_zero() {
        let zero = TaggedValue::default();
        assert_eq!(zero.tag(), Tag::Field);
        assert!(zero.value().is_zero());
    }

    #[test_case(TaggedValue::u8(200), TaggedValue::u8(100), TaggedValue::u8(44); "u8 wraps")]
    #[test_case(TaggedValue::u1(true), TaggedValue::u1(true), TaggedValue::u1(false); "u1 wraps")]
    #[test_case(TaggedValue::u128(u128::MAX), TaggedValue::u128(2), TaggedValue::u128(1); "u128 wraps")]
    fn add_wraps(a: TaggedValue, b: TaggedValue, sum: TaggedValue) {
        assert_eq!(a.add(&b), Ok(sum));
    }

    #[test]
    fn field_arithmetic_uses_the_field() {
        let minus_one = TaggedValue::field(FieldElement::NEG_ONE);
        let one = TaggedValue::field(FieldElement::ONE);
        assert_eq!(minus_one.add(&one), Ok(TaggedValue::field(FieldElement::ZERO)));
        assert_eq!(
            TaggedValue::field(FieldElement::ZERO).sub(&one),
            Ok(minus_one)
        );
        assert_eq!(minus_one.mul(&minus_one), Ok(one));
    }

    #[test]
    fn sub_and_mul_wrap() {
        assert_eq!(
            TaggedValue::u16(1).sub(&TaggedValue::u16(2)),
            Ok(TaggedValue::u16(u16::MAX))
        );
        assert_eq!(
            TaggedValue::u32(1 << 31).mul(&TaggedValue::u32(4)),
            Ok(TaggedValue::u32(0))
        );
        assert_eq!(
            TaggedValue::u128(u128::MAX).mul(&TaggedValue::u128(u128::MAX)),
            Ok(TaggedValue::u128(1))
        );
    }

    #[test]
    fn mixed_tags_are_rejected() {
        let mismatch = Err(TagError::TagMismatch {
            lhs: Tag::U8,
            rhs: Tag::U16,
        });
        let (a, b) = (TaggedValue::u8(1), TaggedValue::u16(1));
        assert_eq!(a.add(&b), mismatch);
        assert_eq!(a.sub(&b), mismatch);
        assert_eq!(a.mul(&b), mismatch);
        assert_eq!(a.div(&b), mismatch);
        assert_eq!(a.eq(&b), mismatch);
        assert_eq!(a.lt(&b), mismatch);
        assert_eq!(a.lte(&b), mismatch);
        assert_eq!(a.shl(&b), mismatch);
    }

    #[test]
    fn division() {
        assert_eq!(
            TaggedValue::u32(17).div(&TaggedValue::u32(5)),
            Ok(TaggedValue::u32(3))
        );
        assert_eq!(
            TaggedValue::u32(17).div(&TaggedValue::u32(0)),
            Err(TagError::DivisionByZero)
        );
        assert_eq!(
            TaggedValue::field(FieldElement::ONE).div(&TaggedValue::field(FieldElement::ONE)),
            Err(TagError::InvalidOperationTag {
                op: "DIV",
                tag: Tag::Field
            })
        );
    }

    #[test]
    fn field_division() {
        let six = TaggedValue::field(FieldElement::from_canonical_u64(6));
        let three = TaggedValue::field(FieldElement::from_canonical_u64(3));
        let two = TaggedValue::field(FieldElement::TWO);
        assert_eq!(six.fdiv(&three), Ok(two));
        assert_eq!(
            six.fdiv(&TaggedValue::field(FieldElement::ZERO)),
            Err(TagError::DivisionByZero)
        );
        assert_eq!(
            TaggedValue::u8(6).fdiv(&TaggedValue::u8(3)),
            Err(TagError::InvalidOperationTag {
                op: "FDIV",
                tag: Tag::U8
            })
        );
    }

    #[test]
    fn comparisons_return_u1() {
        let (a, b) = (TaggedValue::u64(3), TaggedValue::u64(7));
        assert_eq!(a.eq(&b), Ok(TaggedValue::u1(false)));
        assert_eq!(a.eq(&a), Ok(TaggedValue::u1(true)));
        assert_eq!(a.lt(&b), Ok(TaggedValue::u1(true)));
        assert_eq!(b.lt(&a), Ok(TaggedValue::u1(false)));
        assert_eq!(a.lte(&a), Ok(TaggedValue::u1(true)));
        assert_eq!(b.lte(&a), Ok(TaggedValue::u1(false)));

        let big = TaggedValue::field(FieldElement::NEG_ONE);
        let small = TaggedValue::field(FieldElement::ONE);
        assert_eq!(small.lt(&big), Ok(TaggedValue::u1(true)));
    }

    #[test]
    fn bitwise_not() {
        assert_eq!(TaggedValue::u8(0x0F).not(), Ok(TaggedValue::u8(0xF0)));
        assert_eq!(TaggedValue::u1(false).not(), Ok(TaggedValue::u1(true)));
        assert_eq!(
            TaggedValue::field(FieldElement::ONE).not(),
            Err(TagError::InvalidOperationTag {
                op: "NOT",
                tag: Tag::Field
            })
        );
    }

    #[test]
    fn shifts() {
        assert_eq!(
            TaggedValue::u8(0b1001_0110).shl(&TaggedValue::u8(2)),
            Ok(TaggedValue::u8(0b0101_1000))
        );
        assert_eq!(
            TaggedValue::u8(0b1001_0110).shr(&TaggedValue::u8(2)),
            Ok(TaggedValue::u8(0b0010_0101))
        );
        assert_eq!(
            TaggedValue::u8(0xFF).shl(&TaggedValue::u8(8)),
            Ok(TaggedValue::u8(0))
        );
        assert_eq!(
            TaggedValue::u8(0xFF).shr(&TaggedValue::u8(200)),
            Ok(TaggedValue::u8(0))
        );
        assert_eq!(
            TaggedValue::u128(1).shl(&TaggedValue::u128(127)),
            Ok(TaggedValue::u128(1 << 127))
        );
        assert_eq!(
            TaggedValue::field(FieldElement::ONE).shr(&TaggedValue::field(FieldElement::ONE)),
            Err(TagError::InvalidOperationTag {
                op: "SHR",
                tag: Tag::Field
            })
        );
    }

    proptest! {
        #[test]
        fn integer_results_stay_within_their_tag((a, b) in tagged_value_pair()) {
            for result in [a.add(&b), a.sub(&b), a.mul(&b), a.shl(&b), a.shr(&b)]
                .into_iter()
                .flatten()
            {
                prop_assert_eq!(result.tag(), a.tag());
                prop_assert!(TaggedValue::from_tag(result.tag(), result.value()).is_ok());
            }
        }

        #[test]
        fn add_then_sub_is_identity((a, b) in tagged_value_pair()) {
            prop_assert_eq!(a.add(&b).and_then(|sum| sum.sub(&b)), Ok(a));
        }
    }
}
