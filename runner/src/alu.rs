//! Tagged arithmetic with its auxiliary decompositions handed to a
//! [`RangeCheck`].

use crate::rangecheck::RangeCheck;
use crate::tag::Tag;
use crate::tagged_value::{TagError, TaggedValue};
use crate::util::{fe_low_u128, low_mask, split_u128, widening_mul, FieldElement};

pub struct Alu<'a> {
    range_check: &'a dyn RangeCheck,
}

impl<'a> Alu<'a> {
    #[must_use]
    pub fn new(range_check: &'a dyn RangeCheck) -> Self { Self { range_check } }

    fn assert_range(&self, value: u128, bits: u8) -> Result<(), TagError> {
        if self.range_check.assert_range(value, bits) {
            Ok(())
        } else {
            Err(TagError::RangeCheckFailed { value, bits })
        }
    }

    fn assert_halves(&self, x: u128) -> Result<(), TagError> {
        let (lo, hi) = split_u128(x);
        self.assert_range(lo, 64)?;
        self.assert_range(hi, 64)
    }

    pub fn add(&self, a: &TaggedValue, b: &TaggedValue) -> Result<TaggedValue, TagError> {
        a.add(b)
    }

    pub fn sub(&self, a: &TaggedValue, b: &TaggedValue) -> Result<TaggedValue, TagError> {
        a.sub(b)
    }

    pub fn mul(&self, a: &TaggedValue, b: &TaggedValue) -> Result<TaggedValue, TagError> {
        let c = a.mul(b)?;
        let (Some(x), Some(y)) = (a.as_u128(), b.as_u128()) else {
            return Ok(c);
        };
        let c_hi = match a.tag() {
            Tag::Field => return Ok(c),
            Tag::U128 => {
                self.assert_halves(x)?;
                self.assert_halves(y)?;
                let (_, x_hi) = split_u128(x);
                let (_, y_hi) = split_u128(y);
                let (_, product_hi) = widening_mul(x, y);
                product_hi.wrapping_sub(x_hi * y_hi) & low_mask(64)
            }
            // Both operands are below 2^64, so the product fits.
            tag => (x * y) >> tag.bits(),
        };
        log::trace!("mul {a} * {b}: high part {c_hi}");
        self.assert_range(c_hi, 64)?;
        Ok(c)
    }

    pub fn div(&self, a: &TaggedValue, b: &TaggedValue) -> Result<TaggedValue, TagError> {
        let c = a.div(b)?;
        let (Some(dividend), Some(quotient), Some(divisor)) = (a.as_u128(), c.as_u128(), b.as_u128())
        else {
            return Ok(c);
        };
        if c.tag() == Tag::U128 {
            self.assert_halves(quotient)?;
            self.assert_halves(divisor)?;
        }
        // The remainder must be below the divisor.
        let remainder = dividend - quotient * divisor;
        log::trace!("div {a} / {b}: remainder {remainder}");
        self.assert_range(divisor - remainder - 1, c.tag().bits())?;
        Ok(c)
    }

    pub fn fdiv(&self, a: &TaggedValue, b: &TaggedValue) -> Result<TaggedValue, TagError> {
        a.fdiv(b)
    }

    pub fn eq(&self, a: &TaggedValue, b: &TaggedValue) -> Result<TaggedValue, TagError> {
        a.eq(b)
    }

    pub fn lt(&self, a: &TaggedValue, b: &TaggedValue) -> Result<TaggedValue, TagError> {
        a.lt(b)
    }

    pub fn lte(&self, a: &TaggedValue, b: &TaggedValue) -> Result<TaggedValue, TagError> {
        a.lte(b)
    }

    pub fn not(&self, a: &TaggedValue) -> Result<TaggedValue, TagError> { a.not() }

    pub fn shl(&self, a: &TaggedValue, b: &TaggedValue) -> Result<TaggedValue, TagError> {
        let c = a.shl(b)?;
        self.assert_shift_limbs(a, b, Direction::Left)?;
        Ok(c)
    }

    pub fn shr(&self, a: &TaggedValue, b: &TaggedValue) -> Result<TaggedValue, TagError> {
        let c = a.shr(b)?;
        self.assert_shift_limbs(a, b, Direction::Right)?;
        Ok(c)
    }

    /// Split `a` at the shift point into a low limb of `lo_bits` and a high
    /// limb of `bits - lo_bits`.  On a left shift the high limb is the part
    /// shifted out, on a right shift the low limb is.  A shift of more than
    /// the tag width stores `shift - bits` in the low limb instead.
    fn assert_shift_limbs(
        &self,
        a: &TaggedValue,
        b: &TaggedValue,
        direction: Direction,
    ) -> Result<(), TagError> {
        let (Some(value), Some(shift)) = (a.as_u128(), b.as_u128()) else {
            return Ok(());
        };
        let bits = a.tag().bits();
        let overflow = shift > u128::from(bits);
        let lo_bits = match (overflow, u8::try_from(shift)) {
            (false, Ok(shift)) => match direction {
                Direction::Left => bits - shift,
                Direction::Right => shift,
            },
            _ => bits,
        };
        let lo = if overflow {
            shift - u128::from(bits)
        } else {
            value & low_mask(u32::from(lo_bits))
        };
        let hi = value.checked_shr(u32::from(lo_bits)).unwrap_or_default();
        let hi_bits = if overflow { bits } else { bits - lo_bits };
        log::trace!("shift {a} by {b}: lo {lo} ({lo_bits} bits), hi {hi} ({hi_bits} bits)");
        self.assert_range(lo, lo_bits)?;
        self.assert_range(hi, hi_bits)
    }

    /// Cast a field element to `tag`, keeping the low bits.
    pub fn truncate(&self, value: FieldElement, tag: Tag) -> Result<TaggedValue, TagError> {
        let c = TaggedValue::from_tag_truncating(tag, value);
        if !tag.is_field() && TaggedValue::from_tag(tag, value).is_err() {
            let bits = tag.bits();
            let mid = fe_low_u128(value).checked_shr(u32::from(bits)).unwrap_or_default();
            self.assert_range(mid, 128 - bits)?;
        }
        Ok(c)
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Left,
    Right,
}
