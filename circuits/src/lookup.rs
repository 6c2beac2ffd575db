//! Lookups the memory trace makes into the collaborator tables: the bounded
//! range check and the tag parameter table.

use itertools::izip;
use memcheck_runner::rangecheck::{RangeCheck, TagBounds};
use memcheck_runner::tag::Tag;
use memcheck_runner::util::{fe_from_u64, fe_to_u128, FieldElement};
use plonky2::field::types::Field;

use crate::memory::columns::Memory;
use crate::memory::stark::Invariant;

pub const LIMB_BITS: u8 = 16;

const LIMB_LOOKUPS: [Invariant; 3] = [
    Invariant::RangeCheckLimb0,
    Invariant::RangeCheckLimb1,
    Invariant::RangeCheckLimb2,
];

fn in_range(range_check: &dyn RangeCheck, value: FieldElement, bits: u8) -> bool {
    fe_to_u128(value).is_some_and(|value| range_check.assert_range(value, bits))
}

/// The first lookup of `row` that the collaborators reject.
///
/// Rows with `sel_rng_chk` look their `diff` limbs up in the 16-bit range
/// table.  Rows with `sel_rng_write` look their tag up in the tag table,
/// which must agree with `max_bits`, and their value up in the range table
/// for that many bits.
#[must_use]
pub fn eval_lookups(
    row: &Memory<FieldElement>,
    range_check: &dyn RangeCheck,
    tag_bounds: &dyn TagBounds,
) -> Option<Invariant> {
    if !row.sel_rng_chk.is_zero() {
        if let Some((_, &invariant)) = izip!(row.limbs, &LIMB_LOOKUPS)
            .find(|&(limb, _)| !in_range(range_check, limb, LIMB_BITS))
        {
            return Some(invariant);
        }
    }

    if !row.sel_rng_write.is_zero() {
        let Some(max_bits) = Tag::from_fe(row.tag)
            .map(|tag| tag_bounds.max_bits(tag))
            .filter(|&bits| fe_from_u64(u64::from(bits)) == row.max_bits)
        else {
            return Some(Invariant::TagMaxBits);
        };
        if !in_range(range_check, row.value, max_bits) {
            return Some(Invariant::RangeCheckWriteTaggedValue);
        }
    }

    None
}
