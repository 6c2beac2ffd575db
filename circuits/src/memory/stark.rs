use derive_more::Display;
use expr::Expr;
use memcheck_runner::tag::Tag;

use crate::expr::{ConstraintBuilder, Vars};
use crate::memory::columns::Memory;

/// Every equation and lookup the memory trace must satisfy.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display)]
pub enum Invariant {
    #[display("SEL_BOOL")]
    SelBool,
    #[display("RW_BOOL")]
    RwBool,
    #[display("LAST_ACCESS_BOOL")]
    LastAccessBool,
    #[display("SEL_TAG_IS_FF_BOOL")]
    SelTagIsFfBool,
    #[display("SEL_RNG_CHK_BOOL")]
    SelRngChkBool,
    #[display("MEM_CONTIGUOUS")]
    MemContiguous,
    #[display("SEL_RNG_CHK")]
    SelRngChk,
    #[display("GLOBAL_ADDR")]
    GlobalAddr,
    #[display("TIMESTAMP")]
    Timestamp,
    #[display("LAST_ACCESS")]
    LastAccess,
    #[display("DIFF")]
    Diff,
    #[display("DIFF_DECOMP")]
    DiffDecomp,
    #[display("MEMORY_INIT_VALUE")]
    MemoryInitValue,
    #[display("MEMORY_INIT_TAG")]
    MemoryInitTag,
    #[display("READ_WRITE_CONSISTENCY_VALUE")]
    ReadWriteConsistencyValue,
    #[display("READ_WRITE_CONSISTENCY_TAG")]
    ReadWriteConsistencyTag,
    #[display("TAG_IS_FF")]
    TagIsFf,
    #[display("SEL_RNG_WRITE")]
    SelRngWrite,
    #[display("RANGE_CHECK_LIMB_0")]
    RangeCheckLimb0,
    #[display("RANGE_CHECK_LIMB_1")]
    RangeCheckLimb1,
    #[display("RANGE_CHECK_LIMB_2")]
    RangeCheckLimb2,
    #[display("TAG_MAX_BITS")]
    TagMaxBits,
    #[display("RANGE_CHECK_WRITE_TAGGED_VALUE")]
    RangeCheckWriteTaggedValue,
}

const FF: i64 = Tag::Field as i64;
const ADDRESS_SPACE: i64 = 1 << 32;
const LIMB: i64 = 1 << 16;

/// The memory consistency relation between a row and its successor.
///
/// The successor of the last row is an all-zero padding row.
#[must_use]
pub fn generate_constraints<'a, T: Copy>(
    vars: &Vars<'a, T, Memory<Expr<'a, T>>>,
) -> ConstraintBuilder<Expr<'a, T>> {
    let first_row = vars.first_row;
    let lv = vars.local_values;
    let nv = vars.next_values;
    let mut constraints = ConstraintBuilder::default();

    // Boolean constraints
    // -------------------
    constraints.always(Invariant::SelBool, lv.sel.is_binary());
    constraints.always(Invariant::RwBool, lv.rw.is_binary());
    constraints.always(Invariant::LastAccessBool, lv.last_access.is_binary());
    constraints.always(Invariant::SelTagIsFfBool, lv.sel_tag_is_ff.is_binary());
    constraints.always(Invariant::SelRngChkBool, lv.sel_rng_chk.is_binary());

    // Selectors
    // ---------
    // Once we have padding, all subsequent rows are padding.  Only the
    // leading empty row may be followed by an event.
    constraints.always(
        Invariant::MemContiguous,
        (1 - first_row) * (1 - lv.sel) * nv.sel,
    );
    // The ordering witness exists between any two event rows.
    constraints.always(Invariant::SelRngChk, lv.sel_rng_chk - lv.sel * nv.sel);

    // Derived keys
    // ------------
    constraints.always(
        Invariant::GlobalAddr,
        lv.sel * (lv.global_addr - (lv.space_id * ADDRESS_SPACE + lv.address)),
    );
    constraints.always(
        Invariant::Timestamp,
        lv.sel * (lv.timestamp - (2 * lv.clk + lv.rw)),
    );

    // Ordering
    // --------
    // `last_access` is 1 iff the address changes, witnessed by the inverse
    // of the step.
    let addr_step = nv.global_addr - lv.global_addr;
    constraints.always(
        Invariant::LastAccess,
        lv.sel_rng_chk
            * (addr_step
                * ((1 - lv.last_access) * (1 - lv.glob_addr_diff_inv) + lv.glob_addr_diff_inv)
                - lv.last_access),
    );
    // Two writes in the same cycle would make the timestamp step negative.
    let timestamp_step = nv.timestamp - lv.timestamp - nv.rw * lv.rw;
    constraints.always(
        Invariant::Diff,
        lv.sel_rng_chk
            * (lv.diff
                - (lv.last_access * addr_step + (1 - lv.last_access) * timestamp_step)),
    );
    let [limb0, limb1, limb2] = lv.limbs;
    constraints.always(
        Invariant::DiffDecomp,
        lv.diff - (limb0 + limb1 * LIMB + limb2 * LIMB * LIMB),
    );

    // Consistency
    // -----------
    // The first access to every address either writes it, or reads FF(0).
    let starts_address = first_row + lv.last_access;
    let next_is_read = 1 - nv.rw;
    constraints.always(
        Invariant::MemoryInitValue,
        starts_address * next_is_read * nv.value,
    );
    constraints.always(
        Invariant::MemoryInitTag,
        starts_address * next_is_read * (nv.tag - FF),
    );
    // Any other read sees what the previous row held.
    constraints.always(
        Invariant::ReadWriteConsistencyValue,
        (1 - lv.last_access) * next_is_read * (nv.value - lv.value),
    );
    constraints.always(
        Invariant::ReadWriteConsistencyTag,
        (1 - lv.last_access) * next_is_read * (nv.tag - lv.tag),
    );

    // Tags
    // ----
    let tag_diff = lv.tag - FF;
    constraints.always(
        Invariant::TagIsFf,
        lv.sel
            * (tag_diff
                * (lv.sel_tag_is_ff * (1 - lv.tag_ff_diff_inv) + lv.tag_ff_diff_inv)
                - 1
                + lv.sel_tag_is_ff),
    );
    constraints.always(
        Invariant::SelRngWrite,
        lv.sel_rng_write - lv.rw * (1 - lv.sel_tag_is_ff),
    );

    constraints
}
