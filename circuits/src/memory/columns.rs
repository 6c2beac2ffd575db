use crate::columns_view::{columns_view_impl, make_col_map, NumberOfColumns};

/// One row of the memory trace: a memory event in canonical order, plus the
/// witnesses that tie it to the row after it.
#[repr(C)]
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub struct Memory<T> {
    /// 1 on rows carrying an event, 0 on the leading row and on padding.
    pub sel: T,

    pub value: T,
    pub tag: T,
    pub space_id: T,
    pub address: T,
    pub clk: T,
    /// 1 for writes, 0 for reads.
    pub rw: T,

    /// `space_id * 2^32 + address`
    pub global_addr: T,
    /// `2 * clk + rw`
    pub timestamp: T,

    /// Whether the next row touches a different `global_addr`.
    pub last_access: T,
    /// Inverse of the `global_addr` step to the next row, or 0.
    pub glob_addr_diff_inv: T,

    /// The `global_addr` step to the next row on a `last_access` row, the
    /// `timestamp` step otherwise.
    pub diff: T,
    /// Little-endian limbs of `diff`: two of 16 bits, then everything above
    /// bit 32.
    pub limbs: [T; 3],
    /// 1 on every event row that has a successor.
    pub sel_rng_chk: T,

    pub sel_tag_is_ff: T,
    /// Inverse of `tag - FF`, or 0.
    pub tag_ff_diff_inv: T,
    /// 1 on writes of integer tagged values.
    pub sel_rng_write: T,
    pub max_bits: T,
}
columns_view_impl!(Memory);
make_col_map!(Memory);

pub const NUMBER_OF_MEMORY_COLUMNS: usize = Memory::<()>::NUMBER_OF_COLUMNS;
