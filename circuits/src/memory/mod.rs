//! The memory consistency table: every memory event in canonical order,
//! with the witnesses that tie each event to the one after it.

pub mod check;
pub mod columns;
pub mod stark;
#[cfg(any(feature = "test", test))]
pub mod test_utils;
