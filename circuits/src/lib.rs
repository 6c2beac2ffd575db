#![deny(clippy::pedantic)]
// TODO: When things have settled a bit, and we make a big push to improve docs, we can remove these
// exceptions:
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// FIXME: Remove this, when proptest's macro is updated not to trigger clippy.
#![allow(clippy::ignored_unit_patterns)]

pub mod columns_view;
pub mod expr;
pub mod generation;
pub mod lookup;
pub mod memory;
#[cfg(any(feature = "test", test))]
pub mod test_utils;
