#![deny(clippy::pedantic)]

pub mod alu;
pub mod memory;
pub mod rangecheck;
pub mod tag;
pub mod tagged_value;
#[cfg(any(feature = "test", test))]
pub mod test_utils;
pub mod util;
