//! Trace generation: turning the operation log of an execution into the
//! rows the memory relation is checked on.

pub mod memory;
