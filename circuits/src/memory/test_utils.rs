use memcheck_runner::memory::{Memory, OperationLog};
use memcheck_runner::tagged_value::TaggedValue;

/// Two cells of space 0: one written as `U8(7)` and read back, one read
/// before it is written as `U16(300)` and read again.
#[allow(clippy::missing_panics_doc)]
#[must_use]
pub fn memory_trace_test_case() -> OperationLog {
    let mut memory = Memory::new();
    memory
        .write(0, 5, 1, TaggedValue::u8(7))
        .expect("U8 values fit their tag");
    assert_eq!(memory.read(0, 5, 2), Ok(TaggedValue::u8(7)));
    assert_eq!(memory.read(0, 6, 3), Ok(TaggedValue::default()));
    memory
        .write(0, 6, 4, TaggedValue::u16(300))
        .expect("U16 values fit their tag");
    assert_eq!(memory.read(0, 6, 5), Ok(TaggedValue::u16(300)));
    memory.into_log()
}

/// A single `U8(7)` write.
#[allow(clippy::missing_panics_doc)]
#[must_use]
pub fn single_write() -> OperationLog {
    let mut memory = Memory::new();
    memory
        .write(0, 5, 1, TaggedValue::u8(7))
        .expect("U8 values fit their tag");
    memory.into_log()
}
