use plonky2::field::types::Field;
use proptest::prelude::{any, prop};
use proptest::prop_oneof;
use proptest::strategy::{BoxedStrategy, Just, Strategy};

use crate::memory::{Memory, OperationLog};
use crate::tag::Tag;
use crate::tagged_value::TaggedValue;
use crate::util::{fe_from_u128, low_mask, FieldElement};

#[allow(clippy::cast_sign_loss)]
pub fn u32_extra() -> impl Strategy<Value = u32> {
    prop_oneof![
        Just(0_u32),
        Just(1_u32),
        Just(u32::MAX),
        any::<u32>(),
        Just(i32::MIN as u32),
        Just(i32::MAX as u32),
    ]
}

pub fn u128_extra() -> impl Strategy<Value = u128> {
    prop_oneof![
        Just(0_u128),
        Just(1_u128),
        Just(u128::MAX),
        Just(u128::from(u64::MAX)),
        any::<u64>().prop_map(u128::from),
        any::<u128>(),
    ]
}

pub fn tag() -> impl Strategy<Value = Tag> { prop::sample::select(Tag::ALL.to_vec()) }

/// Values that fit `tag`, biased towards the edges of its range.
pub fn tagged_value_of(tag: Tag) -> BoxedStrategy<TaggedValue> {
    match tag.max_value() {
        None => prop_oneof![
            Just(FieldElement::NEG_ONE),
            u128_extra().prop_map(fe_from_u128),
        ]
        .prop_map(TaggedValue::field)
        .boxed(),
        Some(max) => prop_oneof![Just(max), u128_extra().prop_map(move |v| v & max)]
            .prop_map(move |v| {
                TaggedValue::from_u128(tag, v).expect("masked values fit their tag")
            })
            .boxed(),
    }
}

pub fn tagged_value() -> impl Strategy<Value = TaggedValue> { tag().prop_flat_map(tagged_value_of) }

/// Two values sharing a tag.
pub fn tagged_value_pair() -> impl Strategy<Value = (TaggedValue, TaggedValue)> {
    tag().prop_flat_map(|tag| (tagged_value_of(tag), tagged_value_of(tag)))
}

/// One step of a simulated program.
#[derive(Debug, Clone, Copy)]
pub enum MemoryOp {
    Read,
    Write(TaggedValue),
    /// Read and overwrite the cell within the same clock cycle.
    Update(TaggedValue),
}

#[derive(Debug, Clone, Copy)]
pub struct MemoryAccess {
    pub space_id: u32,
    pub address: u32,
    pub op: MemoryOp,
    pub clk_step: u64,
}

pub fn memory_access() -> impl Strategy<Value = MemoryAccess> {
    let op = prop_oneof![
        Just(MemoryOp::Read),
        tagged_value().prop_map(MemoryOp::Write),
        tagged_value().prop_map(MemoryOp::Update),
    ];
    // Few spaces and mostly few addresses, so cells get revisited.
    let address = prop_oneof![3 => 0_u32..4, 1 => u32_extra()];
    (0_u32..3, address, op, 1_u64..4).prop_map(|(space_id, address, op, clk_step)| {
        MemoryAccess {
            space_id,
            address,
            op,
            clk_step,
        }
    })
}

/// Replay `accesses` against a fresh [`Memory`].
#[must_use]
#[allow(clippy::missing_panics_doc)]
pub fn simulate(accesses: &[MemoryAccess]) -> OperationLog {
    let mut memory = Memory::new();
    let mut clk = 0;
    for &MemoryAccess {
        space_id,
        address,
        op,
        clk_step,
    } in accesses
    {
        clk += clk_step;
        match op {
            MemoryOp::Read => {
                memory
                    .read(space_id, address, clk)
                    .expect("honest reads succeed");
            }
            MemoryOp::Write(value) => memory
                .write(space_id, address, clk, value)
                .expect("honest writes succeed"),
            MemoryOp::Update(value) => {
                memory
                    .read(space_id, address, clk)
                    .expect("honest reads succeed");
                memory
                    .write(space_id, address, clk, value)
                    .expect("honest writes succeed");
            }
        }
    }
    memory.into_log()
}

/// Consistent operation logs, as an honest interpreter would emit them.
pub fn operation_log(max_len: usize) -> impl Strategy<Value = OperationLog> {
    prop::collection::vec(memory_access(), 0..=max_len).prop_map(|accesses| simulate(&accesses))
}

/// A value with the tag of `value` but a different payload.
#[must_use]
#[allow(clippy::missing_panics_doc)]
pub fn other_value(value: TaggedValue) -> TaggedValue {
    match value.as_u128() {
        Some(v) if !value.tag().is_field() => {
            let max = low_mask(u32::from(value.tag().bits()));
            TaggedValue::from_u128(value.tag(), v.wrapping_add(1) & max)
                .expect("masked values fit their tag")
        }
        _ => TaggedValue::field(value.value() + FieldElement::ONE),
    }
}
