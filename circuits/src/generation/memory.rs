use derive_more::Deref;
use itertools::{chain, Itertools};
use memcheck_runner::memory::{MemoryEvent, OperationLog};
use memcheck_runner::util::{fe_from_u128, fe_from_u64, FieldElement};
use plonky2::field::types::Field;
use plonky2_maybe_rayon::*;
use thiserror::Error;

use crate::lookup::LIMB_BITS;
use crate::memory::columns::Memory;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedEventLog {
    #[error("two writes to {space_id}:{address} at clk {clk} have no defined order")]
    AmbiguousWriteOrder {
        space_id: u32,
        address: u32,
        clk: u64,
    },
}

/// The memory trace: a leading empty row, then one row per event in
/// canonical order.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deref)]
pub struct Trace {
    #[deref]
    rows: Vec<Memory<FieldElement>>,
}

impl Trace {
    /// Wrap arbitrary rows, e.g. tampered ones, for the checker.
    #[must_use]
    pub fn from_rows(rows: Vec<Memory<FieldElement>>) -> Self { Self { rows } }

    #[must_use]
    pub fn rows(&self) -> &[Memory<FieldElement>] { &self.rows }

    /// Every row but the leading one.
    #[must_use]
    pub fn active_rows(&self) -> &[Memory<FieldElement>] { self.rows.get(1..).unwrap_or_default() }

    #[must_use]
    pub fn into_rows(self) -> Vec<Memory<FieldElement>> { self.rows }
}

/// Returns the events sorted by `(space_id, address, timestamp)`.
#[must_use]
pub fn sort_events(log: &OperationLog) -> Vec<&MemoryEvent> {
    log.iter()
        // Sorting is stable, so events with equal keys keep their emission order.
        .sorted_by_key(|event| (event.space_id, event.address, event.timestamp()))
        .collect_vec()
}

/// The columns of `event` that do not depend on its neighbours.
fn event_row(event: &MemoryEvent) -> Memory<FieldElement> {
    let tag = event.value.tag();
    let is_write = event.mode.is_write();
    Memory {
        sel: FieldElement::ONE,
        value: event.value.value(),
        tag: tag.as_fe(),
        space_id: fe_from_u64(u64::from(event.space_id)),
        address: fe_from_u64(u64::from(event.address)),
        clk: fe_from_u64(event.execution_clk),
        rw: FieldElement::from_bool(is_write),
        global_addr: fe_from_u64(event.global_addr()),
        timestamp: fe_from_u128(event.timestamp()),
        sel_tag_is_ff: FieldElement::from_bool(tag.is_field()),
        tag_ff_diff_inv: tag.as_fe().try_inverse().unwrap_or_default(),
        sel_rng_write: FieldElement::from_bool(is_write && !tag.is_field()),
        max_bits: fe_from_u64(u64::from(tag.bits())),
        ..Memory::default()
    }
}

/// Fill in the ordering witnesses of `row` towards the event after it.
fn link_to_next(
    mut row: Memory<FieldElement>,
    event: &MemoryEvent,
    next: &MemoryEvent,
) -> Result<Memory<FieldElement>, MalformedEventLog> {
    let addr_step = next.global_addr() - event.global_addr();
    let last_access = addr_step != 0;
    let diff = if last_access {
        u128::from(addr_step)
    } else {
        let both_writes = event.mode.is_write() && next.mode.is_write();
        (next.timestamp() - event.timestamp())
            .checked_sub(u128::from(both_writes))
            .ok_or(MalformedEventLog::AmbiguousWriteOrder {
                space_id: event.space_id,
                address: event.address,
                clk: event.execution_clk,
            })?
    };

    let limb_bits = u32::from(LIMB_BITS);
    let limb = |i: u32| fe_from_u128((diff >> (limb_bits * i)) & 0xFFFF);
    row.last_access = FieldElement::from_bool(last_access);
    row.glob_addr_diff_inv = fe_from_u64(addr_step).try_inverse().unwrap_or_default();
    row.diff = fe_from_u128(diff);
    // The top limb is unmasked: steps of 48 bits or more fail its range check.
    row.limbs = [limb(0), limb(1), fe_from_u128(diff >> (2 * limb_bits))];
    row.sel_rng_chk = FieldElement::ONE;
    Ok(row)
}

/// Derive a row from `event`, the `row_index`-th row of the trace.
fn memory_row(
    row_index: usize,
    event: &MemoryEvent,
    next: Option<&MemoryEvent>,
) -> Result<Memory<FieldElement>, MalformedEventLog> {
    let row = event_row(event);
    let row = match next {
        Some(next) => link_to_next(row, event, next)?,
        // The last access of the trace.
        None => Memory {
            last_access: FieldElement::ONE,
            ..row
        },
    };
    log::trace!("memory row {row_index}: {event:?}");
    Ok(row)
}

/// Sort `log` canonically and derive the memory trace from it.
pub fn generate_memory_trace(log: &OperationLog) -> Result<Trace, MalformedEventLog> {
    let events = sort_events(log);
    log::debug!(
        "generating memory trace for {} events over {} cells",
        events.len(),
        events.iter().map(|event| event.global_addr()).dedup().count()
    );

    let rows = chain!(
        [Ok(Memory::default())],
        events
            .iter()
            .enumerate()
            .map(|(i, event)| memory_row(i + 1, event, events.get(i + 1).copied()))
    )
    .collect::<Result<Vec<_>, _>>()?;
    Ok(Trace { rows })
}

/// Build the traces of independent executions.
#[must_use]
pub fn build_all(logs: &[OperationLog]) -> Vec<Result<Trace, MalformedEventLog>> {
    logs.par_iter().map(generate_memory_trace).collect()
}
