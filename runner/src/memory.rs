use derive_more::{Deref, Display};
use im::hashmap::HashMap;
use serde::{Deserialize, Serialize};

use crate::tagged_value::{TagError, TaggedValue};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum MemoryMode {
    #[default]
    Read = 0,
    Write = 1,
}

impl MemoryMode {
    #[must_use]
    pub fn is_write(self) -> bool { self == MemoryMode::Write }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub execution_clk: u64,
    pub mode: MemoryMode,
    pub space_id: u32,
    pub address: u32,
    pub value: TaggedValue,
}

impl MemoryEvent {
    /// `space_id · 2^32 + address`
    #[must_use]
    pub fn global_addr(&self) -> u64 { (u64::from(self.space_id) << 32) | u64::from(self.address) }

    /// `2 · clk + rw`, so that within one clock cycle reads come before
    /// writes.
    #[must_use]
    pub fn timestamp(&self) -> u128 {
        2 * u128::from(self.execution_clk) + u128::from(self.mode as u8)
    }
}

/// Append-only record of memory operations, in emission order.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deref)]
pub struct OperationLog {
    #[deref]
    events: Vec<MemoryEvent>,
}

impl OperationLog {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Record an access.  Fails when `value` does not fit its tag, which can
    /// only happen for values that did not come from the checked
    /// constructors (e.g. deserialised ones).
    pub fn append(
        &mut self,
        space_id: u32,
        address: u32,
        clk: u64,
        mode: MemoryMode,
        value: TaggedValue,
    ) -> Result<(), TagError> {
        let value = TaggedValue::from_tag(value.tag(), value.value())?;
        log::trace!("{mode} {space_id}:{address} at clk {clk}: {value}");
        self.events.push(MemoryEvent {
            execution_clk: clk,
            mode,
            space_id,
            address,
            value,
        });
        Ok(())
    }

    #[must_use]
    pub fn events(&self) -> &[MemoryEvent] { &self.events }
}

impl TryFrom<Vec<MemoryEvent>> for OperationLog {
    type Error = TagError;

    fn try_from(events: Vec<MemoryEvent>) -> Result<Self, Self::Error> {
        events.into_iter().try_fold(Self::new(), |mut log, event| {
            log.append(
                event.space_id,
                event.address,
                event.execution_clk,
                event.mode,
                event.value,
            )?;
            Ok(log)
        })
    }
}

/// Tagged, space-partitioned memory that logs every access.
///
/// Cells that were never written read as `Field(0)`.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    cells: HashMap<(u32, u32), TaggedValue>,
    log: OperationLog,
}

impl Memory {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Read a cell without logging.
    #[must_use]
    pub fn peek(&self, space_id: u32, address: u32) -> TaggedValue {
        self.cells
            .get(&(space_id, address))
            .copied()
            .unwrap_or_default()
    }

    pub fn read(&mut self, space_id: u32, address: u32, clk: u64) -> Result<TaggedValue, TagError> {
        let value = self.peek(space_id, address);
        self.log
            .append(space_id, address, clk, MemoryMode::Read, value)?;
        Ok(value)
    }

    pub fn write(
        &mut self,
        space_id: u32,
        address: u32,
        clk: u64,
        value: TaggedValue,
    ) -> Result<(), TagError> {
        self.log
            .append(space_id, address, clk, MemoryMode::Write, value)?;
        self.cells.insert((space_id, address), value);
        Ok(())
    }

    #[must_use]
    pub fn log(&self) -> &OperationLog { &self.log }

    #[must_use]
    pub fn into_log(self) -> OperationLog { self.log }
}
