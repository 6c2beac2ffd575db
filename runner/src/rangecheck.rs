use std::sync::Mutex;

use crate::tag::Tag;

/// Bounded range argument the memory relation and the ALU delegate to.
pub trait RangeCheck: Sync {
    /// Whether `value < 2^bits`.
    fn assert_range(&self, value: u128, bits: u8) -> bool;
}

/// The tag parameter table.
pub trait TagBounds: Sync {
    fn max_bits(&self, tag: Tag) -> u8;
}

#[must_use]
pub fn fits_in_bits(value: u128, bits: u8) -> bool {
    u32::from(bits) >= u128::BITS || value >> bits == 0
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRangeCheck;

impl RangeCheck for StandardRangeCheck {
    fn assert_range(&self, value: u128, bits: u8) -> bool { fits_in_bits(value, bits) }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTagBounds;

impl TagBounds for StandardTagBounds {
    fn max_bits(&self, tag: Tag) -> u8 { tag.bits() }
}

/// A single range-check request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeCheckEvent {
    pub value: u128,
    pub bits: u8,
}

/// Answers like [`StandardRangeCheck`] and records every request, in the
/// order it was made.  This is the event stream a prover commits to for the
/// range-check table.
#[derive(Debug, Default)]
pub struct RangeCheckRecorder {
    events: Mutex<Vec<RangeCheckEvent>>,
}

impl RangeCheckRecorder {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Drain the recorded requests.
    #[must_use]
    pub fn take_events(&self) -> Vec<RangeCheckEvent> {
        std::mem::take(&mut *self.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize { self.lock().len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RangeCheckEvent>> {
        // A poisoned recorder still holds every event pushed before the panic.
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RangeCheck for RangeCheckRecorder {
    fn assert_range(&self, value: u128, bits: u8) -> bool {
        log::trace!("range check {value} < 2^{bits}");
        self.lock().push(RangeCheckEvent { value, bits });
        fits_in_bits(value, bits)
    }
}
