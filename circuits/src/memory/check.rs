use expr::ExprBuilder;
use memcheck_runner::rangecheck::{RangeCheck, TagBounds};
use memcheck_runner::util::FieldElement;
use plonky2::field::types::Field;
use plonky2_maybe_rayon::*;
use thiserror::Error;

use crate::expr::Vars;
use crate::generation::memory::Trace;
use crate::lookup::eval_lookups;
use crate::memory::columns::Memory;
use crate::memory::stark::{generate_constraints, Invariant};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("row {row} violates {invariant}")]
pub struct ViolatedInvariant {
    pub row: usize,
    pub invariant: Invariant,
}

/// Evaluate the relation on row `index` and its successor, then the lookups
/// of row `index`.
fn check_row(
    rows: &[Memory<FieldElement>],
    index: usize,
    range_check: &dyn RangeCheck,
    tag_bounds: &dyn TagBounds,
) -> Option<ViolatedInvariant> {
    let local = rows[index];
    // The last row is followed by padding.
    let next = rows.get(index + 1).copied().unwrap_or_default();

    let builder = ExprBuilder::default();
    let vars = Vars {
        first_row: builder.lit(FieldElement::from_bool(index == 0)),
        local_values: local.map(|x| builder.lit(x)),
        next_values: next.map(|x| builder.lit(x)),
    };
    let violation = generate_constraints(&vars).first_violation();
    violation
        .or_else(|| eval_lookups(&local, range_check, tag_bounds))
        .map(|invariant| ViolatedInvariant {
            row: index,
            invariant,
        })
}

/// Check every row of `trace` against the memory consistency relation and
/// the collaborator lookups.
///
/// Reports the first violation in row order.
pub fn check(
    trace: &Trace,
    range_check: &dyn RangeCheck,
    tag_bounds: &dyn TagBounds,
) -> Result<(), ViolatedInvariant> {
    let rows = trace.rows();
    let violations: Vec<Option<ViolatedInvariant>> = (0..rows.len())
        .into_par_iter()
        .map(|index| check_row(rows, index, range_check, tag_bounds))
        .collect();
    match violations.into_iter().flatten().next() {
        Some(violation) => {
            log::debug!("memory trace rejected: {violation}");
            Err(violation)
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use memcheck_runner::rangecheck::{
        RangeCheckEvent, RangeCheckRecorder, StandardRangeCheck, StandardTagBounds,
    };
    use memcheck_runner::tag::Tag;
    use memcheck_runner::tagged_value::TaggedValue;
    use memcheck_runner::test_utils::operation_log;
    use memcheck_runner::util::fe_from_u64;
    use proptest::prelude::*;

    use super::*;
    use crate::generation::memory::generate_memory_trace;
    use crate::memory::test_utils::{memory_trace_test_case, single_write};
    use crate::test_utils::build_and_check;

    fn fe(x: u64) -> FieldElement { fe_from_u64(x) }

    fn rows_of(log: &memcheck_runner::memory::OperationLog) -> Vec<Memory<FieldElement>> {
        generate_memory_trace(log)
            .expect("honest logs build")
            .into_rows()
    }

    fn violation(rows: Vec<Memory<FieldElement>>) -> Option<ViolatedInvariant> {
        check(
            &Trace::from_rows(rows),
            &StandardRangeCheck,
            &StandardTagBounds,
        )
        .err()
    }

    /// Tamper with row `row` of the test case and return the violation.
    fn tamper(row: usize, f: impl FnOnce(&mut Memory<FieldElement>)) -> Option<ViolatedInvariant> {
        let mut rows = rows_of(&memory_trace_test_case());
        f(&mut rows[row]);
        violation(rows)
    }

    fn violated(row: usize, invariant: Invariant) -> Option<ViolatedInvariant> {
        Some(ViolatedInvariant { row, invariant })
    }

    #[test]
    fn honest_traces_pass() -> anyhow::Result<()> {
        build_and_check(&memory_trace_test_case())?;
        build_and_check(&single_write())?;
        build_and_check(&memcheck_runner::memory::OperationLog::new())?;
        Ok(())
    }

    #[test]
    fn padding_may_follow_the_trace() -> anyhow::Result<()> {
        let mut rows = rows_of(&memory_trace_test_case());
        rows.extend([Memory::default(); 3]);
        check(
            &Trace::from_rows(rows),
            &StandardRangeCheck,
            &StandardTagBounds,
        )?;
        Ok(())
    }

    #[test]
    fn reads_must_see_the_last_write() {
        assert_eq!(
            tamper(2, |row| row.value = fe(8)),
            violated(1, Invariant::ReadWriteConsistencyValue)
        );
        assert_eq!(
            tamper(2, |row| row.tag = Tag::U16.as_fe()),
            violated(1, Invariant::ReadWriteConsistencyTag)
        );
    }

    #[test]
    fn first_reads_see_field_zero() {
        assert_eq!(
            tamper(3, |row| row.value = fe(1)),
            violated(2, Invariant::MemoryInitValue)
        );
        assert_eq!(
            tamper(3, |row| row.tag = Tag::U8.as_fe()),
            violated(2, Invariant::MemoryInitTag)
        );

        let mut memory = memcheck_runner::memory::Memory::new();
        memory.read(3, 4, 1).expect("reads of fresh cells succeed");
        let mut rows = rows_of(memory.log());
        rows[1].value = fe(5);
        assert_eq!(violation(rows), violated(0, Invariant::MemoryInitValue));
    }

    #[test]
    fn last_access_follows_the_address() {
        assert_eq!(
            tamper(1, |row| row.last_access = fe(1)),
            violated(1, Invariant::LastAccess)
        );
        assert_eq!(
            tamper(2, |row| row.last_access = fe(0)),
            violated(2, Invariant::LastAccess)
        );
        assert_eq!(
            tamper(2, |row| row.last_access = fe(2)),
            violated(2, Invariant::LastAccessBool)
        );
    }

    #[test]
    fn diff_is_the_step_to_the_next_row() {
        assert_eq!(
            tamper(4, |row| {
                row.diff = fe(2);
                row.limbs = [fe(2), fe(0), fe(0)];
            }),
            violated(4, Invariant::Diff)
        );
        assert_eq!(
            tamper(4, |row| row.limbs[0] = fe(0)),
            violated(4, Invariant::DiffDecomp)
        );
        // Recomposes to the honest diff of 1, but limb 0 is too wide.
        assert_eq!(
            tamper(4, |row| row.limbs = [fe(1 + (1 << 16)), -fe(1), fe(0)]),
            violated(4, Invariant::RangeCheckLimb0)
        );
    }

    #[test]
    fn derived_keys() {
        assert_eq!(
            tamper(1, |row| row.timestamp += fe(2)),
            violated(1, Invariant::Timestamp)
        );
        assert_eq!(
            tamper(1, |row| row.global_addr += fe(1)),
            violated(1, Invariant::GlobalAddr)
        );
    }

    #[test]
    fn selectors() {
        assert_eq!(
            tamper(3, |row| row.sel_tag_is_ff = fe(0)),
            violated(3, Invariant::TagIsFf)
        );
        assert_eq!(
            tamper(1, |row| row.sel_rng_write = fe(0)),
            violated(1, Invariant::SelRngWrite)
        );
        assert_eq!(
            tamper(1, |row| row.sel_rng_chk = fe(2)),
            violated(1, Invariant::SelRngChkBool)
        );
        assert_eq!(
            tamper(4, |row| row.sel_rng_chk = fe(0)),
            violated(4, Invariant::SelRngChk)
        );
        assert_eq!(
            tamper(3, |row| row.rw = fe(2)),
            violated(3, Invariant::RwBool)
        );
    }

    #[test]
    fn events_cannot_follow_padding() {
        let rows = rows_of(&single_write());
        let (r0, r1) = (rows[0], rows[1]);
        assert_eq!(
            violation(vec![r0, r1, Memory::default(), r1]),
            violated(2, Invariant::MemContiguous)
        );
    }

    #[test]
    fn written_values_are_range_checked() {
        let mut rows = rows_of(&single_write());
        rows[1].value = fe(256);
        assert_eq!(
            violation(rows),
            violated(1, Invariant::RangeCheckWriteTaggedValue)
        );

        let mut rows = rows_of(&single_write());
        rows[1].max_bits = fe(16);
        assert_eq!(violation(rows), violated(1, Invariant::TagMaxBits));
    }

    #[test]
    fn reports_the_first_row() {
        let mut rows = rows_of(&memory_trace_test_case());
        rows[4].limbs[0] = fe(0);
        rows[2].value = fe(8);
        assert_eq!(
            violation(rows),
            violated(1, Invariant::ReadWriteConsistencyValue)
        );
    }

    #[test]
    fn range_checks_are_delegated() -> anyhow::Result<()> {
        let trace = generate_memory_trace(&memory_trace_test_case())?;
        let recorder = RangeCheckRecorder::new();
        check(&trace, &recorder, &StandardTagBounds)?;
        let events = recorder.take_events();
        // Three limbs for each of the four rows with a successor, and the two
        // written values.
        assert_eq!(events.len(), 14);
        assert!(events.contains(&RangeCheckEvent {
            value: 300,
            bits: 16
        }));
        assert!(events.contains(&RangeCheckEvent { value: 7, bits: 8 }));
        Ok(())
    }

    #[test]
    fn violations_are_displayed_by_name() {
        let violation = ViolatedInvariant {
            row: 3,
            invariant: Invariant::TagIsFf,
        };
        assert_eq!(violation.to_string(), "row 3 violates TAG_IS_FF");
    }

    proptest! {
        #[test]
        fn simulated_logs_pass(log in operation_log(24)) {
            prop_assert!(build_and_check(&log).is_ok());
        }

        #[test]
        fn forged_reads_are_rejected(log in operation_log(24), index in any::<prop::sample::Index>()) {
            let mut rows = rows_of(&log);
            prop_assume!(rows.len() > 2);
            let index = 2 + index.index(rows.len() - 2);
            // A forged value in the last write to a cell is never observed.
            prop_assume!(rows[index].rw.is_zero());
            let value = TaggedValue::from_tag(
                Tag::from_fe(rows[index].tag).expect("honest rows carry known tags"),
                rows[index].value,
            )
            .expect("honest rows fit their tags");
            rows[index].value = memcheck_runner::test_utils::other_value(value).value();
            prop_assert!(violation(rows).is_some());
        }
    }
}
