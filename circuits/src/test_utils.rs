use anyhow::Result;
use memcheck_runner::memory::OperationLog;
use memcheck_runner::rangecheck::{StandardRangeCheck, StandardTagBounds};

use crate::generation::memory::{generate_memory_trace, Trace};
use crate::memory::check::check;

/// Build the memory trace of `log` and check it against the standard
/// collaborators.
#[allow(clippy::missing_errors_doc)]
pub fn build_and_check(log: &OperationLog) -> Result<Trace> {
    let _ = env_logger::try_init();
    let trace = generate_memory_trace(log)?;
    check(&trace, &StandardRangeCheck, &StandardTagBounds)?;
    Ok(trace)
}
