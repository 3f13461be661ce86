#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A command-line tool to pin processes to processors, release them to all processors and
//! inspect their processor affinity.
//!
//! ```text
//! pin_process show --pid 1234
//! pin_process pin --pid 1234 0-3,8
//! pin_process release --pid 1234
//! pin_process cpus
//! ```
//!
//! Processor lists use the Linux cpulist format. Without `--pid`, a command applies to the tool's
//! own process.
//!
//! This crate provides the core logic of the tool, exposed via the [`run`] function.
//! The binary entry point is in `main.rs`.

mod types;

use process_affinity::{MAX_CPU_COUNT, ProcessAffinity, ProcessTarget};
use tracing::debug;
pub use types::*;

/// Core logic of the tool, extracted for testability.
///
/// Executes exactly one affinity operation and reports its outcome.
#[doc(hidden)]
pub fn run(input: &RunInput) -> Result<RunOutcome, RunError> {
    debug!(?input, "running command");

    let affinity = ProcessAffinity::current();

    match input {
        RunInput::Show { pid } => {
            let target = target_of(*pid);
            let cpus = affinity.affinity(target)?;

            Ok(RunOutcome::Affinity { target, cpus })
        }
        RunInput::Pin { pid, cpus } => {
            let target = target_of(*pid);
            let indices = parse_cpus(cpus)?;

            if let [cpu] = indices.as_slice() {
                affinity.pin_to_cpu(target, *cpu)?;
            } else {
                affinity.pin_to_cpus(target, indices.iter().copied())?;
            }

            Ok(RunOutcome::Pinned {
                target,
                cpus: indices,
            })
        }
        RunInput::Release { pid } => {
            let target = target_of(*pid);
            affinity.release_to_all_cpus(target)?;

            Ok(RunOutcome::Released { target })
        }
        RunInput::Cpus => Ok(RunOutcome::CpuCount(affinity.host_cpu_count()?)),
    }
}

fn target_of(pid: Option<i64>) -> ProcessTarget {
    pid.map_or(ProcessTarget::CurrentProcess, ProcessTarget::Pid)
}

fn parse_cpus(cpus: &str) -> Result<Vec<u32>, RunError> {
    // Ranges are expanded member by member, so their ends are bounded before anything is expanded.
    if let Some(index) = listed_ends(cpus).find(|end| *end >= MAX_CPU_COUNT) {
        return Err(RunError::CpuIndexOutOfRange {
            cpus: cpus.to_string(),
            index,
        });
    }

    cpulist::parse(cpus).map_err(|source| RunError::InvalidCpuList {
        cpus: cpus.to_string(),
        source,
    })
}

/// The highest index each part of a cpulist names. Parts too malformed to tell are skipped and
/// left for `cpulist` to report.
fn listed_ends(cpus: &str) -> impl Iterator<Item = usize> {
    cpus.split(',').filter_map(|part| {
        let end = part.split_once('-').map_or(part, |(_, end)| end);
        let end = end.split_once(':').map_or(end, |(end, _)| end);

        end.parse().ok()
    })
}
