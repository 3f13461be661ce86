// Public API types for pin_process.
//
// These types are used by main.rs and exposed via the crate's public API.

use std::fmt::{self, Display};

use process_affinity::{CpuSet, ProcessTarget};
use thiserror::Error;

/// A parsed command, ready to be executed by [`run()`][crate::run].
///
/// A missing `pid` means the command applies to the process running the tool.
#[doc(hidden)]
#[derive(Clone, Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "this is a hidden enum for internal/test use only"
)]
pub enum RunInput {
    /// Print the processors the target may run on.
    Show {
        /// Process to inspect.
        pid: Option<i64>,
    },

    /// Restrict the target to the processors in a cpulist string.
    Pin {
        /// Process to restrict.
        pid: Option<i64>,

        /// Processors to allow, in cpulist format (e.g. `0-3,8`).
        cpus: String,
    },

    /// Allow the target to run on every processor.
    Release {
        /// Process to release.
        pid: Option<i64>,
    },

    /// Print the number of processors the host has.
    Cpus,
}

/// The outcome of a successful run. Displays as the text the tool prints.
#[doc(hidden)]
#[derive(Clone, Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "this is a hidden enum for internal/test use only"
)]
pub enum RunOutcome {
    /// The affinity of a process was read.
    Affinity {
        /// The process that was inspected.
        target: ProcessTarget,

        /// The processors it may run on.
        cpus: CpuSet,
    },

    /// A process was pinned.
    Pinned {
        /// The process that was restricted.
        target: ProcessTarget,

        /// The processors it may now run on, in ascending order.
        cpus: Vec<u32>,
    },

    /// A process was released to all processors.
    Released {
        /// The process that was released.
        target: ProcessTarget,
    },

    /// The host processor count was read.
    CpuCount(usize),
}

impl Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Affinity { cpus, .. } => write!(f, "{cpus}"),
            Self::Pinned { target, cpus } => write!(
                f,
                "pinned {target} to processors {}",
                cpulist::emit(cpus.iter().copied())
            ),
            Self::Released { target } => write!(f, "released {target} to all processors"),
            Self::CpuCount(count) => write!(f, "{count}"),
        }
    }
}

/// Errors that can occur while running the tool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// The processor list given on the command line could not be parsed.
    #[error("invalid processor list '{cpus}': {source}")]
    InvalidCpuList {
        /// The processor list as it was given.
        cpus: String,

        /// What was wrong with it.
        #[source]
        source: cpulist::Error,
    },

    /// The processor list names a processor that no affinity mask can hold.
    #[error(
        "invalid processor list '{cpus}': processor {index} is not below {limit}",
        limit = process_affinity::MAX_CPU_COUNT
    )]
    CpuIndexOutOfRange {
        /// The processor list as it was given.
        cpus: String,

        /// The first processor index that is too large.
        index: usize,
    },

    /// The affinity operation itself failed.
    #[error(transparent)]
    Affinity(#[from] process_affinity::Error),
}
