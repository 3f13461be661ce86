#![cfg_attr(
    test,
    expect(
        clippy::struct_field_names,
        reason = "false positive from automock generated code"
    )
)]

use std::fmt::Debug;
use std::io;

use crate::{CpuSet, ErrorKind, ResolvedTarget};

/// The host primitives that affinity operations are built from.
///
/// Each method maps to exactly one operating system call (or an equivalent lookup). Nothing is
/// cached, every call observes the current state of the host.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Replaces the affinity mask of the target with `cpus`.
    fn set_affinity(&self, target: ResolvedTarget, cpus: &CpuSet) -> Result<(), HostError>;

    /// Reads the affinity mask of the target.
    fn get_affinity(&self, target: ResolvedTarget) -> Result<CpuSet, HostError>;

    /// The number of processors currently visible to the host.
    fn host_cpu_count(&self) -> Result<usize, HostError>;

    /// The operating system identifier of the calling process.
    fn current_process_id(&self) -> i64;
}

/// A failed host call, classified by whether the target process was the problem.
#[derive(Debug)]
pub(crate) enum HostError {
    /// The process does not exist or may not be accessed.
    TargetUnavailable(io::Error),

    /// Anything else.
    Failed(io::Error),
}

impl From<HostError> for ErrorKind {
    fn from(value: HostError) -> Self {
        match value {
            HostError::TargetUnavailable(inner) => Self::TargetUnavailable(inner),
            HostError::Failed(inner) => Self::HostOperationFailed(inner),
        }
    }
}
