use std::fmt::{self, Display};
use std::io;

use thiserror::Error;

use crate::{InvalidCpuIndex, ProcessTarget};

/// The affinity operation that failed, as reported by [`Error::operation()`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Operation {
    /// Pinning a process to one or more processors.
    SetAffinity,

    /// Releasing a process to run on all processors.
    ResetAffinity,

    /// Reading the affinity mask of a process.
    GetAffinity,

    /// Querying how many processors the host currently has.
    CountCpus,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SetAffinity => "set CPU affinity",
            Self::ResetAffinity => "reset CPU affinity",
            Self::GetAffinity => "get CPU affinity",
            Self::CountCpus => "count host CPUs",
        })
    }
}

/// Why an affinity operation failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A supplied processor index was negative, not representable in a [`CpuSet`][crate::CpuSet]
    /// or not below the number of processors the host currently has.
    ///
    /// Detected before the host is asked to do anything, so the target was not affected.
    #[error(transparent)]
    InvalidCpuIndex(#[from] InvalidCpuIndex),

    /// A pin operation was given no processors at all.
    ///
    /// Detected before the host is asked to do anything, so the target was not affected.
    #[error("no CPU indices were supplied")]
    EmptyCpuSet,

    /// The target process does not exist, has exited or may not be accessed by the caller.
    #[error("the target process does not exist or is not accessible: {0}")]
    TargetUnavailable(#[source] io::Error),

    /// The host rejected the operation for some other reason. The host diagnostic is attached.
    #[error("the host rejected the operation: {0}")]
    HostOperationFailed(#[source] io::Error),
}

/// An affinity operation failed.
///
/// Identifies the operation and the target it was applied to, with the reason available via
/// [`kind()`][Self::kind]. A failed operation never leaves the target with a partially applied
/// affinity mask.
#[derive(Debug, Error)]
pub struct Error {
    operation: Operation,
    target: ProcessTarget,

    #[source]
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(
        operation: Operation,
        target: ProcessTarget,
        kind: impl Into<ErrorKind>,
    ) -> Self {
        Self {
            operation,
            target,
            kind: kind.into(),
        }
    }

    /// The operation that failed.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The target as it was supplied by the caller.
    ///
    /// Counting host processors is not tied to any process. Those failures report
    /// [`ProcessTarget::CurrentProcess`] here and leave the target out of the message.
    #[must_use]
    pub fn target(&self) -> ProcessTarget {
        self.target
    }

    /// Why the operation failed.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Consumes the error, returning the reason the operation failed.
    #[must_use]
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            operation,
            target,
            kind,
        } = self;

        match operation {
            // The processor count belongs to the host, not to the process that asked for it.
            Operation::CountCpus => write!(f, "failed to {operation}: {kind}"),
            Operation::SetAffinity | Operation::ResetAffinity | Operation::GetAffinity => {
                write!(f, "failed to {operation} for {target}: {kind}")
            }
        }
    }
}

/// A specialized `Result` type for affinity operations, returning the crate's [`Error`] type as
/// the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::error::Error as _;
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);
    assert_impl_all!(ErrorKind: Send, Sync, Debug);
    assert_impl_all!(Operation: Send, Sync, Copy, Debug, Display);

    #[test]
    fn message_identifies_operation_target_and_index() {
        let error = Error::new(
            Operation::SetAffinity,
            ProcessTarget::Pid(123),
            InvalidCpuIndex::new(99, 4),
        );

        assert_eq!(
            error.to_string(),
            "failed to set CPU affinity for PID 123: \
             CPU index 99 is out of range, valid indices are 0 to 3"
        );
        assert_eq!(error.operation(), Operation::SetAffinity);
        assert_eq!(error.target(), ProcessTarget::Pid(123));
        assert!(matches!(
            error.kind(),
            ErrorKind::InvalidCpuIndex(invalid) if invalid.index() == 99
        ));
    }

    #[test]
    fn host_diagnostic_is_exposed_as_source() {
        let error = Error::new(
            Operation::GetAffinity,
            ProcessTarget::CurrentProcess,
            ErrorKind::HostOperationFailed(io::Error::other("out of cheese")),
        );

        assert!(error.to_string().contains("out of cheese"));

        let kind = error.source().unwrap();
        assert!(kind.source().unwrap().to_string().contains("out of cheese"));
    }

    #[test]
    fn cpu_count_message_names_no_process() {
        let error = Error::new(
            Operation::CountCpus,
            ProcessTarget::CurrentProcess,
            ErrorKind::HostOperationFailed(io::Error::other("no online processors")),
        );

        assert_eq!(
            error.to_string(),
            "failed to count host CPUs: the host rejected the operation: no online processors"
        );
    }

    #[test]
    fn into_kind_returns_reason() {
        let error = Error::new(
            Operation::ResetAffinity,
            ProcessTarget::Pid(1),
            ErrorKind::EmptyCpuSet,
        );

        assert!(matches!(error.into_kind(), ErrorKind::EmptyCpuSet));
    }

    #[test]
    fn operations_have_readable_names() {
        assert_eq!(Operation::SetAffinity.to_string(), "set CPU affinity");
        assert_eq!(Operation::ResetAffinity.to_string(), "reset CPU affinity");
        assert_eq!(Operation::GetAffinity.to_string(), "get CPU affinity");
        assert_eq!(Operation::CountCpus.to_string(), "count host CPUs");
    }
}
