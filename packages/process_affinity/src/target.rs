use std::fmt::{self, Display};

use tracing::trace;

use crate::pal::Platform;

/// Identifies the process whose affinity is read or changed.
///
/// An explicit process ID is not checked for existence up front. If it does not name a live
/// process that the caller is allowed to access, the operation fails with
/// [`ErrorKind::TargetUnavailable`][crate::ErrorKind::TargetUnavailable].
///
/// # Example
///
/// ```
/// use process_affinity::ProcessTarget;
///
/// let me = ProcessTarget::CurrentProcess;
/// let by_id = ProcessTarget::from(42_u32);
///
/// assert_eq!(me.to_string(), "the current process");
/// assert_eq!(by_id.to_string(), "PID 42");
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a process is either the caller or identified by its ID"
)]
pub enum ProcessTarget {
    /// The process that calls the operation, resolved when the operation executes.
    CurrentProcess,

    /// The process with the given operating system process ID.
    Pid(i64),
}

impl ProcessTarget {
    /// Resolves the target into the identifier handed to the host affinity calls.
    ///
    /// The current process is looked up on every call, never cached.
    pub(crate) fn resolve(self, platform: &impl Platform) -> ResolvedTarget {
        let resolved = match self {
            Self::CurrentProcess => resolve_self(platform),
            Self::Pid(pid) => resolve_explicit(pid),
        };

        trace!(process = %self, pid = resolved.pid(), "resolved affinity target");

        resolved
    }
}

fn resolve_self(platform: &impl Platform) -> ResolvedTarget {
    ResolvedTarget(platform.current_process_id())
}

// Range and existence checks are left to the host.
const fn resolve_explicit(pid: i64) -> ResolvedTarget {
    ResolvedTarget(pid)
}

impl Display for ProcessTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentProcess => f.write_str("the current process"),
            Self::Pid(pid) => write!(f, "PID {pid}"),
        }
    }
}

impl From<u32> for ProcessTarget {
    /// Targets a process by the ID type used by [`std::process`].
    fn from(pid: u32) -> Self {
        Self::Pid(i64::from(pid))
    }
}

impl From<i32> for ProcessTarget {
    fn from(pid: i32) -> Self {
        Self::Pid(i64::from(pid))
    }
}

impl From<i64> for ProcessTarget {
    fn from(pid: i64) -> Self {
        Self::Pid(pid)
    }
}

/// A process identifier ready to be handed to the platform, with "current process" already
/// replaced by the actual ID of the caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ResolvedTarget(i64);

impl ResolvedTarget {
    pub(crate) const fn pid(self) -> i64 {
        self.0
    }
}

#[cfg(test)]
impl ResolvedTarget {
    pub(crate) const fn for_pid(pid: i64) -> Self {
        Self(pid)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::pal::MockPlatform;

    assert_impl_all!(ProcessTarget: Send, Sync, Copy, Debug, Display);

    #[test]
    fn current_process_is_resolved_on_every_call() {
        let mut platform = MockPlatform::new();
        platform
            .expect_current_process_id()
            .times(2)
            .return_const(1234_i64);

        let first = ProcessTarget::CurrentProcess.resolve(&platform);
        let second = ProcessTarget::CurrentProcess.resolve(&platform);

        assert_eq!(first.pid(), 1234);
        assert_eq!(second.pid(), 1234);
    }

    #[test]
    fn explicit_pid_is_passed_through_verbatim() {
        // No expectations: resolving an explicit PID must not consult the platform.
        let platform = MockPlatform::new();

        for pid in [1, 0, -1, i64::MAX, i64::MIN] {
            assert_eq!(ProcessTarget::Pid(pid).resolve(&platform).pid(), pid);
        }
    }

    #[test]
    fn conversions_produce_explicit_targets() {
        assert_eq!(ProcessTarget::from(7_u32), ProcessTarget::Pid(7));
        assert_eq!(ProcessTarget::from(-7_i32), ProcessTarget::Pid(-7));
        assert_eq!(ProcessTarget::from(70_i64), ProcessTarget::Pid(70));
    }

    #[test]
    fn display_names_the_target() {
        assert_eq!(
            ProcessTarget::CurrentProcess.to_string(),
            "the current process"
        );
        assert_eq!(ProcessTarget::Pid(99).to_string(), "PID 99");
    }
}
