use std::fmt::Debug;
use std::{io, mem};

use libc::{c_long, cpu_set_t, pid_t};

use crate::pal::linux::Bindings;

/// FFI bindings that target the real operating system that the build is targeting.
///
/// You would only use different bindings in PAL unit tests that need to use mock bindings.
/// Even then, whenever possible, unit tests should use real bindings for maximum realism.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetBindings;

// Real OS bindings are excluded from coverage measurement because:
// 1. They are tested via integration tests running on actual Linux.
// 2. Error paths require OS-level failures that are impractical to trigger in tests.
#[cfg_attr(coverage_nightly, coverage(off))]
impl Bindings for BuildTargetBindings {
    fn sched_setaffinity(&self, pid: pid_t, cpuset: &cpu_set_t) -> Result<(), io::Error> {
        // SAFETY: No safety requirements beyond passing valid arguments.
        let result = unsafe { libc::sched_setaffinity(pid, size_of::<cpu_set_t>(), cpuset) };

        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    fn sched_getaffinity(&self, pid: pid_t) -> Result<cpu_set_t, io::Error> {
        // SAFETY: All zeroes is a valid cpu_set_t.
        let mut cpuset: cpu_set_t = unsafe { mem::zeroed() };

        // SAFETY: No safety requirements beyond passing valid arguments.
        let result =
            unsafe { libc::sched_getaffinity(pid, size_of::<cpu_set_t>(), &raw mut cpuset) };

        if result == 0 {
            Ok(cpuset)
        } else {
            Err(io::Error::last_os_error())
        }
    }

    fn getpid(&self) -> pid_t {
        // SAFETY: No safety requirements.
        unsafe { libc::getpid() }
    }

    fn sysconf_nprocessors_onln(&self) -> Result<usize, io::Error> {
        // SAFETY: No safety requirements.
        let count = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };

        if count < 0 {
            return Err(io::Error::last_os_error());
        }

        online_cpu_count(count)
    }
}

/// Interprets a `sysconf(_SC_NPROCESSORS_ONLN)` result that did not set `errno`.
///
/// A count that is not positive is still unusable and gets its own diagnostic.
fn online_cpu_count(count: c_long) -> Result<usize, io::Error> {
    usize::try_from(count)
        .ok()
        .filter(|count| *count > 0)
        .ok_or_else(|| {
            io::Error::other(format!(
                "sysconf(_SC_NPROCESSORS_ONLN) reported {count} online processors"
            ))
        })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn positive_count_is_accepted() {
        assert_eq!(online_cpu_count(1).unwrap(), 1);
        assert_eq!(online_cpu_count(256).unwrap(), 256);
    }

    #[test]
    fn non_positive_count_has_own_diagnostic() {
        for count in [0, -1] {
            let error = online_cpu_count(count).unwrap_err();

            assert_eq!(error.kind(), io::ErrorKind::Other);
            assert_eq!(error.raw_os_error(), None);
            assert_eq!(
                error.to_string(),
                format!("sysconf(_SC_NPROCESSORS_ONLN) reported {count} online processors")
            );
        }
    }
}
