use std::{io, mem};

use libc::{cpu_set_t, pid_t};

use crate::pal::linux::{Bindings, BindingsFacade};
use crate::pal::{HostError, Platform};
use crate::{CpuSet, MAX_CPU_COUNT, ResolvedTarget};

// A CpuSet must be able to describe every processor a cpu_set_t can, and no more.
const _: () = assert!(size_of::<cpu_set_t>() * 8 == MAX_CPU_COUNT);

/// Singleton instance of `BuildTargetPlatform`, used by public API types
/// to hook up to the correct PAL implementation.
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform =
    BuildTargetPlatform::new(BindingsFacade::target());

/// The platform that matches the crate's build target.
///
/// You would only use a different platform in unit tests that need to mock the platform.
/// Even then, whenever possible, unit tests should use the real platform for maximum realism.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform {
    bindings: BindingsFacade,
}

impl BuildTargetPlatform {
    pub(crate) const fn new(bindings: BindingsFacade) -> Self {
        Self { bindings }
    }
}

impl Platform for BuildTargetPlatform {
    fn set_affinity(&self, target: ResolvedTarget, cpus: &CpuSet) -> Result<(), HostError> {
        let pid = to_pid(target)?;
        let cpu_set = to_cpu_set(cpus);

        self.bindings
            .sched_setaffinity(pid, &cpu_set)
            .map_err(classify)
    }

    fn get_affinity(&self, target: ResolvedTarget) -> Result<CpuSet, HostError> {
        let pid = to_pid(target)?;

        let cpu_set = self.bindings.sched_getaffinity(pid).map_err(classify)?;

        Ok(from_cpu_set(&cpu_set))
    }

    fn host_cpu_count(&self) -> Result<usize, HostError> {
        self.bindings
            .sysconf_nprocessors_onln()
            .map_err(HostError::Failed)
    }

    fn current_process_id(&self) -> i64 {
        i64::from(self.bindings.getpid())
    }
}

/// Identifiers that cannot name a process (negative, or too large for `pid_t`) are reported the
/// same way the kernel reports a missing process. PID 0 is passed through and the kernel
/// interprets it as the calling thread.
fn to_pid(target: ResolvedTarget) -> Result<pid_t, HostError> {
    pid_t::try_from(target.pid())
        .ok()
        .filter(|pid| *pid >= 0)
        .ok_or_else(|| HostError::TargetUnavailable(io::Error::from_raw_os_error(libc::ESRCH)))
}

fn classify(error: io::Error) -> HostError {
    match error.raw_os_error() {
        Some(libc::ESRCH | libc::EPERM) => HostError::TargetUnavailable(error),
        _ => HostError::Failed(error),
    }
}

fn to_cpu_set(cpus: &CpuSet) -> cpu_set_t {
    // SAFETY: Zero-initialized cpu_set_t is a valid value.
    let mut cpu_set: cpu_set_t = unsafe { mem::zeroed() };

    for cpu in cpus {
        // SAFETY: CpuSet members are below MAX_CPU_COUNT, which is the capacity of cpu_set_t.
        unsafe {
            libc::CPU_SET(cpu as usize, &mut cpu_set);
        }
    }

    cpu_set
}

fn from_cpu_set(cpu_set: &cpu_set_t) -> CpuSet {
    // SAFETY: CpuSet only asks about indices below MAX_CPU_COUNT, the capacity of cpu_set_t.
    CpuSet::from_predicate(|cpu| unsafe { libc::CPU_ISSET(cpu as usize, cpu_set) })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::pal::linux::MockBindings;

    fn cpuset_from(cpus: &[usize]) -> cpu_set_t {
        // SAFETY: Zero-initialized CPU set is correct.
        let mut cpu_set: cpu_set_t = unsafe { mem::zeroed() };

        for cpu in cpus {
            // SAFETY: Test data stays below CPU_SETSIZE.
            unsafe {
                libc::CPU_SET(*cpu, &mut cpu_set);
            }
        }

        cpu_set
    }

    fn members_of(cpu_set: &cpu_set_t) -> Vec<usize> {
        (0..MAX_CPU_COUNT)
            // SAFETY: Index stays below CPU_SETSIZE.
            .filter(|cpu| unsafe { libc::CPU_ISSET(*cpu, cpu_set) })
            .collect()
    }

    fn platform_with(bindings: MockBindings) -> BuildTargetPlatform {
        BuildTargetPlatform::new(BindingsFacade::from_mock(bindings))
    }

    #[test]
    fn set_affinity_passes_exact_mask_and_pid() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_sched_setaffinity()
            .withf(|pid, cpu_set| *pid == 4321 && members_of(cpu_set) == vec![0, 2, 3, 1023])
            .times(1)
            .returning(|_, _| Ok(()));

        let platform = platform_with(bindings);
        let cpus = CpuSet::from_indices([0, 2, 3, 1023]).unwrap();

        platform
            .set_affinity(ResolvedTarget::for_pid(4321), &cpus)
            .unwrap();
    }

    #[test]
    fn get_affinity_translates_mask() {
        let mut bindings = MockBindings::new();

        let mask = cpuset_from(&[1, 64, 700]);

        bindings
            .expect_sched_getaffinity()
            .withf(|pid| *pid == 77)
            .times(1)
            .returning(move |_| Ok(mask));

        let platform = platform_with(bindings);

        let cpus = platform.get_affinity(ResolvedTarget::for_pid(77)).unwrap();

        assert_eq!(cpus.iter().collect::<Vec<_>>(), vec![1, 64, 700]);
    }

    #[test]
    fn missing_process_is_target_unavailable() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_sched_getaffinity()
            .times(1)
            .returning(|_| Err(io::Error::from_raw_os_error(libc::ESRCH)));

        let platform = platform_with(bindings);

        let error = platform
            .get_affinity(ResolvedTarget::for_pid(999_999))
            .unwrap_err();

        assert!(matches!(error, HostError::TargetUnavailable(_)));
    }

    #[test]
    fn permission_denied_is_target_unavailable() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_sched_setaffinity()
            .times(1)
            .returning(|_, _| Err(io::Error::from_raw_os_error(libc::EPERM)));

        let platform = platform_with(bindings);

        let error = platform
            .set_affinity(ResolvedTarget::for_pid(1), &CpuSet::all(1).unwrap())
            .unwrap_err();

        assert!(matches!(error, HostError::TargetUnavailable(_)));
    }

    #[test]
    fn other_errors_are_host_failures() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_sched_setaffinity()
            .times(1)
            .returning(|_, _| Err(io::Error::from_raw_os_error(libc::EINVAL)));

        let platform = platform_with(bindings);

        let error = platform
            .set_affinity(ResolvedTarget::for_pid(1), &CpuSet::all(1).unwrap())
            .unwrap_err();

        let HostError::Failed(inner) = error else {
            panic!("expected host failure, got {error:?}");
        };
        assert_eq!(inner.raw_os_error(), Some(libc::EINVAL));
    }

    #[test]
    fn unrepresentable_pid_fails_without_calling_host() {
        // No expectations: any call into the bindings would panic.
        let platform = platform_with(MockBindings::new());

        for pid in [-1, i64::from(pid_t::MIN), i64::from(pid_t::MAX) + 1, i64::MAX] {
            let target = ResolvedTarget::for_pid(pid);

            let error = platform.get_affinity(target).unwrap_err();
            assert!(matches!(error, HostError::TargetUnavailable(_)));

            let error = platform
                .set_affinity(target, &CpuSet::all(1).unwrap())
                .unwrap_err();
            assert!(matches!(error, HostError::TargetUnavailable(_)));
        }
    }

    #[test]
    fn current_process_id_comes_from_getpid() {
        let mut bindings = MockBindings::new();

        bindings.expect_getpid().times(1).return_const(555);

        let platform = platform_with(bindings);

        assert_eq!(platform.current_process_id(), 555);
    }

    #[test]
    fn host_cpu_count_comes_from_sysconf() {
        let mut bindings = MockBindings::new();

        bindings
            .expect_sysconf_nprocessors_onln()
            .times(1)
            .returning(|| Ok(12));

        let platform = platform_with(bindings);

        assert_eq!(platform.host_cpu_count().unwrap(), 12);
    }

    #[test]
    fn real_bindings_report_current_process() {
        let platform = BuildTargetPlatform::new(BindingsFacade::target());

        assert_eq!(
            platform.current_process_id(),
            i64::from(std::process::id())
        );
        assert!(platform.host_cpu_count().unwrap() >= 1);

        let target = ResolvedTarget::for_pid(platform.current_process_id());
        let cpus = platform.get_affinity(target).unwrap();

        assert!(!cpus.is_empty());
    }
}
