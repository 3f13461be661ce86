//! Public handle through which every affinity operation flows.

use std::iter;

use tracing::{debug, trace};

use crate::pal::{Platform as _, PlatformFacade};
use crate::{CpuSet, Error, ErrorKind, InvalidCpuIndex, Operation, ProcessTarget, Result};

static CURRENT: ProcessAffinity = ProcessAffinity {
    platform: PlatformFacade::target(),
};

/// Reads and changes which processors a process is allowed to execute on.
///
/// Every operation performs exactly one affinity call against the operating system and reports
/// the outcome. Nothing is cached: the processor count and the identity of the current process
/// are looked up again on every call and the affinity mask of the target is always read from or
/// written to the operating system directly.
///
/// Mutating operations replace the affinity mask of the target. They never merge the requested
/// processors with the processors the target was previously allowed to use.
///
/// # Example
///
/// ```no_run
/// use process_affinity::{ProcessAffinity, ProcessTarget};
///
/// let affinity = ProcessAffinity::current();
///
/// affinity.pin_to_cpus(ProcessTarget::CurrentProcess, [0, 1])?;
/// let cpus = affinity.affinity(ProcessTarget::CurrentProcess)?;
/// println!("Now restricted to processors {cpus}");
///
/// affinity.release_to_all_cpus(ProcessTarget::CurrentProcess)?;
/// # Ok::<(), process_affinity::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct ProcessAffinity {
    platform: PlatformFacade,
}

impl ProcessAffinity {
    /// Returns the handle that operates on the real operating system.
    #[must_use]
    pub fn current() -> &'static Self {
        &CURRENT
    }

    #[cfg(test)]
    pub(crate) fn from_platform(platform: PlatformFacade) -> Self {
        Self { platform }
    }

    /// Restricts the target to run only on the processor with the given index.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::InvalidCpuIndex`] if `cpu` is negative or not below the current number of
    ///   processors on the host. The target is not affected.
    /// * [`ErrorKind::TargetUnavailable`] if the target process does not exist or may not be
    ///   accessed.
    /// * [`ErrorKind::HostOperationFailed`] if the operating system rejected the request for any
    ///   other reason.
    pub fn pin_to_cpu(&self, target: ProcessTarget, cpu: impl Into<i64>) -> Result<()> {
        self.pin_to_indices(target, iter::once(cpu.into()))
    }

    /// Restricts the target to run only on the processors with the given indices.
    ///
    /// Duplicate indices are ignored and their order is irrelevant.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::EmptyCpuSet`] if `cpus` is empty. The target is not affected.
    /// * [`ErrorKind::InvalidCpuIndex`] if any index is negative or not below the current number
    ///   of processors on the host. The target is not affected.
    /// * [`ErrorKind::TargetUnavailable`] if the target process does not exist or may not be
    ///   accessed.
    /// * [`ErrorKind::HostOperationFailed`] if the operating system rejected the request for any
    ///   other reason.
    pub fn pin_to_cpus<I>(&self, target: ProcessTarget, cpus: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<i64>,
    {
        self.pin_to_indices(target, cpus.into_iter().map(Into::into))
    }

    fn pin_to_indices(&self, target: ProcessTarget, cpus: impl Iterator<Item = i64>) -> Result<()> {
        let cpus = CpuSet::from_indices(cpus)
            .map_err(|invalid| fail(Operation::SetAffinity, target, invalid))?;

        self.pin_to_set(target, &cpus)
    }

    /// Restricts the target to run only on the processors in `cpus`.
    ///
    /// # Errors
    ///
    /// The same as [`pin_to_cpus()`][Self::pin_to_cpus].
    pub fn pin_to_set(&self, target: ProcessTarget, cpus: &CpuSet) -> Result<()> {
        let operation = Operation::SetAffinity;

        if cpus.is_empty() {
            return Err(fail(operation, target, ErrorKind::EmptyCpuSet));
        }

        let cpu_count = self.live_cpu_count(operation, target)?;

        if let Some(cpu) = cpus.iter().find(|cpu| *cpu as usize >= cpu_count) {
            return Err(fail(
                operation,
                target,
                InvalidCpuIndex::new(i64::from(cpu), cpu_count),
            ));
        }

        self.apply(operation, target, cpus)
    }

    /// Allows the target to run on every processor the host currently has.
    ///
    /// The processor count is determined at the time of the call, so processors that have come
    /// online since the target was pinned are included.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::TargetUnavailable`] if the target process does not exist or may not be
    ///   accessed.
    /// * [`ErrorKind::HostOperationFailed`] if the processor count could not be determined or the
    ///   operating system rejected the request for any other reason.
    pub fn release_to_all_cpus(&self, target: ProcessTarget) -> Result<()> {
        let operation = Operation::ResetAffinity;

        let cpu_count = self.live_cpu_count(operation, target)?;
        let cpus = CpuSet::all(cpu_count).map_err(|invalid| fail(operation, target, invalid))?;

        self.apply(operation, target, &cpus)
    }

    /// Returns the processors the target is currently allowed to run on.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::TargetUnavailable`] if the target process does not exist or may not be
    ///   accessed.
    /// * [`ErrorKind::HostOperationFailed`] if the operating system rejected the request for any
    ///   other reason.
    pub fn affinity(&self, target: ProcessTarget) -> Result<CpuSet> {
        let operation = Operation::GetAffinity;
        let resolved = target.resolve(&self.platform);

        match self.platform.get_affinity(resolved) {
            Ok(cpus) => {
                debug!(
                    %operation,
                    process = %target,
                    pid = resolved.pid(),
                    %cpus,
                    "read CPU affinity"
                );
                Ok(cpus)
            }
            Err(error) => Err(fail(operation, target, error)),
        }
    }

    /// Returns the number of processors the host currently has.
    ///
    /// This is the exclusive upper bound for processor indices accepted by the pin operations.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::HostOperationFailed`] if the operating system could not report the count.
    pub fn host_cpu_count(&self) -> Result<usize> {
        self.live_cpu_count(Operation::CountCpus, ProcessTarget::CurrentProcess)
    }

    fn live_cpu_count(&self, operation: Operation, target: ProcessTarget) -> Result<usize> {
        let cpu_count = self
            .platform
            .host_cpu_count()
            .map_err(|error| fail(operation, target, error))?;

        trace!(cpu_count, "queried host CPU count");

        Ok(cpu_count)
    }

    /// The single mutation behind every pin and release operation.
    fn apply(&self, operation: Operation, target: ProcessTarget, cpus: &CpuSet) -> Result<()> {
        let resolved = target.resolve(&self.platform);

        match self.platform.set_affinity(resolved, cpus) {
            Ok(()) => {
                debug!(
                    %operation,
                    process = %target,
                    pid = resolved.pid(),
                    %cpus,
                    "updated CPU affinity"
                );
                Ok(())
            }
            Err(error) => Err(fail(operation, target, error)),
        }
    }
}

fn fail(operation: Operation, target: ProcessTarget, kind: impl Into<ErrorKind>) -> Error {
    let error = Error::new(operation, target, kind);

    debug!(%operation, process = %target, %error, "CPU affinity operation failed");

    error
}
