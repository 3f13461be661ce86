use std::io;
use std::num::NonZero;
use std::thread;

use crate::pal::{HostError, Platform};
use crate::{CpuSet, ResolvedTarget};

/// Fallback platform implementation for operating systems without native support.
///
/// Processor counting and process identification work everywhere via the standard library but
/// there is no portable way to read or change the affinity of a process, so those operations
/// fail with an [`io::ErrorKind::Unsupported`] error.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform;

/// Singleton instance of `BuildTargetPlatform`, used by public API types
/// to hook up to the correct PAL implementation.
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;

fn unsupported() -> HostError {
    HostError::Failed(io::Error::new(
        io::ErrorKind::Unsupported,
        "process affinity is not supported on this platform",
    ))
}

impl Platform for BuildTargetPlatform {
    fn set_affinity(&self, _target: ResolvedTarget, _cpus: &CpuSet) -> Result<(), HostError> {
        Err(unsupported())
    }

    fn get_affinity(&self, _target: ResolvedTarget) -> Result<CpuSet, HostError> {
        Err(unsupported())
    }

    fn host_cpu_count(&self) -> Result<usize, HostError> {
        thread::available_parallelism()
            .map(NonZero::get)
            .map_err(HostError::Failed)
    }

    fn current_process_id(&self) -> i64 {
        i64::from(std::process::id())
    }
}
