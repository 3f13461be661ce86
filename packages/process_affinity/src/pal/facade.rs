use std::fmt::{self, Debug};
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use crate::pal::MockPlatform;
#[cfg(test)]
use crate::pal::fallback::BuildTargetPlatform as FallbackPlatform;
use crate::pal::{BUILD_TARGET_PLATFORM, BuildTargetPlatform, HostError, Platform};
use crate::{CpuSet, ResolvedTarget};

/// Enum to hide the real/fallback/mock choice behind a single wrapper type.
#[derive(Clone)]
pub(crate) enum PlatformFacade {
    Target(&'static BuildTargetPlatform),

    #[cfg(test)]
    Fallback(&'static FallbackPlatform),

    #[cfg(test)]
    Mock(Arc<MockPlatform>),
}

impl PlatformFacade {
    pub(crate) const fn target() -> Self {
        Self::Target(&BUILD_TARGET_PLATFORM)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockPlatform) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Platform for PlatformFacade {
    fn set_affinity(&self, target: ResolvedTarget, cpus: &CpuSet) -> Result<(), HostError> {
        match self {
            Self::Target(p) => p.set_affinity(target, cpus),
            #[cfg(test)]
            Self::Fallback(p) => p.set_affinity(target, cpus),
            #[cfg(test)]
            Self::Mock(p) => p.set_affinity(target, cpus),
        }
    }

    fn get_affinity(&self, target: ResolvedTarget) -> Result<CpuSet, HostError> {
        match self {
            Self::Target(p) => p.get_affinity(target),
            #[cfg(test)]
            Self::Fallback(p) => p.get_affinity(target),
            #[cfg(test)]
            Self::Mock(p) => p.get_affinity(target),
        }
    }

    fn host_cpu_count(&self) -> Result<usize, HostError> {
        match self {
            Self::Target(p) => p.host_cpu_count(),
            #[cfg(test)]
            Self::Fallback(p) => p.host_cpu_count(),
            #[cfg(test)]
            Self::Mock(p) => p.host_cpu_count(),
        }
    }

    fn current_process_id(&self) -> i64 {
        match self {
            Self::Target(p) => p.current_process_id(),
            #[cfg(test)]
            Self::Fallback(p) => p.current_process_id(),
            #[cfg(test)]
            Self::Mock(p) => p.current_process_id(),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl Debug for PlatformFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Fallback(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Mock(inner) => inner.fmt(f),
        }
    }
}
