#![cfg_attr(
    test,
    expect(
        clippy::struct_field_names,
        reason = "false positive from automock generated code"
    )
)]

use std::fmt::Debug;
use std::io;

use libc::{cpu_set_t, pid_t};

/// Bindings for FFI calls into external libraries (either provided by operating system or not).
///
/// All PAL FFI calls must go through this trait, enabling them to be mocked.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Bindings: Debug + Send + Sync + 'static {
    // sched_setaffinity() for the given PID (0 means calling thread)
    fn sched_setaffinity(&self, pid: pid_t, cpuset: &cpu_set_t) -> Result<(), io::Error>;

    // sched_getaffinity() for the given PID (0 means calling thread)
    fn sched_getaffinity(&self, pid: pid_t) -> Result<cpu_set_t, io::Error>;

    fn getpid(&self) -> pid_t;

    // sysconf(_SC_NPROCESSORS_ONLN)
    fn sysconf_nprocessors_onln(&self) -> Result<usize, io::Error>;
}
