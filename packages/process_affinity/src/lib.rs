#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Control which processors a process is allowed to run on.
//!
//! The operating system decides for every process which processors its threads may be scheduled
//! on. This set of processors is the processor affinity of the process. By default a process may
//! run on every processor but it is often useful to restrict this, for example to keep a noisy
//! background job away from the processors used by a latency-sensitive service or to make
//! benchmark results more repeatable.
//!
//! This package exposes four operations, each available for the current process and for any
//! other process identified by its process ID:
//!
//! * Pin a process to a single processor with [`ProcessAffinity::pin_to_cpu()`].
//! * Pin a process to a set of processors with [`ProcessAffinity::pin_to_cpus()`] or
//!   [`ProcessAffinity::pin_to_set()`].
//! * Release a process to run on every processor with
//!   [`ProcessAffinity::release_to_all_cpus()`].
//! * Read the current affinity of a process with [`ProcessAffinity::affinity()`].
//!
//! # Quick start
//!
//! ```no_run
//! // examples/pin_and_release.rs
//! use process_affinity::{ProcessAffinity, ProcessTarget};
//!
//! let affinity = ProcessAffinity::current();
//! let me = ProcessTarget::CurrentProcess;
//!
//! affinity.pin_to_cpu(me, 0)?;
//! assert_eq!(affinity.affinity(me)?.to_string(), "0");
//!
//! affinity.release_to_all_cpus(me)?;
//! # Ok::<(), process_affinity::Error>(())
//! ```
//!
//! # Processor indices
//!
//! Processors are identified by their operating system index, counting from zero. The indices
//! accepted by the pin operations must be below [`ProcessAffinity::host_cpu_count()`], which is
//! queried again on every call. Invalid indices are rejected before the operating system is asked
//! to change anything, so a failed pin never leaves the target with a partially applied mask.
//!
//! Affinity masks are returned as a [`CpuSet`], which displays itself in the Linux cpulist format
//! (e.g. `0-3,8`).
//!
//! # Operating system compatibility
//!
//! Affinity can be read and changed on Linux. On other operating systems every affinity operation
//! fails with [`ErrorKind::HostOperationFailed`].

mod affinity;
mod cpu_set;
mod error;
mod pal;
mod target;

pub use affinity::*;
pub use cpu_set::*;
pub use error::*;
pub use target::ProcessTarget;
pub(crate) use target::ResolvedTarget;
