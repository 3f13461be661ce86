//! Example that demonstrates the usage shown in the package documentation.
//!
//! This pins the current process to the first processor it may use, then releases it again.

use process_affinity::{ProcessAffinity, ProcessTarget};

fn main() -> Result<(), process_affinity::Error> {
    println!("=== Process Affinity Example ===");

    let affinity = ProcessAffinity::current();
    let me = ProcessTarget::CurrentProcess;

    let original = affinity.affinity(me)?;
    println!("Started with processors {original}");

    let Some(first) = original.first() else {
        println!("The current process may not run on any processor, nothing to do.");
        return Ok(());
    };

    affinity.pin_to_cpu(me, first)?;
    println!("Pinned to processor {}", affinity.affinity(me)?);

    affinity.release_to_all_cpus(me)?;
    println!(
        "Released to all {} processors: {}",
        affinity.host_cpu_count()?,
        affinity.affinity(me)?
    );

    println!("Example completed successfully!");

    Ok(())
}
