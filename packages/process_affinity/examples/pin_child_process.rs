//! Starts a child process and pins it to the last processor of the host.

use std::error::Error;
use std::process::Command;

use process_affinity::{ProcessAffinity, ProcessTarget};

fn main() -> Result<(), Box<dyn Error>> {
    let affinity = ProcessAffinity::current();

    let mut child = Command::new("sleep").arg("2").spawn()?;
    let target = ProcessTarget::from(child.id());

    let last = affinity.host_cpu_count()?.saturating_sub(1);
    affinity.pin_to_cpu(target, i64::try_from(last)?)?;

    println!("{target} now runs on processors {}", affinity.affinity(target)?);

    child.wait()?;

    // The child has exited, so it can no longer be targeted.
    match affinity.affinity(target) {
        Ok(cpus) => println!("{target} is still visible with processors {cpus}"),
        Err(error) => println!("{error}"),
    }

    Ok(())
}
