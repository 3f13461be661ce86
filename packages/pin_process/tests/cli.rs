//! Runs the `pin_process` binary against child processes it does not share affinity with.

#![cfg(all(target_os = "linux", not(miri)))]

use std::process::{Command, Output};

fn pin_process(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pin_process"))
        .args(args)
        .output()
        .unwrap()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn cpus_prints_processor_count() {
    let output = pin_process(&["cpus"]);

    assert!(output.status.success());
    assert!(stdout_of(&output).parse::<usize>().unwrap() >= 1);
}

#[test]
fn show_own_process_prints_cpulist() {
    let output = pin_process(&["show"]);

    assert!(output.status.success());
    assert!(!cpulist::parse(&stdout_of(&output)).unwrap().is_empty());
}

#[test]
fn pin_and_release_child_process() {
    let mut child = Command::new("sleep").arg("30").spawn().unwrap();
    let pid = child.id().to_string();

    let allowed = cpulist::parse(&stdout_of(&pin_process(&["show", "--pid", &pid]))).unwrap();
    let first = allowed.first().unwrap().to_string();

    let output = pin_process(&["pin", "--pid", &pid, &first]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_of(&output),
        format!("pinned PID {pid} to processors {first}")
    );

    let output = pin_process(&["show", "--pid", &pid]);
    assert_eq!(stdout_of(&output), first);

    let output = pin_process(&["release", "--pid", &pid]);
    assert!(output.status.success(), "{output:?}");

    let output = pin_process(&["show", "--pid", &pid]);
    assert!(!cpulist::parse(&stdout_of(&output)).unwrap().is_empty());

    child.kill().unwrap();
    child.wait().unwrap();
}

#[test]
fn missing_process_fails() {
    let output = pin_process(&["show", "--pid", "2147483647"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("PID 2147483647"));
}

#[test]
fn malformed_cpulist_fails() {
    let output = pin_process(&["pin", "zero"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid processor list"));
}

#[test]
fn oversized_cpulist_fails() {
    let output = pin_process(&["pin", "0-4294967295"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("is not below 1024"));
}
