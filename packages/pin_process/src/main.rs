#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Binary entry point for the `pin_process` tool.

use std::env;
use std::io;
use std::process::ExitCode;

use argh::FromArgs;
use pin_process::{RunInput, run};
use tracing_subscriber::EnvFilter;

/// Pin processes to processors, release them to all processors and inspect their processor
/// affinity. Set RUST_LOG to see what the tool does.
#[derive(FromArgs, Debug)]
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Command {
    Show(ShowArgs),
    Pin(PinArgs),
    Release(ReleaseArgs),
    Cpus(CpusArgs),
}

/// print the processors a process may run on, in cpulist format
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "show")]
struct ShowArgs {
    /// process to inspect instead of this tool's own process
    #[argh(option)]
    pid: Option<i64>,
}

/// restrict a process to the processors in a cpulist (e.g. 0-3,8)
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "pin")]
struct PinArgs {
    /// process to restrict instead of this tool's own process
    #[argh(option)]
    pid: Option<i64>,

    /// processors to allow, in cpulist format
    #[argh(positional)]
    cpus: String,
}

/// allow a process to run on every processor of the host
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "release")]
struct ReleaseArgs {
    /// process to release instead of this tool's own process
    #[argh(option)]
    pid: Option<i64>,
}

/// print the number of processors the host has
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "cpus")]
struct CpusArgs {}

impl From<Command> for RunInput {
    fn from(command: Command) -> Self {
        match command {
            Command::Show(ShowArgs { pid }) => Self::Show { pid },
            Command::Pin(PinArgs { pid, cpus }) => Self::Pin { pid, cpus },
            Command::Release(ReleaseArgs { pid }) => Self::Release { pid },
            Command::Cpus(CpusArgs {}) => Self::Cpus,
        }
    }
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
#[cfg_attr(coverage_nightly, coverage(off))]
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let env_args: Vec<String> = env::args().collect();
    let str_args: Vec<&str> = env_args.iter().map(String::as_str).collect();

    let Some((program_name, rest)) = str_args.split_first() else {
        eprintln!("Error: missing program name in process arguments");
        return ExitCode::FAILURE;
    };

    let args = match Args::from_args(&[program_name], rest) {
        Ok(args) => args,
        Err(early_exit) => {
            println!("{}", early_exit.output);
            return if early_exit.status.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    match run(&args.command.into()) {
        Ok(outcome) => {
            println!("{outcome}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RunInput {
        Args::from_args(&["pin_process"], args)
            .unwrap()
            .command
            .into()
    }

    #[test]
    fn show_defaults_to_own_process() {
        assert_eq!(parse(&["show"]), RunInput::Show { pid: None });
        assert_eq!(
            parse(&["show", "--pid", "42"]),
            RunInput::Show { pid: Some(42) }
        );
    }

    #[test]
    fn pin_takes_cpulist() {
        assert_eq!(
            parse(&["pin", "--pid", "42", "0-3,8"]),
            RunInput::Pin {
                pid: Some(42),
                cpus: "0-3,8".to_string(),
            }
        );
        assert_eq!(
            parse(&["pin", "1"]),
            RunInput::Pin {
                pid: None,
                cpus: "1".to_string(),
            }
        );
    }

    #[test]
    fn release_and_cpus_parse() {
        assert_eq!(
            parse(&["release", "--pid", "7"]),
            RunInput::Release { pid: Some(7) }
        );
        assert_eq!(parse(&["cpus"]), RunInput::Cpus);
    }

    #[test]
    fn pin_without_cpulist_is_usage_error() {
        let early_exit = Args::from_args(&["pin_process"], &["pin"]).unwrap_err();

        assert!(early_exit.status.is_err());
    }

    #[test]
    fn help_exits_successfully() {
        let early_exit = Args::from_args(&["pin_process"], &["--help"]).unwrap_err();

        assert!(early_exit.status.is_ok());
        assert!(early_exit.output.contains("pin"));
    }
}
