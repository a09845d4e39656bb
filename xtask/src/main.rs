use std::process::Command;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

const DEMO_CONFIG: &str = "demos/sightline.yaml";

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for sightline")]
struct Cli {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand, Clone, Copy)]
enum Task {
    /// fmt, clippy, test and doc, stopping at the first failure
    Check,
    /// Verify formatting of every crate
    Fmt,
    /// Lint every target with warnings denied
    Clippy,
    /// Test the whole workspace
    Test,
    /// Build rustdoc without dependencies
    Doc,
    /// Build the whole workspace
    Build,
    /// Simulate the demo scenario and print its packets
    Demo {
        /// Log at debug level
        #[arg(short, long)]
        verbose: bool,
    },
}

impl Task {
    /// Cargo invocations making up this task, in order.
    fn invocations(self) -> Vec<Vec<&'static str>> {
        match self {
            Task::Check => [Task::Fmt, Task::Clippy, Task::Test, Task::Doc]
                .into_iter()
                .flat_map(Task::invocations)
                .collect(),
            Task::Fmt => vec![vec!["fmt", "--all", "--", "--check"]],
            Task::Clippy => vec![vec![
                "clippy",
                "--workspace",
                "--all-targets",
                "--",
                "-D",
                "warnings",
            ]],
            Task::Test => vec![vec!["test", "--workspace"]],
            Task::Doc => vec![vec!["doc", "--workspace", "--no-deps"]],
            Task::Build => vec![vec!["build", "--workspace"]],
            Task::Demo { verbose } => {
                let mut args = vec!["run", "-p", "sightline-cli", "--"];
                if verbose {
                    args.push("--verbose");
                }
                args.extend(["simulate", "--config", DEMO_CONFIG]);
                vec![args]
            }
        }
    }
}

fn cargo(args: &[&str]) -> Result<()> {
    let line = args.join(" ");
    println!("==> cargo {line}");
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("spawning cargo {line}"))?;
    if !status.success() {
        anyhow::bail!("cargo {line} failed with {status}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    for args in cli.task.invocations() {
        cargo(&args)?;
    }
    Ok(())
}
