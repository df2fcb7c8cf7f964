//! nspeer command - find the host veth peer of a namespaced process.

mod commands;

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "nspeer",
    version,
    about = "Find the host-side veth peer of a process's network interface"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the host interface paired with an address or device.
    #[command(visible_alias = "r")]
    Resolve(commands::resolve::ResolveCmd),

    /// List interfaces and addresses of the host namespace.
    #[command(visible_alias = "s")]
    Show(commands::show::ShowCmd),

    /// Inspect one candidate namespace and report on stdout.
    #[command(hide = true)]
    Worker(commands::worker::WorkerCmd),
}

fn main() -> ExitCode {
    // stdout carries the worker report, so logs always go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        // Must run before any runtime thread exists
        Command::Worker(cmd) => return cmd.run(),
        Command::Resolve(cmd) => block_on(cmd.run()),
        Command::Show(cmd) => block_on(cmd.run()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn block_on<F>(future: F) -> anyhow::Result<ExitCode>
where
    F: Future<Output = anyhow::Result<ExitCode>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("cannot start runtime")?;
    runtime.block_on(future)
}
