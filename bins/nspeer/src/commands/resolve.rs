//! nspeer resolve command implementation.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use nspeer::pool::DEFAULT_TIMEOUT;
use nspeer::{
    PidList, PoolConfig, ProcScan, ProcessSource, Resolution, Resolver, Target, WorkerCommand,
};

/// Exit status when the target was not resolved.
const NOT_FOUND: u8 = 2;

#[derive(Args)]
pub struct ResolveCmd {
    /// Address to look for inside candidate namespaces.
    #[arg(required_unless_present_any = ["pid", "dev"])]
    address: Option<String>,

    /// Interface name glob to look for instead of an address (default: eth0).
    #[arg(long, conflicts_with = "address")]
    dev: Option<String>,

    /// Only scan processes whose command name matches this glob.
    #[arg(long, conflicts_with = "pid")]
    pattern: Vec<String>,

    /// Candidate process, tried in the given order. Skips the process scan.
    #[arg(long)]
    pid: Vec<u32>,

    /// Maximum number of concurrent workers (0 = unbounded).
    #[arg(long, short = 'j', default_value_t = 0)]
    jobs: usize,

    /// Per-worker timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,

    /// Also scan processes in our own network namespace.
    #[arg(long)]
    include_host: bool,

    /// Scan every matching process instead of one per namespace.
    #[arg(long)]
    all_pids: bool,
}

impl ResolveCmd {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let target = match (&self.address, &self.dev) {
            (Some(addr), _) => Target::address(addr)?,
            (None, Some(dev)) => Target::device(dev.as_str())?,
            (None, None) => Target::default(),
        };

        let command = WorkerCommand::current_exe().context("cannot locate the nspeer executable")?;
        let config = PoolConfig::new(command)
            .jobs(self.jobs)
            .timeout(Duration::from_millis(self.timeout_ms));
        let resolver = Resolver::new(config);

        let source: Box<dyn ProcessSource> = if self.pid.is_empty() {
            Box::new(
                ProcScan::new()
                    .patterns(&self.pattern)?
                    .include_host(self.include_host)
                    .all_pids(self.all_pids),
            )
        } else {
            Box::new(PidList(self.pid))
        };

        let resolution = resolver.resolve_from(&target, source.as_ref()).await?;
        report(&target, &resolution)
    }
}

fn report(target: &Target, resolution: &Resolution) -> anyhow::Result<ExitCode> {
    let failures: Vec<_> = resolution.failures().collect();
    for outcome in &failures {
        let kind = outcome.result.error.map(|k| k.to_string()).unwrap_or_default();
        eprintln!("nspeer: pid {}: {}", outcome.result.candidate, kind);
    }

    if let Some(name) = resolution.aggregation.name() {
        println!("{}", name);
        return Ok(ExitCode::SUCCESS);
    }

    if !resolution.outcomes.is_empty() && failures.len() == resolution.outcomes.len() {
        anyhow::bail!(
            "{}: all {} candidate(s) failed",
            target,
            resolution.outcomes.len()
        );
    }

    eprintln!("nspeer: {} not found: {}", target, resolution.aggregation);
    Ok(ExitCode::from(NOT_FOUND))
}
