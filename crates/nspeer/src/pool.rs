//! The coordinator side: one worker process per candidate.
//!
//! Workers are separate OS processes, never threads: network namespace
//! membership is per-thread kernel state, and a multi-threaded runtime
//! cannot safely move one of its threads into another namespace. Each
//! worker is the worker program re-executed with `--pid <pid>` and a
//! target, reporting one record over its stdout.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::report::{ErrorKind, RECORD_LEN, WorkerResult};
use crate::worker::Target;

/// Default per-worker timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Subcommand the default worker command re-executes.
pub const WORKER_SUBCOMMAND: &str = "worker";

/// The program and leading arguments used to start a worker.
///
/// `--pid <pid>` and the target arguments are appended per candidate.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl WorkerCommand {
    /// A worker command running `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a leading argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The current executable with the hidden worker subcommand.
    pub fn current_exe() -> io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?).arg(WORKER_SUBCOMMAND))
    }

    fn command(&self, candidate: u32, target: &Target) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--pid")
            .arg(candidate.to_string())
            .args(target.worker_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    command: WorkerCommand,
    max_in_flight: Option<NonZeroUsize>,
    timeout: Duration,
}

impl PoolConfig {
    /// Unbounded pool with the default timeout.
    pub fn new(command: WorkerCommand) -> Self {
        Self {
            command,
            max_in_flight: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Allow at most `jobs` workers at once. Zero means unbounded.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.max_in_flight = NonZeroUsize::new(jobs);
        self
    }

    /// Kill a worker that has not reported and exited within `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One worker's result and how its process ended.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    /// What the worker reported, or the failure recorded for it.
    pub result: WorkerResult,
    /// Exit status, `None` if the process could not be waited for.
    pub status: Option<ExitStatus>,
}

/// Results of one pool run, in candidate order.
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    outcomes: Vec<WorkerOutcome>,
    skipped: usize,
}

impl PoolReport {
    /// Per-worker outcomes, in candidate order.
    pub fn outcomes(&self) -> &[WorkerOutcome] {
        &self.outcomes
    }

    /// Worker results, in candidate order.
    pub fn results(&self) -> Vec<WorkerResult> {
        self.outcomes.iter().map(|o| o.result).collect()
    }

    /// Number of candidates never spawned because an earlier one matched.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Outcomes of workers that failed.
    pub fn failures(&self) -> impl Iterator<Item = &WorkerOutcome> {
        self.outcomes.iter().filter(|o| o.result.error.is_some())
    }
}

/// Runs workers for a candidate list.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    config: PoolConfig,
}

impl WorkerPool {
    /// Create a pool; no process starts until [`WorkerPool::run`].
    pub fn new(config: PoolConfig) -> Self {
        Self { config }
    }

    /// Run one worker per candidate and collect their results in order.
    ///
    /// With a concurrency bound, the oldest worker is awaited whenever the
    /// bound is reached, and spawning stops once a collected result is a
    /// match. Every spawned worker is reaped before this returns, including
    /// when a spawn fails.
    pub async fn run(&self, candidates: &[u32], target: &Target) -> Result<PoolReport> {
        let mut in_flight: VecDeque<(u32, JoinHandle<WorkerOutcome>)> = VecDeque::new();
        let mut outcomes = Vec::with_capacity(candidates.len());
        let mut matched = false;

        for &candidate in candidates {
            if let Some(limit) = self.config.max_in_flight {
                while in_flight.len() >= limit.get() {
                    if let Some((pid, handle)) = in_flight.pop_front() {
                        let outcome = join(pid, handle).await;
                        matched |= outcome.result.found;
                        outcomes.push(outcome);
                    }
                }
                if matched {
                    break;
                }
            }

            let child = match self.config.command.command(candidate, target).spawn() {
                Ok(child) => child,
                Err(source) => {
                    tracing::warn!(candidate, error = %source, "cannot spawn worker");
                    for (pid, handle) in in_flight {
                        join(pid, handle).await;
                    }
                    return Err(Error::Resource { candidate, source });
                }
            };
            tracing::debug!(candidate, worker = ?child.id(), "worker spawned");
            in_flight.push_back((
                candidate,
                tokio::spawn(supervise(candidate, child, self.config.timeout)),
            ));
        }

        for (pid, handle) in in_flight {
            outcomes.push(join(pid, handle).await);
        }

        let skipped = candidates.len() - outcomes.len();
        if skipped > 0 {
            tracing::debug!(skipped, "stopped spawning after a match");
        }
        Ok(PoolReport { outcomes, skipped })
    }
}

async fn join(candidate: u32, handle: JoinHandle<WorkerOutcome>) -> WorkerOutcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(candidate, error = %e, "worker supervisor failed");
            WorkerOutcome {
                result: WorkerResult::failed(candidate, ErrorKind::Worker),
                status: None,
            }
        }
    }
}

/// Read the worker's report until close, then reap it, under a deadline.
async fn supervise(candidate: u32, mut child: Child, timeout: Duration) -> WorkerOutcome {
    match tokio::time::timeout(timeout, collect(&mut child)).await {
        Ok((data, status)) => {
            let result = match data {
                Ok(data) => WorkerResult::from_channel(candidate, &data),
                Err(e) => {
                    tracing::warn!(candidate, error = %e, "cannot read worker report");
                    WorkerResult::failed(candidate, ErrorKind::Worker)
                }
            };
            let status = match status {
                Ok(status) => Some(status),
                Err(e) => {
                    tracing::warn!(candidate, error = %e, "cannot reap worker");
                    None
                }
            };
            if let Some(kind) = result.error {
                tracing::warn!(candidate, ?status, error = %kind, "worker failed");
            } else {
                tracing::debug!(candidate, ?status, found = result.found, "worker done");
            }
            WorkerOutcome { result, status }
        }
        Err(_elapsed) => {
            tracing::warn!(candidate, ?timeout, "worker timed out, killing it");
            if let Err(e) = child.start_kill() {
                tracing::warn!(candidate, error = %e, "cannot kill worker");
            }
            let status = child.wait().await.ok();
            WorkerOutcome {
                result: WorkerResult::failed(candidate, ErrorKind::Namespace),
                status,
            }
        }
    }
}

async fn collect(child: &mut Child) -> (io::Result<Vec<u8>>, io::Result<ExitStatus>) {
    let read = match child.stdout.take() {
        Some(stdout) => {
            let mut data = Vec::with_capacity(RECORD_LEN + 1);
            // One byte past a record is enough to tell it is malformed
            let mut limited = stdout.take((RECORD_LEN + 1) as u64);
            limited.read_to_end(&mut data).await.map(|_| data)
        }
        None => Err(io::Error::other("worker stdout not captured")),
    };
    let status = child.wait().await;
    (read, status)
}
