//! Worker mode: inspect one candidate namespace.
//!
//! Started by the coordinator, never by hand. Writes exactly one report
//! record to stdout. A missing or short record is read as a worker failure,
//! so every error path here simply exits without writing.

use std::io;
use std::process::ExitCode;

use clap::Args;
use nspeer::Target;
use nspeer::worker;

#[derive(Args)]
pub struct WorkerCmd {
    /// Candidate process whose network namespace to enter.
    #[arg(long)]
    pid: u32,

    /// Look for the interface owning this address.
    #[arg(long, conflicts_with = "dev")]
    address: Option<String>,

    /// Look for an interface whose name matches this glob.
    #[arg(long)]
    dev: Option<String>,
}

impl WorkerCmd {
    pub fn run(self) -> ExitCode {
        let target = match (self.address, self.dev) {
            (Some(addr), _) => Target::address(&addr),
            (None, Some(dev)) => Target::device(dev),
            (None, None) => Ok(Target::default()),
        };
        let target = match target {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(candidate = self.pid, error = %e, "invalid worker target");
                return ExitCode::FAILURE;
            }
        };

        match worker::serve(self.pid, &target, io::stdout().lock()) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::warn!(candidate = self.pid, error = %e, "cannot write report");
                ExitCode::FAILURE
            }
        }
    }
}
