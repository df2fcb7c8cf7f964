//! Resolve the host-side peer of a process's network interface.
//!
//! Given an address (or an interface name) that lives inside some other
//! process's network namespace, find the host interface at the other end of
//! its veth pair. Each candidate namespace is inspected by a dedicated
//! worker process that enters the namespace, dumps its links and addresses
//! over rtnetlink, and reports the matching interface's peer index. The
//! coordinator maps that index back onto its own interface table.
//!
//! # Example
//!
//! ```ignore
//! use nspeer::{PoolConfig, ProcScan, Resolver, Target, WorkerCommand};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PoolConfig::new(WorkerCommand::current_exe()?).jobs(8);
//!     let resolver = Resolver::new(config);
//!
//!     let target = Target::address("10.0.0.5")?;
//!     let resolution = resolver.resolve_from(&target, &ProcScan::new()).await?;
//!     if let Some(name) = resolution.aggregation.name() {
//!         println!("{}", name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The worker side lives in [`worker`]; the binary calling
//! [`worker::serve`] must do so before starting any async runtime.

pub mod aggregate;
pub mod correlate;
pub mod discovery;
pub mod enumerate;
pub mod error;
pub mod filter;
pub mod netlink;
pub mod pool;
pub mod report;
pub mod resolve;
pub mod snapshot;
pub mod worker;

pub use aggregate::{Aggregation, aggregate};
pub use correlate::{Correlation, correlate};
pub use discovery::{PidList, ProcScan, ProcessSource};
pub use enumerate::enumerate;
pub use error::{Error, Result};
pub use filter::{MatchFilter, Prefix};
pub use pool::{PoolConfig, PoolReport, WorkerCommand, WorkerOutcome, WorkerPool};
pub use report::{ErrorKind, WorkerResult};
pub use resolve::{Resolution, Resolver};
pub use snapshot::{AddressRecord, Family, InterfaceRecord, Snapshot};
pub use worker::Target;
