//! The worker side: runs inside a dedicated process for one candidate.
//!
//! State transitions are logged at debug level:
//! `spawned -> namespace_entered -> enumerated -> reported`.

use std::fmt;
use std::io::{self, Write};
use std::net::IpAddr;

use zerocopy::IntoBytes;

use crate::correlate::correlate;
use crate::enumerate::enumerate;
use crate::error::{Error, Result};
use crate::filter::MatchFilter;
use crate::netlink::{self, Connection, namespace};
use crate::report::{ErrorKind, WorkerResult};

/// Interface name looked up when resolving by pid alone.
pub const DEFAULT_DEVICE: &str = "eth0";

/// What a worker looks for inside the candidate's namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The interface owning this address.
    Address(IpAddr),
    /// The first interface whose name matches this glob.
    Device(String),
}

impl Target {
    /// Target an interface by name glob, validating the pattern.
    pub fn device(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        MatchFilter::for_device(&pattern)?;
        Ok(Self::Device(pattern))
    }

    /// Parse an address target.
    pub fn address(addr: &str) -> Result<Self> {
        addr.parse()
            .map(Self::Address)
            .map_err(|_| Error::InvalidTarget(format!("'{}' is not an IP address", addr)))
    }

    /// The filter a worker correlates with.
    pub fn filter(&self) -> Result<MatchFilter> {
        match self {
            Self::Address(addr) => Ok(MatchFilter::for_address(*addr)),
            Self::Device(pattern) => MatchFilter::for_device(pattern),
        }
    }

    /// Worker command-line arguments selecting this target.
    pub fn worker_args(&self) -> [String; 2] {
        match self {
            Self::Address(addr) => ["--address".to_string(), addr.to_string()],
            Self::Device(pattern) => ["--dev".to_string(), pattern.clone()],
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::Device(DEFAULT_DEVICE.to_string())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(addr) => write!(f, "address {}", addr),
            Self::Device(pattern) => write!(f, "device {}", pattern),
        }
    }
}

/// Enter the candidate's namespace, enumerate it and correlate the target.
///
/// Must run in a process that has no other threads yet: the namespace
/// switch only applies to the calling thread, and the runtime used for the
/// netlink socket is created after it.
pub fn run(candidate: u32, target: &Target) -> WorkerResult {
    tracing::debug!(candidate, %target, state = "spawned", "worker started");

    let filter = match target.filter() {
        Ok(filter) => filter,
        Err(e) => {
            tracing::warn!(candidate, error = %e, "invalid target");
            return WorkerResult::failed(candidate, ErrorKind::Protocol);
        }
    };

    if let Err(e) = namespace::enter_pid(candidate) {
        let kind = ErrorKind::classify(&e);
        tracing::warn!(candidate, error = %e, "cannot enter namespace");
        return WorkerResult::failed(candidate, kind);
    }
    tracing::debug!(candidate, state = "namespace_entered", "worker in namespace");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::warn!(candidate, error = %e, "cannot build runtime");
            return WorkerResult::failed(candidate, ErrorKind::Protocol);
        }
    };

    let outcome = runtime.block_on(async {
        // Opened after the switch so it binds to the candidate's namespace
        let conn = Connection::new()?;
        let snapshot = enumerate(&conn, &filter).await?;
        tracing::debug!(
            candidate,
            interfaces = snapshot.interfaces().len(),
            state = "enumerated",
            "worker enumerated namespace"
        );
        Ok::<_, netlink::Error>(correlate(&snapshot, &filter))
    });

    match outcome {
        Ok(Some(found)) => {
            tracing::debug!(
                candidate,
                owner = found.owner_index,
                peer = ?found.peer_index,
                "target matched"
            );
            WorkerResult::found(candidate, found.peer_index)
        }
        Ok(None) => WorkerResult::not_found(candidate),
        Err(e) => {
            tracing::warn!(candidate, error = %e, "enumeration failed");
            WorkerResult::failed(candidate, ErrorKind::classify(&e))
        }
    }
}

/// Run the worker and write its single report record to `out`.
pub fn serve<W: Write>(candidate: u32, target: &Target, mut out: W) -> io::Result<WorkerResult> {
    let result = run(candidate, target);
    out.write_all(result.to_record().as_bytes())?;
    out.flush()?;
    tracing::debug!(candidate, found = result.found, state = "reported", "worker reported");
    Ok(result)
}
