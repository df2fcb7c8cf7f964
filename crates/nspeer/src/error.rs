//! Crate-level error types.

use std::io;

use crate::netlink;

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole resolution request.
///
/// A single worker's failure is never an `Error`; it is recorded as an
/// [`ErrorKind`](crate::report::ErrorKind) in that worker's result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Netlink failure in the coordinator's own namespace.
    #[error(transparent)]
    Protocol(#[from] netlink::Error),

    /// A worker process or its report pipe could not be created.
    #[error("cannot start worker for pid {candidate}: {source}")]
    Resource {
        /// The candidate whose worker failed to start.
        candidate: u32,
        /// The underlying OS error.
        source: io::Error,
    },

    /// The process table could not be read.
    #[error("cannot scan processes: {0}")]
    Discovery(String),

    /// A glob pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// A target address, prefix or device name was malformed.
    #[error("invalid target: {0}")]
    InvalidTarget(String),
}

impl Error {
    /// Check if this error stems from missing privileges.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Protocol(e) => e.is_permission_denied(),
            Self::Resource { source, .. } => source.kind() == io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}
