//! Error types for netlink operations.

use std::io;
use std::path::PathBuf;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during netlink operations.
///
/// Every variant except [`Error::Namespace`] is a protocol-level failure:
/// the request could not be sent, the kernel refused it, or the reply could
/// not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        /// The operation that failed.
        operation: String,
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// The kernel flagged a dump as inconsistent (NLM_F_DUMP_INTR).
    #[error("{operation}: dump interrupted by a concurrent change")]
    DumpInterrupted {
        /// The dump that was interrupted.
        operation: String,
    },

    /// Parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// A namespace file could not be opened or entered.
    #[error("cannot enter namespace '{}': {source}", path.display())]
    Namespace {
        /// The namespace file.
        path: PathBuf,
        /// The underlying OS error.
        source: io::Error,
    },
}

impl Error {
    /// Create a kernel error from an errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Create a kernel error with operation context.
    pub fn from_errno_with_context(errno: i32, operation: impl Into<String>) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::KernelWithContext {
            operation: operation.into(),
            errno: -errno,
            message,
        }
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, ESRCH).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::ENOENT | libc::ENODEV)
            }
            Self::Namespace { source, .. } => {
                matches!(source.raw_os_error(), Some(libc::ENOENT | libc::ESRCH))
            }
            _ => false,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::EPERM | libc::EACCES)
            }
            Self::Namespace { source, .. } | Self::Io(source) => {
                matches!(source.raw_os_error(), Some(libc::EPERM | libc::EACCES))
            }
            _ => false,
        }
    }

    /// Check if the error happened while opening or entering a namespace.
    pub fn is_namespace(&self) -> bool {
        matches!(self, Self::Namespace { .. })
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_errno() {
        let err = Error::from_errno(-1); // EPERM
        assert!(err.is_permission_denied());
        assert_eq!(err.errno(), Some(1));
    }

    #[test]
    fn test_from_errno_with_context() {
        let err = Error::from_errno_with_context(-19, "getting link 7"); // ENODEV
        assert!(err.is_not_found());
        let msg = err.to_string();
        assert!(msg.contains("getting link 7"));
        assert!(msg.contains("No such device"));
    }

    #[test]
    fn test_namespace_classification() {
        let gone = Error::Namespace {
            path: PathBuf::from("/proc/4242/ns/net"),
            source: io::Error::from_raw_os_error(libc::ENOENT),
        };
        assert!(gone.is_namespace());
        assert!(gone.is_not_found());
        assert!(!gone.is_permission_denied());

        let denied = Error::Namespace {
            path: PathBuf::from("/proc/1/ns/net"),
            source: io::Error::from_raw_os_error(libc::EPERM),
        };
        assert!(denied.is_permission_denied());
        assert!(denied.to_string().starts_with("cannot enter namespace '/proc/1/ns/net'"));
    }

    #[test]
    fn test_dump_interrupted_message() {
        let err = Error::DumpInterrupted {
            operation: "link dump".into(),
        };
        assert_eq!(
            err.to_string(),
            "link dump: dump interrupted by a concurrent change"
        );
        assert!(!err.is_not_found());
    }
}
