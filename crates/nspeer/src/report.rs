//! Worker results and the fixed-size record that carries them.
//!
//! A worker writes exactly one [`RECORD_LEN`]-byte record to its report
//! channel and closes it:
//!
//! ```text
//! +-------+------------------------+-------+
//! | found | peer_index (i32, BE)   | error |
//! +-------+------------------------+-------+
//!   1 B           4 B                 1 B
//! ```
//!
//! `peer_index` is `-1` when there is no peer link. Anything that is not
//! exactly one well-formed record decodes as an [`ErrorKind::Worker`]
//! failure.

use std::fmt;

use zerocopy::byteorder::{I32, NetworkEndian};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::netlink;

/// Why a single worker failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    /// Netlink failure inside the candidate's namespace.
    Protocol = 1,
    /// The namespace could not be entered, or the worker timed out.
    Namespace = 2,
    /// Entering the namespace was refused (EPERM/EACCES).
    PermissionDenied = 3,
    /// The worker crashed, wrote a malformed record, or its channel failed.
    Worker = 4,
}

impl ErrorKind {
    fn from_wire(value: u8) -> Option<Option<Self>> {
        match value {
            0 => Some(None),
            1 => Some(Some(Self::Protocol)),
            2 => Some(Some(Self::Namespace)),
            3 => Some(Some(Self::PermissionDenied)),
            4 => Some(Some(Self::Worker)),
            _ => None,
        }
    }

    /// Classify a netlink-layer failure seen inside a worker.
    pub fn classify(err: &netlink::Error) -> Self {
        if err.is_permission_denied() {
            Self::PermissionDenied
        } else if err.is_namespace() {
            Self::Namespace
        } else {
            Self::Protocol
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Protocol => "netlink error",
            Self::Namespace => "namespace error",
            Self::PermissionDenied => "permission denied",
            Self::Worker => "worker failure",
        };
        f.write_str(s)
    }
}

/// Outcome of one worker, produced exactly once per candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerResult {
    /// The candidate pid.
    pub candidate: u32,
    /// Whether an interface in the candidate's namespace matched.
    pub found: bool,
    /// The matched interface's peer link index, if any.
    pub peer_index: Option<i32>,
    /// Why the worker failed, if it did.
    pub error: Option<ErrorKind>,
}

impl WorkerResult {
    /// A match, with the matched interface's peer link.
    pub fn found(candidate: u32, peer_index: Option<i32>) -> Self {
        Self {
            candidate,
            found: true,
            peer_index,
            error: None,
        }
    }

    /// No interface matched.
    pub fn not_found(candidate: u32) -> Self {
        Self {
            candidate,
            found: false,
            peer_index: None,
            error: None,
        }
    }

    /// The worker failed.
    pub fn failed(candidate: u32, kind: ErrorKind) -> Self {
        Self {
            candidate,
            found: false,
            peer_index: None,
            error: Some(kind),
        }
    }

    /// Encode as a wire record. The candidate is implied by the channel.
    pub fn to_record(&self) -> ReportRecord {
        ReportRecord {
            found: self.found as u8,
            peer_index: I32::new(self.peer_index.unwrap_or(-1)),
            error: self.error.map_or(0, |k| k as u8),
        }
    }

    /// Decode everything read from a worker's report channel.
    pub fn from_channel(candidate: u32, data: &[u8]) -> Self {
        let Ok(record) = ReportRecord::read_from_bytes(data) else {
            tracing::debug!(candidate, len = data.len(), "malformed report length");
            return Self::failed(candidate, ErrorKind::Worker);
        };

        let error = ErrorKind::from_wire(record.error);
        let (found, error) = match (record.found, error) {
            (0, Some(error)) => (false, error),
            (1, Some(None)) => (true, None),
            _ => {
                tracing::debug!(candidate, ?record, "malformed report record");
                return Self::failed(candidate, ErrorKind::Worker);
            }
        };

        let peer_index = match record.peer_index.get() {
            -1 => None,
            index => Some(index),
        };
        Self {
            candidate,
            found,
            peer_index: if found { peer_index } else { None },
            error,
        }
    }
}

/// The report record as it travels over the channel.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct ReportRecord {
    pub found: u8,
    pub peer_index: I32<NetworkEndian>,
    pub error: u8,
}

/// Size of a report record on the wire.
pub const RECORD_LEN: usize = std::mem::size_of::<ReportRecord>();
