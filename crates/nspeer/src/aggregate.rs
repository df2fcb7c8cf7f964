//! Mapping worker results back onto the host's interface table.

use std::fmt;

use crate::report::WorkerResult;
use crate::snapshot::Snapshot;

/// Final outcome of a resolution.
///
/// Only [`Aggregation::Matched`] names an interface. The other variants are
/// normal negative outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    /// The first matching candidate's peer is a host interface.
    Matched {
        /// Pid whose namespace held the matching interface.
        candidate: u32,
        /// Host interface index the worker reported.
        peer_index: i32,
        /// Host interface name for `peer_index`.
        interface: String,
    },
    /// No candidate matched.
    NoMatch,
    /// The first matching candidate's interface has no peer link
    /// (not a veth-style interface).
    NoPeerLink {
        /// Pid whose namespace held the matching interface.
        candidate: u32,
    },
    /// The peer index is not present in the host table.
    UnknownPeer {
        /// Pid whose namespace held the matching interface.
        candidate: u32,
        /// Reported index with no host interface behind it.
        peer_index: i32,
    },
}

impl Aggregation {
    /// The resolved host interface name.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Matched { interface, .. } => Some(interface),
            _ => None,
        }
    }

    /// Check if a host interface was resolved.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched {
                candidate,
                interface,
                ..
            } => write!(f, "{} (peer of pid {})", interface, candidate),
            Self::NoMatch => write!(f, "no candidate matched"),
            Self::NoPeerLink { candidate } => {
                write!(f, "interface of pid {} has no peer link", candidate)
            }
            Self::UnknownPeer {
                candidate,
                peer_index,
            } => write!(
                f,
                "peer index {} of pid {} is not a host interface",
                peer_index, candidate
            ),
        }
    }
}

/// Resolve the first found result, in candidate order, against `host`.
///
/// Later results are never consulted, even if the first match cannot be
/// resolved.
pub fn aggregate(results: &[WorkerResult], host: &Snapshot) -> Aggregation {
    let Some(first) = results.iter().find(|r| r.found) else {
        return Aggregation::NoMatch;
    };
    let Some(peer_index) = first.peer_index else {
        return Aggregation::NoPeerLink {
            candidate: first.candidate,
        };
    };
    match host.interface(peer_index) {
        Some(iface) => Aggregation::Matched {
            candidate: first.candidate,
            peer_index,
            interface: iface.name.clone(),
        },
        None => Aggregation::UnknownPeer {
            candidate: first.candidate,
            peer_index,
        },
    }
}
