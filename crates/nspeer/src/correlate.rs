//! Joining address ownership to interface identity.

use crate::filter::MatchFilter;
use crate::snapshot::{AddressRecord, InterfaceRecord, Snapshot};

/// The interface that satisfied a filter, and its peer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correlation {
    /// Index of the matching interface.
    pub owner_index: i32,
    /// IFLA_LINK of the matching interface, if the kernel reported one.
    pub peer_index: Option<i32>,
}

/// Find the first interface, in snapshot order, that satisfies `filter`.
///
/// Addresses are only ever considered through their owning interface, so a
/// record whose owner is missing from the snapshot never matches. An
/// interface owning no address matches only link-level queries. Link-only
/// filters match on the interface alone, whatever addresses it owns.
pub fn correlate(snapshot: &Snapshot, filter: &MatchFilter) -> Option<Correlation> {
    snapshot
        .interfaces()
        .iter()
        .filter(|iface| filter.matches_interface(iface))
        .find(|iface| {
            if filter.is_link_only() {
                return filter.matches_link(iface);
            }
            let mut owned = snapshot.addresses_of(iface.index).peekable();
            if owned.peek().is_none() {
                filter.accepts_bare_links() && filter.matches_link(iface)
            } else {
                owned.any(|addr| filter.matches_address(iface, addr))
            }
        })
        .map(|iface| Correlation {
            owner_index: iface.index,
            peer_index: iface.peer_index,
        })
}

/// One interface selected for listing, with its matching addresses.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    /// The selected interface.
    pub interface: &'a InterfaceRecord,
    /// Its addresses that pass the filter; empty for link-only filters.
    pub addresses: Vec<&'a AddressRecord>,
}

/// Every interface that satisfies `filter`, in snapshot order.
///
/// Link-only filters list interfaces by name and index alone.
pub fn select<'a>(snapshot: &'a Snapshot, filter: &MatchFilter) -> Vec<Selection<'a>> {
    snapshot
        .interfaces()
        .iter()
        .filter(|iface| filter.matches_interface(iface))
        .filter_map(|iface| {
            if filter.is_link_only() {
                return filter.matches_link(iface).then(|| Selection {
                    interface: iface,
                    addresses: Vec::new(),
                });
            }

            let mut owned = snapshot.addresses_of(iface.index).peekable();
            if owned.peek().is_none() {
                return (filter.accepts_bare_links() && filter.matches_link(iface)).then(|| {
                    Selection {
                        interface: iface,
                        addresses: Vec::new(),
                    }
                });
            }

            let addresses: Vec<_> = owned
                .filter(|addr| filter.matches_address(iface, addr))
                .collect();
            (!addresses.is_empty()).then_some(Selection {
                interface: iface,
                addresses,
            })
        })
        .collect()
}
