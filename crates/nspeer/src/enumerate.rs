//! Building a [`Snapshot`] of the current namespace over rtnetlink.

use crate::filter::MatchFilter;
use crate::netlink::{self, Connection};
use crate::snapshot::{AddressRecord, InterfaceRecord, Snapshot};

/// Dump links, then addresses, from the namespace `conn` is bound to.
///
/// The filter only narrows what is requested from the kernel: a filter with
/// an interface index fetches that one link, and a link-only filter skips
/// the address dump. Matching itself is left to [`crate::correlate`].
pub async fn enumerate(conn: &Connection, filter: &MatchFilter) -> netlink::Result<Snapshot> {
    let links = match filter.get_ifindex() {
        Some(index) => conn.get_link(index).await?.into_iter().collect(),
        None => conn.get_links().await?,
    };
    let interfaces: Vec<InterfaceRecord> = links.into_iter().map(InterfaceRecord::from).collect();

    let addresses: Vec<AddressRecord> = if filter.is_link_only() {
        Vec::new()
    } else {
        let index = filter.get_ifindex().map(|i| i as u32);
        conn.get_addresses(filter.get_family().as_raw(), index)
            .await?
            .into_iter()
            .filter(|msg| index.is_none_or(|i| msg.ifindex() == i))
            .map(AddressRecord::from)
            .collect()
    };

    tracing::debug!(
        interfaces = interfaces.len(),
        addresses = addresses.len(),
        "namespace enumerated"
    );
    Ok(Snapshot::new(interfaces, addresses))
}
