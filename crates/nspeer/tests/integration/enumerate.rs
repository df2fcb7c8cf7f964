//! Enumeration integration tests.

use std::net::IpAddr;

use nspeer::filter::MatchFilter;
use nspeer::netlink::Result;
use nspeer::{Family, correlate};

use crate::common::TestNamespace;

#[test]
fn test_fresh_namespace_snapshot() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("fresh")?;
    let snapshot = ns.snapshot()?;

    let names: Vec<&str> = snapshot.interfaces().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["lo"]);
    assert!(snapshot.addresses().is_empty());

    Ok(())
}

#[test]
fn test_veth_peer_index() -> Result<()> {
    require_root!();

    let host = TestNamespace::new("peer-host")?;
    let guest = TestNamespace::new("peer-guest")?;
    host.connect_to(&guest, "vhost0", "eth0")?;
    guest.add_addr("eth0", "10.0.0.5/24")?;

    let host_index = host.ifindex("vhost0")?;
    let guest_index = guest.ifindex("eth0")?;

    let snapshot = guest.snapshot()?;
    let eth0 = snapshot.interface(guest_index).expect("eth0 listed");
    assert_eq!(eth0.name, "eth0");
    assert_eq!(eth0.peer_index, Some(host_index));
    assert_eq!(eth0.kind.as_deref(), Some("veth"));

    let addr = snapshot
        .addresses_of(guest_index)
        .find(|a| a.family == Family::Inet)
        .expect("ipv4 address listed");
    assert_eq!(addr.address, Some("10.0.0.5".parse::<IpAddr>().unwrap()));
    assert_eq!(addr.prefix_len, 24);
    assert_eq!(addr.label.as_deref(), Some("eth0"));

    let found = correlate(&snapshot, &MatchFilter::for_address("10.0.0.5".parse().unwrap()));
    assert_eq!(found.map(|c| c.owner_index), Some(guest_index));
    assert_eq!(found.and_then(|c| c.peer_index), Some(host_index));

    Ok(())
}

#[test]
fn test_dummy_has_no_peer() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("dummy")?;
    ns.add_dummy("dummy0")?;
    let index = ns.ifindex("dummy0")?;

    let snapshot = ns.snapshot()?;
    let dummy = snapshot.interface(index).expect("dummy0 listed");
    assert_eq!(dummy.peer_index, None);
    assert_eq!(dummy.kind.as_deref(), Some("dummy"));

    Ok(())
}

/// Two dummies with one IPv4 address each.
fn two_dummies(prefix: &str) -> Result<(TestNamespace, i32, i32)> {
    let ns = TestNamespace::new(prefix)?;
    ns.add_dummy("dummy0")?;
    ns.add_dummy("dummy1")?;
    ns.add_addr("dummy0", "10.1.0.1/24")?;
    ns.add_addr("dummy1", "10.2.0.1/24")?;
    let first = ns.ifindex("dummy0")?;
    let second = ns.ifindex("dummy1")?;
    Ok((ns, first, second))
}

#[test]
fn test_index_filter_fetches_one_interface() -> Result<()> {
    require_root!();

    let (ns, first, _) = two_dummies("by-index")?;
    let snapshot = ns.snapshot_with(MatchFilter::new().ifindex(first))?;

    let names: Vec<&str> = snapshot.interfaces().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["dummy0"]);
    assert!(!snapshot.addresses().is_empty());
    assert!(snapshot.addresses().iter().all(|a| a.owner_index == first));
    assert!(
        snapshot
            .addresses()
            .iter()
            .any(|a| a.address == Some("10.1.0.1".parse::<IpAddr>().unwrap()))
    );

    Ok(())
}

#[test]
fn test_missing_index_yields_empty_snapshot() -> Result<()> {
    require_root!();

    let (ns, _, _) = two_dummies("no-index")?;
    let snapshot = ns.snapshot_with(MatchFilter::new().ifindex(99999))?;
    assert!(snapshot.is_empty());
    assert!(snapshot.addresses().is_empty());

    Ok(())
}

#[test]
fn test_link_only_filter_skips_addresses() -> Result<()> {
    require_root!();

    let (ns, first, second) = two_dummies("link-only")?;
    let snapshot = ns.snapshot_with(MatchFilter::new().family(Family::Packet))?;
    assert!(snapshot.interface(first).is_some());
    assert!(snapshot.interface(second).is_some());
    assert!(snapshot.addresses().is_empty());

    let device = MatchFilter::for_device("dummy1").unwrap();
    let found = correlate(&ns.snapshot_with(device.clone())?, &device);
    assert_eq!(found.map(|c| c.owner_index), Some(second));

    Ok(())
}
