//! Worker integration tests.
//!
//! The worker is run on a plain thread of the test process: entering a
//! namespace only moves that thread, which exits afterwards.

use nspeer::netlink::Result;
use nspeer::{Aggregation, ErrorKind, Target, WorkerResult, aggregate, worker};

use crate::common::TestNamespace;

#[test]
fn test_worker_resolves_address() -> Result<()> {
    require_root!();

    let host = TestNamespace::new("addr-host")?;
    let guest = TestNamespace::new("addr-guest")?;
    host.connect_to(&guest, "vhost0", "eth0")?;
    guest.add_addr("eth0", "10.0.0.5/24")?;
    let resident = guest.spawn_resident()?;
    let host_index = host.ifindex("vhost0")?;

    let pid = resident.pid();
    let target = Target::address("10.0.0.5").unwrap();
    let result = host.run_inside(move || worker::run(pid, &target))?;
    assert_eq!(result, WorkerResult::found(pid, Some(host_index)));

    let outcome = aggregate(&[result], &host.snapshot()?);
    assert_eq!(
        outcome,
        Aggregation::Matched {
            candidate: pid,
            peer_index: host_index,
            interface: "vhost0".to_string()
        }
    );

    Ok(())
}

#[test]
fn test_worker_resolves_default_device() -> Result<()> {
    require_root!();

    let host = TestNamespace::new("dev-host")?;
    let guest = TestNamespace::new("dev-guest")?;
    host.connect_to(&guest, "vhost1", "eth0")?;
    let resident = guest.spawn_resident()?;

    let pid = resident.pid();
    let result = host.run_inside(move || worker::run(pid, &Target::default()))?;

    let outcome = aggregate(&[result], &host.snapshot()?);
    assert_eq!(outcome.name(), Some("vhost1"));

    Ok(())
}

#[test]
fn test_worker_outcomes_without_match() -> Result<()> {
    require_root!();

    let host = TestNamespace::new("miss-host")?;
    let guest = TestNamespace::new("miss-guest")?;
    host.connect_to(&guest, "vhost2", "eth0")?;
    guest.add_addr("eth0", "10.0.0.5/24")?;
    guest.add_dummy("dummy0")?;
    guest.add_addr("dummy0", "10.1.0.1/24")?;
    let resident = guest.spawn_resident()?;
    let pid = resident.pid();

    let target = Target::address("10.9.9.9").unwrap();
    let result = host.run_inside(move || worker::run(pid, &target))?;
    assert_eq!(result, WorkerResult::not_found(pid));

    let target = Target::address("10.1.0.1").unwrap();
    let result = host.run_inside(move || worker::run(pid, &target))?;
    assert_eq!(result, WorkerResult::found(pid, None));
    assert_eq!(
        aggregate(&[result], &host.snapshot()?),
        Aggregation::NoPeerLink { candidate: pid }
    );

    Ok(())
}

#[test]
fn test_worker_for_vanished_process() -> Result<()> {
    require_root!();

    let host = TestNamespace::new("gone")?;
    let guest = TestNamespace::new("gone-guest")?;
    let resident = guest.spawn_resident()?;
    let pid = resident.pid();
    drop(resident);

    let result = host.run_inside(move || worker::run(pid, &Target::default()))?;
    assert_eq!(result, WorkerResult::failed(pid, ErrorKind::Namespace));

    Ok(())
}
