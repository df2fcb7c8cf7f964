//! Common test utilities for integration tests.
//!
//! Provides `TestNamespace` for isolated network namespace testing
//! and helper macros for conditional test execution.

use nspeer::Snapshot;
use nspeer::filter::MatchFilter;
use nspeer::netlink::namespace::{self, NamespaceId};
use nspeer::netlink::{Connection, Error, Result};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Global counter for unique namespace names.
static NAMESPACE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique namespace name for this test.
fn unique_ns_name(prefix: &str) -> String {
    let id = NAMESPACE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id();
    format!("nspeer-test-{}-{}-{}", prefix, pid, id)
}

fn command_failed(what: &str) -> Error {
    Error::InvalidMessage(format!("{} failed", what))
}

/// A named network namespace, deleted on drop.
pub struct TestNamespace {
    name: String,
}

impl TestNamespace {
    pub fn new(prefix: &str) -> Result<Self> {
        let name = unique_ns_name(prefix);

        let status = Command::new("ip").args(["netns", "add", &name]).status()?;
        if !status.success() {
            return Err(Error::InvalidMessage(format!(
                "failed to create namespace: {}",
                name
            )));
        }

        Ok(Self { name })
    }

    #[allow(dead_code)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The nsfs bind mount created by `ip netns add`.
    pub fn path(&self) -> PathBuf {
        PathBuf::from("/run/netns").join(&self.name)
    }

    /// Run a command in the namespace and return its output.
    pub fn exec(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let output = Command::new("ip")
            .args(["netns", "exec", &self.name, cmd])
            .args(args)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::InvalidMessage(format!(
                "command failed: {} {:?}: {}",
                cmd, args, stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Create a veth pair: `local_name` here, `remote_name` in `other`.
    pub fn connect_to(
        &self,
        other: &TestNamespace,
        local_name: &str,
        remote_name: &str,
    ) -> Result<()> {
        self.exec(
            "ip",
            &["link", "add", local_name, "type", "veth", "peer", "name", remote_name],
        )?;
        self.exec("ip", &["link", "set", remote_name, "netns", &other.name])?;
        self.link_up(local_name)?;
        other.link_up(remote_name)?;
        Ok(())
    }

    pub fn link_up(&self, name: &str) -> Result<()> {
        self.exec("ip", &["link", "set", name, "up"])?;
        Ok(())
    }

    pub fn add_dummy(&self, name: &str) -> Result<()> {
        self.exec("ip", &["link", "add", name, "type", "dummy"])?;
        Ok(())
    }

    pub fn add_addr(&self, dev: &str, addr: &str) -> Result<()> {
        self.exec("ip", &["addr", "add", addr, "dev", dev])?;
        Ok(())
    }

    /// Index of an interface in this namespace.
    pub fn ifindex(&self, name: &str) -> Result<i32> {
        let out = self.exec("cat", &[&format!("/sys/class/net/{}/ifindex", name)])?;
        out.trim()
            .parse()
            .map_err(|_| Error::InvalidMessage(format!("bad ifindex for {}: {:?}", name, out)))
    }

    /// Start a long-running process in this namespace.
    ///
    /// Returns once the process has switched into the namespace.
    pub fn spawn_resident(&self) -> Result<Resident> {
        let child = Command::new("ip")
            .args(["netns", "exec", &self.name, "sleep", "60"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()?;
        let resident = Resident { child };

        let want = NamespaceId::of_path(self.path())?;
        for _ in 0..100 {
            if NamespaceId::of_pid(resident.pid()).ok() == Some(want) {
                return Ok(resident);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        Err(command_failed("ip netns exec"))
    }

    /// Run `f` on a thread that has entered this namespace.
    pub fn run_inside<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path();
        std::thread::spawn(move || {
            namespace::open_path(&path)?.enter()?;
            Ok(f())
        })
        .join()
        .map_err(|_| command_failed("namespace thread"))?
    }

    /// Snapshot of every interface and address in this namespace.
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.snapshot_with(MatchFilter::new())
    }

    /// Snapshot narrowed by `filter`, as a worker would request it.
    pub fn snapshot_with(&self, filter: MatchFilter) -> Result<Snapshot> {
        self.run_inside(move || -> Result<Snapshot> {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_io()
                .build()?;
            rt.block_on(async {
                let conn = Connection::new()?;
                nspeer::enumerate(&conn, &filter).await
            })
        })?
    }
}

impl Drop for TestNamespace {
    fn drop(&mut self) {
        let _ = Command::new("ip")
            .args(["netns", "del", &self.name])
            .status();
    }
}

/// A process living in a test namespace, killed on drop.
pub struct Resident {
    child: Child,
}

impl Resident {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for Resident {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Skip the test if not running as root.
///
/// Use this at the beginning of integration tests that require root privileges.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ns_name() {
        let name1 = unique_ns_name("test");
        let name2 = unique_ns_name("test");
        assert_ne!(name1, name2);
        assert!(name1.starts_with("nspeer-test-test-"));
    }
}
