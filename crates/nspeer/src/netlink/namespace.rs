//! Network namespace primitives.
//!
//! Entering a namespace here is one-way: the calling thread stays in the
//! target namespace. It is meant to run at the start of a dedicated worker
//! process, before any runtime threads exist, so that every socket opened
//! afterwards is bound to the candidate's namespace.

use std::fs::File;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use super::error::{Error, Result};

/// Path of the network namespace file of a process.
pub fn netns_path(pid: u32) -> PathBuf {
    PathBuf::from(format!("/proc/{}/ns/net", pid))
}

/// Path of the calling process's own network namespace file.
pub const SELF_NETNS: &str = "/proc/self/ns/net";

/// Identity of a network namespace (device and inode of its nsfs file).
///
/// Two processes share a namespace exactly when their identities are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamespaceId {
    pub dev: u64,
    pub ino: u64,
}

impl NamespaceId {
    /// Read the identity behind a namespace file.
    pub fn of_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|source| Error::Namespace {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    /// Identity of a process's network namespace.
    pub fn of_pid(pid: u32) -> Result<Self> {
        Self::of_path(netns_path(pid))
    }

    /// Identity of the calling process's network namespace.
    pub fn current() -> Result<Self> {
        Self::of_path(SELF_NETNS)
    }
}

/// Open a namespace file by path.
pub fn open_path<P: AsRef<Path>>(path: P) -> Result<NamespaceFd> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Namespace {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(NamespaceFd {
        file,
        path: path.to_path_buf(),
    })
}

/// Open a process's network namespace.
pub fn open_pid(pid: u32) -> Result<NamespaceFd> {
    open_path(netns_path(pid))
}

/// A handle to an open namespace file.
#[derive(Debug)]
pub struct NamespaceFd {
    file: File,
    path: PathBuf,
}

impl NamespaceFd {
    /// Path the handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the calling thread into this network namespace.
    pub fn enter(&self) -> Result<()> {
        // SAFETY: libc::setns is a standard Linux syscall for switching namespaces.
        // self.file is an open fd to a namespace file, CLONE_NEWNET
        // restricts the switch to network namespaces.
        let ret = unsafe { libc::setns(self.file.as_raw_fd(), libc::CLONE_NEWNET) };
        if ret < 0 {
            return Err(Error::Namespace {
                path: self.path.clone(),
                source: io::Error::last_os_error(),
            });
        }
        tracing::debug!(path = %self.path.display(), "entered network namespace");
        Ok(())
    }
}

impl AsRawFd for NamespaceFd {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

/// Move the calling thread into the network namespace of `pid`.
pub fn enter_pid(pid: u32) -> Result<()> {
    open_pid(pid)?.enter()
}
