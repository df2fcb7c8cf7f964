//! Candidate discovery.
//!
//! A [`ProcessSource`] produces the ordered pid list handed to the worker
//! pool. [`ProcScan`] walks the process table; [`PidList`] is an explicit
//! list that bypasses discovery.

use std::collections::HashSet;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::{Error, Result};
use crate::netlink::namespace::NamespaceId;

/// Something that produces candidate pids, in the order they are tried.
pub trait ProcessSource {
    /// The candidate pids, deduplicated, in trial order.
    fn candidates(&self) -> Result<Vec<u32>>;
}

/// An explicit candidate list, used as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PidList(pub Vec<u32>);

impl ProcessSource for PidList {
    fn candidates(&self) -> Result<Vec<u32>> {
        Ok(self.0.clone())
    }
}

impl From<Vec<u32>> for PidList {
    fn from(pids: Vec<u32>) -> Self {
        Self(pids)
    }
}

/// Scan of `/proc` for candidate processes.
///
/// By default every process is considered, processes in the caller's own
/// network namespace are skipped, and only the lowest pid of each namespace
/// is kept.
#[derive(Debug, Clone)]
pub struct ProcScan {
    patterns: Option<GlobSet>,
    include_host: bool,
    all_pids: bool,
}

impl Default for ProcScan {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcScan {
    /// Scan every process, skipping the caller's namespace and keeping
    /// one pid per namespace.
    pub fn new() -> Self {
        Self {
            patterns: None,
            include_host: false,
            all_pids: false,
        }
    }

    /// Only consider processes whose command name matches one of `patterns`.
    ///
    /// An empty pattern list matches every process.
    pub fn patterns<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut any = false;
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
            any = true;
        }
        self.patterns = if any { Some(builder.build()?) } else { None };
        Ok(self)
    }

    /// Also consider processes sharing the caller's network namespace.
    pub fn include_host(mut self, include: bool) -> Self {
        self.include_host = include;
        self
    }

    /// Keep every matching pid instead of one per namespace.
    pub fn all_pids(mut self, all: bool) -> Self {
        self.all_pids = all;
        self
    }

    fn needs_namespace(&self) -> bool {
        !(self.include_host && self.all_pids)
    }

    fn comm_matches(&self, comm: &str) -> bool {
        self.patterns.as_ref().is_none_or(|set| set.is_match(comm))
    }

    /// Apply namespace selection to pids already in ascending order.
    fn select<I>(&self, procs: I, own: Option<NamespaceId>) -> Vec<u32>
    where
        I: IntoIterator<Item = (u32, Option<NamespaceId>)>,
    {
        let mut seen = HashSet::new();
        let mut pids = Vec::new();
        for (pid, netns) in procs {
            if !self.needs_namespace() {
                pids.push(pid);
                continue;
            }
            let Some(netns) = netns else {
                continue;
            };
            if !self.include_host && Some(netns) == own {
                continue;
            }
            if !self.all_pids && !seen.insert(netns) {
                continue;
            }
            pids.push(pid);
        }
        pids
    }
}

impl ProcessSource for ProcScan {
    fn candidates(&self) -> Result<Vec<u32>> {
        let all = procfs::process::all_processes()
            .map_err(|e| Error::Discovery(e.to_string()))?;

        let mut procs = Vec::new();
        for process in all {
            // Vanished between readdir and open
            let Ok(process) = process else { continue };
            let Ok(pid) = u32::try_from(process.pid()) else {
                continue;
            };
            let Ok(stat) = process.stat() else { continue };
            if !self.comm_matches(&stat.comm) {
                continue;
            }
            let netns = if self.needs_namespace() {
                match NamespaceId::of_pid(pid) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::debug!(pid, error = %e, "skipping process");
                        continue;
                    }
                }
            } else {
                None
            };
            procs.push((pid, netns));
        }
        procs.sort_unstable_by_key(|&(pid, _)| pid);

        let own = if self.include_host {
            None
        } else {
            Some(NamespaceId::current().map_err(|e| Error::Discovery(e.to_string()))?)
        };
        let pids = self.select(procs, own);
        tracing::debug!(candidates = pids.len(), "process scan complete");
        Ok(pids)
    }
}
