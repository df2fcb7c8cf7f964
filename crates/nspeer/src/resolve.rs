//! One resolution request, end to end.

use crate::aggregate::{Aggregation, aggregate};
use crate::discovery::ProcessSource;
use crate::enumerate::enumerate;
use crate::error::Result;
use crate::filter::MatchFilter;
use crate::netlink::Connection;
use crate::pool::{PoolConfig, WorkerOutcome, WorkerPool};
use crate::snapshot::Snapshot;
use crate::worker::Target;

/// Outcome of a resolution, with what each worker reported.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Combined outcome across all candidates.
    pub aggregation: Aggregation,
    /// Per-worker outcomes, in candidate order.
    pub outcomes: Vec<WorkerOutcome>,
    /// Candidates never spawned because an earlier one matched.
    pub skipped: usize,
}

impl Resolution {
    /// Outcomes of workers that failed.
    pub fn failures(&self) -> impl Iterator<Item = &WorkerOutcome> {
        self.outcomes.iter().filter(|o| o.result.error.is_some())
    }
}

/// Resolves targets against the host namespace using a worker pool.
#[derive(Debug, Clone)]
pub struct Resolver {
    pool: WorkerPool,
}

impl Resolver {
    /// Create a resolver whose workers are started from `config`.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            pool: WorkerPool::new(config),
        }
    }

    /// Enumerate the caller's own namespace.
    pub async fn host_inventory() -> Result<Snapshot> {
        let conn = Connection::new()?;
        Ok(enumerate(&conn, &MatchFilter::new()).await?)
    }

    /// Resolve `target` across `candidates`, tried in the given order.
    ///
    /// Failing to enumerate the host namespace aborts the request before
    /// any worker starts. Individual worker failures do not.
    pub async fn resolve(&self, target: &Target, candidates: &[u32]) -> Result<Resolution> {
        let host = Self::host_inventory().await?;
        self.resolve_against(&host, target, candidates).await
    }

    /// Resolve `target` across the candidates `source` produces.
    pub async fn resolve_from<S: ProcessSource + ?Sized>(
        &self,
        target: &Target,
        source: &S,
    ) -> Result<Resolution> {
        let host = Self::host_inventory().await?;
        let candidates = source.candidates()?;
        self.resolve_against(&host, target, &candidates).await
    }

    /// Resolve `target` against an already captured host snapshot.
    pub async fn resolve_against(
        &self,
        host: &Snapshot,
        target: &Target,
        candidates: &[u32],
    ) -> Result<Resolution> {
        tracing::debug!(%target, candidates = candidates.len(), "resolving");
        let report = self.pool.run(candidates, target).await?;
        let aggregation = aggregate(&report.results(), host);
        tracing::debug!(outcome = %aggregation, "resolution complete");
        Ok(Resolution {
            aggregation,
            skipped: report.skipped(),
            outcomes: report.outcomes().to_vec(),
        })
    }
}
