//! Counting gate bounding the number of simultaneous API requests.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{JiraError, Result};

/// Default number of requests allowed in flight at once. Jira applies
/// undocumented rate limits to bursts of worklog reads.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Represents a shared async gate that admits at most `limit` holders at a time; a pass
/// is released when dropped.
#[derive(Clone, Debug)]
pub struct RequestGate {
    permits: Arc<Semaphore>,
    limit: usize,
}

/// Proof of admission through a [`RequestGate`].
#[derive(Debug)]
pub struct GatePass {
    _permit: OwnedSemaphorePermit,
}

impl RequestGate {
    /// Creates a gate admitting `limit` concurrent holders (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Waits for a free slot and returns the pass holding it.
    pub async fn enter(&self) -> Result<GatePass> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|err| JiraError::Other(format!("request gate closed: {err}")))?;
        Ok(GatePass { _permit: permit })
    }

    /// Returns configured concurrency limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of currently free slots.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}
