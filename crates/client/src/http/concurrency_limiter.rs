//! Concurrency limiting for outgoing requests.
//!
//! Each [`HttpTransport`](super::HttpTransport) owns one limiter with separate
//! read and write budgets. GET requests draw from the read budget; POST, PATCH
//! and DELETE draw from the write budget.
//!
//! ## Usage
//!
//! ### Via Environment Variables
//!
//! ```bash
//! export DOCGRAPH_CONCURRENCY_LIMIT_READ=10   # Max 10 concurrent reads
//! export DOCGRAPH_CONCURRENCY_LIMIT_WRITE=5   # Max 5 concurrent writes
//! ```
//!
//! ### Via Code
//!
//! ```rust,ignore
//! use docgraph_client::{ClientConfig, ConcurrencyLimitConfig, HttpTransport};
//!
//! let config = ClientConfig::new("https://api.example.com/")?
//!     .with_concurrency_limit(ConcurrencyLimitConfig::new(Some(10), Some(5)));
//! let transport = HttpTransport::new(config)?;
//! ```

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

pub const READ_LIMIT_ENV: &str = "DOCGRAPH_CONCURRENCY_LIMIT_READ";
pub const WRITE_LIMIT_ENV: &str = "DOCGRAPH_CONCURRENCY_LIMIT_WRITE";

/// Configuration for concurrency limiting
///
/// Both fields are optional. If `None`, no concurrency limiting is applied for that operation type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyLimitConfig {
    /// Maximum number of concurrent read (GET) requests
    pub max_concurrent_reads: Option<usize>,
    /// Maximum number of concurrent write (POST/PATCH/DELETE) requests
    pub max_concurrent_writes: Option<usize>,
}

impl ConcurrencyLimitConfig {
    /// Create concurrency limit config from environment variables
    ///
    /// Reads [`READ_LIMIT_ENV`] and [`WRITE_LIMIT_ENV`]. Returns `None` if
    /// neither is set to a number.
    pub fn from_env() -> Option<Self> {
        let read = std::env::var(READ_LIMIT_ENV)
            .ok()
            .and_then(|s| s.parse::<usize>().ok());

        let write = std::env::var(WRITE_LIMIT_ENV)
            .ok()
            .and_then(|s| s.parse::<usize>().ok());

        // Only create config if at least one limit is set
        if read.is_some() || write.is_some() {
            debug!(
                "Concurrency limiting configured from environment: read={:?}, write={:?}",
                read, write
            );
            Some(ConcurrencyLimitConfig {
                max_concurrent_reads: read,
                max_concurrent_writes: write,
            })
        } else {
            None
        }
    }

    pub fn new(max_concurrent_reads: Option<usize>, max_concurrent_writes: Option<usize>) -> Self {
        Self {
            max_concurrent_reads,
            max_concurrent_writes,
        }
    }
}

/// Read and write semaphores for one transport. A zero or missing limit
/// means unlimited.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyLimiter {
    read: Option<Arc<Semaphore>>,
    write: Option<Arc<Semaphore>>,
}

impl ConcurrencyLimiter {
    pub fn new(config: Option<&ConcurrencyLimitConfig>) -> Self {
        let Some(config) = config else {
            return Self::default();
        };

        debug!(
            "Creating semaphores: read={:?} concurrent, write={:?} concurrent",
            config.max_concurrent_reads, config.max_concurrent_writes
        );

        Self {
            read: config
                .max_concurrent_reads
                .filter(|&n| n > 0)
                .map(|n| Arc::new(Semaphore::new(n))),
            write: config
                .max_concurrent_writes
                .filter(|&n| n > 0)
                .map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// Wait for a slot in the matching budget. The slot is released when the
    /// returned permit drops.
    pub async fn acquire(&self, is_read: bool) -> Option<OwnedSemaphorePermit> {
        let semaphore = if is_read { &self.read } else { &self.write };
        match semaphore {
            // the semaphore is never closed, so acquisition only fails if it is
            Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
            None => None,
        }
    }

    pub fn is_limited(&self) -> bool {
        self.read.is_some() || self.write.is_some()
    }
}
