//! # Runtime
//!
//! Tokio runtime presets for Strata binaries.
//!
//! ## Profiles
//! * **Node**: one process per unit. A small worker pool; the unit's own compute
//!   threads should not compete with the runtime.
//! * **Simulation**: a whole team inside one process. Every simulated unit is a task
//!   parked on collectives most of the time, so the pool is sized for concurrency.
//! * **Default**: worker count from `STRATA_WORKER_THREADS` or the available
//!   parallelism.
//!
//! ## Example
//!
//! ```rust,ignore
//! #[strata_runtime::main(simulation)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use strata_derive::main;

use anyhow::Context;
use std::sync::OnceLock;
use std::thread::available_parallelism;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

const FALLBACK_WORKER_THREADS: usize = 4;
const MAX_WORKER_THREADS: usize = 1024;
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 512 * 1024;
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(60);
const WORKER_THREADS_ENV: &str = "STRATA_WORKER_THREADS";

static DETECTED_WORKERS: OnceLock<usize> = OnceLock::new();

fn detected_workers() -> usize {
    *DETECTED_WORKERS.get_or_init(|| {
        std::env::var(WORKER_THREADS_ENV)
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|&n| (1..=MAX_WORKER_THREADS).contains(&n))
            .unwrap_or_else(|| {
                available_parallelism().map(std::num::NonZero::get).unwrap_or(FALLBACK_WORKER_THREADS)
            })
    })
}

/// Settings of the multi-threaded runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: detected_workers(),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "strata-worker".to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }
}

impl RuntimeConfig {
    /// One unit per process.
    #[must_use]
    pub fn node() -> Self {
        Self {
            worker_threads: detected_workers().min(2),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "strata-node".to_owned(),
            thread_keep_alive: Duration::from_secs(30),
        }
    }

    /// A simulated team in one process.
    #[must_use]
    pub fn simulation() -> Self {
        Self {
            worker_threads: detected_workers().max(FALLBACK_WORKER_THREADS),
            stack_size: 4 * 1024 * 1024,
            thread_name: "strata-sim".to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, MAX_WORKER_THREADS);
        self
    }

    #[must_use]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    fn normalized(&self) -> Self {
        let thread_name =
            if self.thread_name.trim().is_empty() { "strata-worker".to_owned() } else { self.thread_name.clone() };
        Self {
            worker_threads: self.worker_threads.clamp(1, MAX_WORKER_THREADS),
            stack_size: self.stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE),
            thread_name,
            thread_keep_alive: self.thread_keep_alive,
        }
    }
}

/// Builds a multi-threaded runtime with all drivers enabled.
///
/// Out-of-range settings are clamped rather than rejected.
///
/// # Errors
/// Returns an error if the OS refuses to create the worker threads.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(
        workers = config.worker_threads,
        stack = config.stack_size,
        name = %config.thread_name,
        "Building tokio runtime"
    );

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .context("Failed to initialize runtime")
}
