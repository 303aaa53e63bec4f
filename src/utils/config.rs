//! Application configuration constants.
//! Tuning and defaults in one place.

use std::sync::OnceLock;
use std::time::Duration;

use super::fd_limit::cap_workers_by_fd_limit;

// ---- Package names (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    env_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                env_prefix: pkg.to_uppercase(),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Per-directory config file, e.g. `.fanpipe.toml`.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Environment variable name for `suffix`, e.g. `FANPIPE_WORKERS`.
    pub fn env_var(&self, suffix: &str) -> String {
        format!("{}_{}", self.env_prefix, suffix)
    }

    /// Thread name for worker `id`.
    pub fn worker_thread_name(&self, id: usize) -> String {
        format!("{}-worker-{}", self.pkg_name, id)
    }

    pub fn aggregator_thread_name(&self) -> String {
        format!("{}-aggregator", self.pkg_name)
    }
}

// ---- Pipeline defaults ----

/// Defaults for lib callers (`PipelineOpts::default()`) and decoders.
pub struct PipelineDefaults;

impl PipelineDefaults {
    /// Worker threads when the caller does not choose.
    pub const WORKERS: usize = 4;
    /// Bound of the work queue. Dispatch blocks once this many items are waiting.
    pub const QUEUE_CAPACITY: usize = 25;
    /// NDJSON lines shorter than this (bytes) are skipped without an error.
    pub const MIN_FRAGMENT_LEN: usize = 10;
    /// Record field used as the collection key.
    pub const KEY_FIELD: &'static str = "hash";
}

// ---- Worker threads ----

/// Thread limits for the CLI's derived worker count.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    pub floor: usize,
    pub max: usize,
    /// Fetches block on I/O, so run more workers than cores.
    pub io_multiplier: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
            max: Self::MAX_THREADS,
            io_multiplier: Self::IO_MULTIPLIER,
        }
    }
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 2;
    pub const MAX_THREADS: usize = 64;
    pub const IO_MULTIPLIER: usize = 2;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }

    /// Worker count for I/O-bound fetches: threads × multiplier, clamped, then capped by the FD limit.
    pub fn io_workers(&self) -> usize {
        let wanted = (self.all_threads * self.io_multiplier).clamp(self.floor, self.max);
        cap_workers_by_fd_limit(wanted)
    }
}

// ---- Progress / reporting ----

/// Progress bar and summary tuning.
pub struct ReportConsts;

impl ReportConsts {
    /// Skipped entries listed one per line in verbose mode before the rest are summarized.
    pub const SKIPPED_LIST_LIMIT: usize = 50;
}

// ---- Stop file ----

/// How often the CLI checks for the stop file.
pub const STOP_FILE_POLL_INTERVAL: Duration = Duration::from_millis(500);
