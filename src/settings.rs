//! Compile-time program configuration.

/// Bounds on the number of worker threads.
pub const MIN_WORKER_THREADS: usize = 1;
pub const MAX_WORKER_THREADS: usize = 128;

/// Bounds on the portion of physical RAM the generator may claim.
pub const MIN_RAM_PORTION: f64 = 0.01;
pub const MAX_RAM_PORTION: f64 = 0.9;

/// Runs requesting fewer edges than this are forced onto a single worker
/// thread; very small regions split across workers can produce incorrect
/// results.
pub const SINGLE_THREAD_EDGE_LIMIT: u64 = 10_000;

/// Perturb the R-MAT cut line with a small noise at every descent step of
/// the per-edge index walk, not just at square partitioning.
pub const NOISE_AT_EACH_DESCENT_STEP: bool = false;

/// Serialize unsorted batches under a writer mutex held by the workers
/// instead of handing them to the main thread over concurrent queues.
pub const MUTEX_WRITER_INSTEAD_OF_QUEUES: bool = false;
