use std::mem;

use sysinfo::{RefreshKind, System, SystemExt};
use thiserror::Error;

use crate::{settings, Edge, VertexId};

/// Rejected run parameters, reported before any generation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the numbers of edges and vertices must both be positive")]
    ZeroSize,
    #[error("{n_edges} edges cannot fit in a graph over {n_vertices} vertices")]
    TooManyEdges { n_edges: u64, n_vertices: u64 },
    #[error("{n_vertices} vertices exceed the compiled vertex index width")]
    IndexWidth { n_vertices: u64 },
    #[error("probabilities a, b and c must each lie in [0, 1] and sum to at most 1")]
    Probabilities,
}

/// Raw run parameters as they arrive from the command line.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub n_edges: u64,
    pub n_vertices: u64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Requested worker count; `None` asks for the hardware default.
    pub threads: Option<usize>,
    pub sorted: bool,
    /// Fraction of physical RAM the run may occupy.
    pub ram_portion: f64,
    pub allow_self_loops: bool,
    pub allow_duplicate_edges: bool,
    pub directed: bool,
}

/// Validated parameters plus the budgets derived from them.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    pub n_edges: u64,
    pub n_vertices: u64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub threads: usize,
    pub sorted: bool,
    pub ram_portion: f64,
    pub allow_self_loops: bool,
    pub allow_duplicate_edges: bool,
    pub directed: bool,
    /// Edge budget each worker may hold in memory at once.
    pub standard_capacity: u64,
}

impl Params {
    /// Check the preconditions, apply the clamps, and derive the per-thread
    /// capacity from the machine's RAM.
    pub fn validate(self, total_ram: u64) -> Result<GeneratorConfig, ConfigError> {
        if self.n_edges == 0 || self.n_vertices == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if let Some(cells) = self.n_vertices.checked_mul(self.n_vertices) {
            if self.n_edges >= cells {
                return Err(ConfigError::TooManyEdges {
                    n_edges: self.n_edges,
                    n_vertices: self.n_vertices,
                });
            }
        }
        if self.n_vertices > VertexId::MAX as u64 + 1 {
            return Err(ConfigError::IndexWidth {
                n_vertices: self.n_vertices,
            });
        }
        let in_unit = |p: f64| (0.0..=1.0).contains(&p);
        if !in_unit(self.a) || !in_unit(self.b) || !in_unit(self.c) || self.a + self.b + self.c > 1.0 {
            return Err(ConfigError::Probabilities);
        }

        let threads = if self.n_edges < settings::SINGLE_THREAD_EDGE_LIMIT {
            1
        } else {
            self.threads
                .unwrap_or_else(default_thread_count)
                .clamp(settings::MIN_WORKER_THREADS, settings::MAX_WORKER_THREADS)
        };
        let ram_portion = self
            .ram_portion
            .clamp(settings::MIN_RAM_PORTION, settings::MAX_RAM_PORTION);
        // The factor 2 leaves headroom for the buffers holding each batch.
        let standard_capacity =
            available_ram(total_ram, ram_portion) / (2 * threads as u64 * mem::size_of::<Edge>() as u64);

        Ok(GeneratorConfig {
            n_edges: self.n_edges,
            n_vertices: self.n_vertices,
            a: self.a,
            b: self.b,
            c: self.c,
            threads,
            sorted: self.sorted,
            ram_portion,
            allow_self_loops: self.allow_self_loops,
            allow_duplicate_edges: self.allow_duplicate_edges,
            directed: self.directed,
            standard_capacity,
        })
    }
}

/// One worker per hardware thread, leaving a core for the writer.
pub fn default_thread_count() -> usize {
    num_cpus::get().saturating_sub(1).max(settings::MIN_WORKER_THREADS)
}

/// Total physical memory of this machine, in bytes.
pub fn total_system_memory() -> u64 {
    let sys = System::new_with_specifics(RefreshKind::new().with_memory());
    sys.total_memory()
}

/// Portion of total RAM the generator may occupy, in bytes.
pub fn available_ram(total_ram: u64, portion: f64) -> u64 {
    (total_ram as f64 * portion) as u64
}
