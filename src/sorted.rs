//! Source-sorted generation: squares group into matrix columns, one worker
//! fills and sorts each column, and the main thread serializes the columns
//! in ascending column order so the file comes out sorted on `(src, dst)`.

use std::collections::VecDeque;
use std::io::Write;
use std::thread::{self, JoinHandle};

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::partition::{column_count, columns_within_capacity, edge_overflow, shatter_square};
use crate::placement::fill_column;
use crate::square::Square;
use crate::writer::EdgeWriter;
use crate::{Edge, Error};

/// Shatter every square of the current round and re-sort so columns stay
/// contiguous runs.
fn shatter_round<R: Rng>(squares: &mut Vec<Square>, cfg: &GeneratorConfig, rng: &mut R) {
    for _ in 0..squares.len() {
        shatter_square(squares, 0, cfg.a, cfg.b, cfg.c, cfg.directed, rng);
    }
    squares.sort_unstable();
}

/// Split the root region until every column fits the capacity budget and
/// there are at least as many columns as workers, then group the squares
/// into their columns. Overflowing regions stop the splitting, as in
/// unsorted mode.
pub fn build_columns<R: Rng>(cfg: &GeneratorConfig, rng: &mut R) -> Vec<Vec<Square>> {
    let mut squares = vec![Square::root(cfg.n_vertices - 1, cfg.n_edges)];

    while !columns_within_capacity(&squares, cfg.standard_capacity) && !edge_overflow(&squares) {
        shatter_round(&mut squares, cfg, rng);
    }
    while column_count(&squares) < cfg.threads && !edge_overflow(&squares) {
        shatter_round(&mut squares, cfg, rng);
    }

    let mut columns = Vec::new();
    for (_, column) in &squares.into_iter().chunk_by(|s| s.x_start) {
        columns.push(column.collect());
    }
    columns
}

/// Generate the whole graph in source-sorted order.
///
/// Up to `threads` columns are in flight at once; the writer always joins
/// the oldest outstanding column before dispatching the next, which keeps
/// the file in ascending column order.
pub fn generate_graph<W: Write + Send>(
    cfg: &GeneratorConfig,
    writer: &mut EdgeWriter<W>,
) -> Result<(), Error> {
    let columns = build_columns(cfg, &mut rand::thread_rng());
    info!("{} column(s) specified", columns.len());

    let params = *cfg;
    let mut pending: VecDeque<JoinHandle<Vec<Edge>>> = VecDeque::new();
    for column in columns {
        if pending.len() == cfg.threads {
            let batch = join_batch(pending.pop_front().expect("pending queue emptied early"));
            writer.write_batch_flushed(&batch)?;
            debug!(edges = batch.len(), "column written");
        }
        pending.push_back(thread::spawn(move || {
            let mut rng = StdRng::from_entropy();
            let mut edges = Vec::new();
            fill_column(
                &column,
                &mut edges,
                params.a,
                params.b,
                params.c,
                params.directed,
                params.allow_self_loops,
                params.allow_duplicate_edges,
                &mut rng,
            );
            edges
        }));
    }
    while let Some(handle) = pending.pop_front() {
        let batch = join_batch(handle);
        writer.write_batch_flushed(&batch)?;
        debug!(edges = batch.len(), "column written");
    }
    Ok(())
}

fn join_batch(handle: JoinHandle<Vec<Edge>>) -> Vec<Edge> {
    match handle.join() {
        Ok(batch) => batch,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
