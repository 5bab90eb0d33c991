//! Unordered generation: a worker pool fills squares independently and
//! batches reach the output file in whatever order they complete.

use std::io::{self, Write};
use std::sync::Mutex;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::capacity::CapacityGate;
use crate::config::GeneratorConfig;
use crate::partition::{edge_overflow, shatter_square};
use crate::placement::fill_square;
use crate::square::Square;
use crate::writer::EdgeWriter;
use crate::{settings, Edge, Error};

/// Split the root region until every square fits the per-thread capacity and
/// there are enough squares to keep every worker busy.
///
/// A region too dense for rejection sampling stops the splitting instead of
/// failing the run; its worker simply accepts the rejection rate.
pub fn build_work_set<R: Rng>(cfg: &GeneratorConfig, rng: &mut R) -> Vec<Square> {
    let mut squares = vec![Square::root(cfg.n_vertices - 1, cfg.n_edges)];

    while let Some(idx) = squares
        .iter()
        .position(|s| !s.within_capacity(cfg.standard_capacity))
    {
        if edge_overflow(&squares) {
            break;
        }
        shatter_square(&mut squares, idx, cfg.a, cfg.b, cfg.c, cfg.directed, rng);
    }

    while squares.len() < cfg.threads && !edge_overflow(&squares) {
        let widest = squares
            .iter()
            .enumerate()
            .max_by_key(|(_, s)| s.n_edges)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        shatter_square(&mut squares, widest, cfg.a, cfg.b, cfg.c, cfg.directed, rng);
    }

    squares
}

/// Generate the whole graph with unordered output.
pub fn generate_graph<W: Write + Send>(
    cfg: &GeneratorConfig,
    writer: &mut EdgeWriter<W>,
) -> Result<(), Error> {
    let squares = build_work_set(cfg, &mut rand::thread_rng());
    for square in &squares {
        debug!(%square, "work unit");
    }
    info!("{} partition(s) specified", squares.len());

    if settings::MUTEX_WRITER_INSTEAD_OF_QUEUES {
        generate_with_shared_writer(cfg, &squares, writer)
    } else {
        generate_with_queues(cfg, &squares, writer)
    }
}

/// Every worker claims squares by index stride and serializes its own
/// batches under a shared writer lock.
fn generate_with_shared_writer<W: Write + Send>(
    cfg: &GeneratorConfig,
    squares: &[Square],
    writer: &mut EdgeWriter<W>,
) -> Result<(), Error> {
    let n_workers = cfg.threads.min(squares.len()).max(1);
    let shared = Mutex::new(writer);

    thread::scope(|scope| {
        let mut workers = Vec::with_capacity(n_workers);
        for worker in 0..n_workers {
            let shared = &shared;
            workers.push(scope.spawn(move || -> io::Result<()> {
                let mut rng = StdRng::from_entropy();
                let mut batch = Vec::new();
                let mut idx = worker;
                while idx < squares.len() {
                    fill_square(
                        &squares[idx],
                        &mut batch,
                        cfg.a,
                        cfg.b,
                        cfg.c,
                        cfg.directed,
                        cfg.allow_self_loops,
                        cfg.allow_duplicate_edges,
                        &mut rng,
                    );
                    {
                        let mut writer = shared.lock().expect("writer lock poisoned");
                        writer.write_batch_flushed(&batch)?;
                    }
                    debug!(square = idx, edges = batch.len(), "batch written");
                    batch.clear();
                    idx += n_workers;
                }
                Ok(())
            }));
        }
        for worker in workers {
            match worker.join() {
                Ok(outcome) => outcome?,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(())
    })
}

/// Squares flow to the workers over one channel and finished batches flow
/// back over another; the capacity gate keeps the edges buffered in between
/// under the memory budget while the main thread drains and serializes.
fn generate_with_queues<W: Write + Send>(
    cfg: &GeneratorConfig,
    squares: &[Square],
    writer: &mut EdgeWriter<W>,
) -> Result<(), Error> {
    let gate = CapacityGate::new(cfg.standard_capacity);
    let (square_tx, square_rx) = crossbeam_channel::unbounded::<Square>();
    let (batch_tx, batch_rx) = crossbeam_channel::unbounded::<Vec<Edge>>();

    for square in squares {
        square_tx
            .send(square.clone())
            .expect("square channel closed before filling");
    }
    drop(square_tx);

    thread::scope(|scope| {
        for _ in 0..cfg.threads {
            let square_rx = square_rx.clone();
            let batch_tx = batch_tx.clone();
            let gate = &gate;
            scope.spawn(move || {
                let mut rng = StdRng::from_entropy();
                for square in square_rx.iter() {
                    gate.accumulate(square.n_edges);
                    let mut batch = Vec::new();
                    fill_square(
                        &square,
                        &mut batch,
                        cfg.a,
                        cfg.b,
                        cfg.c,
                        cfg.directed,
                        cfg.allow_self_loops,
                        cfg.allow_duplicate_edges,
                        &mut rng,
                    );
                    if batch_tx.send(batch).is_err() {
                        break; // the writer side is gone
                    }
                }
            });
        }
        drop(batch_tx);

        // Every produced batch is drained even after a write error, so no
        // worker stays blocked on the gate while the scope unwinds.
        let mut outcome: Result<(), Error> = Ok(());
        for _ in 0..squares.len() {
            let Ok(batch) = batch_rx.recv() else { break };
            if outcome.is_ok() {
                outcome = writer.write_batch(&batch).map_err(Error::from);
                debug!(edges = batch.len(), "batch drained");
            }
            gate.dissipate(batch.len() as u64);
        }
        outcome
    })
}
