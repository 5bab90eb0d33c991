use rand::Rng;

use crate::square::Square;

/// Magnitude of the noise perturbing the quadrant edge shares at each cut.
const SHATTER_NOISE: f64 = 0.005;

/// Replace `squares[idx]` with its quadrants.
///
/// Each child receives a share of the parent quota biased by the R-MAT
/// weights plus a small noise; integer truncation residue lands on the last
/// child so the quota is conserved exactly. For an undirected graph a parent
/// on the main diagonal folds its upper-triangle part (1) into the symmetric
/// part (2) and yields three children instead of four.
pub fn shatter_square<R: Rng>(
    squares: &mut Vec<Square>,
    idx: usize,
    a: f64,
    b: f64,
    c: f64,
    directed: bool,
    rng: &mut R,
) {
    let parent = squares.remove(idx);

    let a_share = a + rng.gen_range(-SHATTER_NOISE..SHATTER_NOISE);
    let b_share = b + rng.gen_range(-SHATTER_NOISE..SHATTER_NOISE);
    let c_share = c + rng.gen_range(-SHATTER_NOISE..SHATTER_NOISE);

    let mut quotas = [0u64; 4];
    let mut assigned = 0;
    for (quota, share) in quotas.iter_mut().zip([a_share, b_share, c_share]) {
        // Truncating cast; a noisy share below zero contributes nothing.
        *quota = ((share * parent.n_edges as f64) as u64).min(parent.n_edges - assigned);
        assigned += *quota;
    }
    quotas[3] = parent.n_edges - assigned;

    for (part, quota) in quotas.into_iter().enumerate() {
        squares.push(parent.part(part as u32, quota));
    }

    if !directed && parent.on_diagonal() {
        let n = squares.len();
        let folded = squares[n - 3].n_edges;
        squares[n - 2].n_edges += folded;
        squares.remove(n - 3);
    }
}

/// True when any region is too dense for rejection sampling to finish in
/// reasonable time; such regions are not shattered further.
pub fn edge_overflow(squares: &[Square]) -> bool {
    squares
        .iter()
        .any(|s| s.n_edges.saturating_mul(3) >= s.area())
}

/// Whether every column fits the per-thread capacity.
///
/// A column is a run of squares sharing one x-range; the slice must already
/// be ordered on `(h_idx, v_idx)` so those runs are contiguous.
pub fn columns_within_capacity(squares: &[Square], capacity: u64) -> bool {
    let mut column_edges = 0;
    let mut column_x_end = 0;
    for square in squares {
        if square.x_end == column_x_end {
            column_edges += square.n_edges;
        } else {
            column_edges = square.n_edges;
            column_x_end = square.x_end;
        }
        if column_edges > capacity {
            return false;
        }
    }
    true
}

/// Number of distinct columns in an ordered square list. Each column becomes
/// one sequential work unit in sorted mode.
pub fn column_count(squares: &[Square]) -> usize {
    let mut columns = 0;
    let mut column_x_end = 0;
    for square in squares {
        if square.x_end != column_x_end {
            column_x_end = square.x_end;
            columns += 1;
        }
    }
    columns
}
