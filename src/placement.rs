use rand::Rng;

use crate::square::Square;
use crate::{settings, Edge, VertexId};

/// Magnitude of the optional per-step noise on the descent cut line.
const DESCENT_NOISE: f64 = 0.001;

/// Walk the R-MAT recursion down one axis of `[lo, hi]` and pick an index.
///
/// Every step halves the interval: with probability `alpha + beta` the walk
/// keeps the lower half. The walk runs on reals, so it finishes after
/// `ceil(log2(hi - lo))` steps and both endpoints stay reachable.
pub fn recursive_index<R: Rng>(lo: u64, hi: u64, alpha: f64, beta: f64, rng: &mut R) -> u64 {
    let mut lo = lo as f64;
    let mut hi = hi as f64;
    while hi - lo >= 1.0 {
        let mut cut = alpha + beta;
        if settings::NOISE_AT_EACH_DESCENT_STEP {
            cut += rng.gen_range(-DESCENT_NOISE..DESCENT_NOISE);
        }
        let mid = (lo + hi) / 2.0;
        if rng.gen::<f64>() < cut {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    ((lo + hi) / 2.0 + 0.5).floor() as u64
}

/// Draw edges for one square.
///
/// With `replace_slots` empty the square's full quota is appended to
/// `edges`; otherwise the listed positions are overwritten with fresh draws.
/// Samples failing the lower-triangle or self-loop tests are redrawn without
/// being counted.
pub fn place_edges<R: Rng>(
    square: &Square,
    edges: &mut Vec<Edge>,
    a: f64,
    b: f64,
    c: f64,
    directed: bool,
    allow_self_loops: bool,
    replace_slots: &[usize],
    rng: &mut R,
) {
    // Directed graphs take every sample, as do squares strictly below the
    // diagonal; elsewhere an undirected graph keeps lower-triangle draws only.
    let unconstrained = directed || square.h_idx < square.v_idx;
    let append = replace_slots.is_empty();
    let target = if append {
        square.n_edges as usize
    } else {
        replace_slots.len()
    };

    let mut placed = 0;
    while placed < target {
        let src = recursive_index(square.x_start, square.x_end, a, c, rng);
        let dst = recursive_index(square.y_start, square.y_end, a, b, rng);
        if (!unconstrained && src > dst) || (!allow_self_loops && src == dst) {
            continue;
        }
        let edge = Edge::new(src as VertexId, dst as VertexId);
        if append {
            edges.push(edge);
        } else {
            edges[replace_slots[placed]] = edge;
        }
        placed += 1;
    }
}

/// Indices of all-but-one member of every run of equal edges in
/// `edges[from..]`, which must be sorted.
fn duplicate_slots(edges: &[Edge], from: usize) -> Vec<usize> {
    let mut slots = Vec::new();
    for idx in from..edges.len().saturating_sub(1) {
        if edges[idx] == edges[idx + 1] {
            slots.push(idx);
        }
    }
    slots
}

/// Fill `edges` with one square's full quota, redrawing duplicate slots
/// until none remain when duplicates are disallowed.
///
/// `edges` is expected to arrive empty; the whole vector is sorted during
/// duplicate detection.
pub fn fill_square<R: Rng>(
    square: &Square,
    edges: &mut Vec<Edge>,
    a: f64,
    b: f64,
    c: f64,
    directed: bool,
    allow_self_loops: bool,
    allow_duplicate_edges: bool,
    rng: &mut R,
) {
    edges.reserve(square.n_edges as usize);
    place_edges(square, edges, a, b, c, directed, allow_self_loops, &[], rng);

    if allow_duplicate_edges {
        return;
    }
    loop {
        edges.sort_unstable();
        let slots = duplicate_slots(edges, 0);
        if slots.is_empty() {
            break;
        }
        place_edges(square, edges, a, b, c, directed, allow_self_loops, &slots, rng);
    }
}

/// Generate every square of one column into `edges`, deduplicating within
/// each square's freshly appended tail, then sort the whole column so the
/// batch can be emitted in `(src, dst)` order.
pub fn fill_column<R: Rng>(
    column: &[Square],
    edges: &mut Vec<Edge>,
    a: f64,
    b: f64,
    c: f64,
    directed: bool,
    allow_self_loops: bool,
    allow_duplicate_edges: bool,
    rng: &mut R,
) {
    edges.clear();
    edges.reserve(column.iter().map(|s| s.n_edges as usize).sum());

    for square in column {
        let base = edges.len();
        place_edges(square, edges, a, b, c, directed, allow_self_loops, &[], rng);
        if allow_duplicate_edges {
            continue;
        }
        loop {
            edges[base..].sort_unstable();
            let slots = duplicate_slots(edges, base);
            if slots.is_empty() {
                break;
            }
            place_edges(square, edges, a, b, c, directed, allow_self_loops, &slots, rng);
        }
    }

    edges.sort_unstable();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::Square;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_recursive_index_extremes() {
        let mut rng = StdRng::seed_from_u64(11);
        // A cut line of 1.0 keeps the lower half at every step.
        assert_eq!(recursive_index(0, 1024, 0.5, 0.5, &mut rng), 0);
        // A cut line of 0.0 keeps the upper half at every step.
        assert_eq!(recursive_index(0, 1024, 0.0, 0.0, &mut rng), 1024);
    }

    #[test]
    fn test_recursive_index_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(recursive_index(7, 7, 0.45, 0.22, &mut rng), 7);
    }

    #[test]
    fn test_place_edges_fills_quota_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut square = Square::root(63, 0);
        square.n_edges = 200;
        let mut edges = Vec::new();
        place_edges(&square, &mut edges, 0.45, 0.22, 0.22, true, true, &[], &mut rng);
        assert_eq!(edges.len(), 200);
        assert!(edges.iter().all(|e| e.src <= 63 && e.dst <= 63));
    }

    #[test]
    fn test_place_edges_rejects_loops() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut square = Square::root(31, 0);
        square.n_edges = 300;
        let mut edges = Vec::new();
        place_edges(&square, &mut edges, 0.45, 0.22, 0.22, true, false, &[], &mut rng);
        assert_eq!(edges.len(), 300);
        assert!(edges.iter().all(|e| !e.is_loop()));
    }

    #[test]
    fn test_place_edges_keeps_lower_triangle_on_diagonal_squares() {
        let mut rng = StdRng::seed_from_u64(8);
        // The root square straddles the diagonal (h_idx == v_idx).
        let mut square = Square::root(31, 0);
        square.n_edges = 300;
        let mut edges = Vec::new();
        place_edges(&square, &mut edges, 0.45, 0.22, 0.22, false, true, &[], &mut rng);
        assert!(edges.iter().all(|e| e.src <= e.dst));
    }

    #[test]
    fn test_place_edges_overwrites_listed_slots_only() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut square = Square::root(63, 0);
        square.n_edges = 10;
        let mut edges = Vec::new();
        place_edges(&square, &mut edges, 0.45, 0.22, 0.22, true, true, &[], &mut rng);
        let before = edges.clone();
        place_edges(&square, &mut edges, 0.45, 0.22, 0.22, true, true, &[2, 7], &mut rng);
        assert_eq!(edges.len(), 10);
        for (idx, (old, new)) in before.iter().zip(&edges).enumerate() {
            if idx != 2 && idx != 7 {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn test_duplicate_slots_marks_all_but_one() {
        let edges = vec![
            Edge::new(0, 1),
            Edge::new(0, 1),
            Edge::new(0, 1),
            Edge::new(2, 3),
            Edge::new(4, 5),
            Edge::new(4, 5),
        ];
        assert_eq!(duplicate_slots(&edges, 0), vec![0, 1, 4]);
        assert_eq!(duplicate_slots(&edges, 3), vec![4]);
    }

    #[test]
    fn test_fill_square_yields_distinct_edges() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut square = Square::root(64, 0);
        square.n_edges = 600;
        let mut edges = Vec::new();
        fill_square(&square, &mut edges, 0.45, 0.22, 0.22, true, false, false, &mut rng);
        assert_eq!(edges.len(), 600);
        let distinct: HashSet<(VertexId, VertexId)> =
            edges.iter().map(|e| (e.src, e.dst)).collect();
        assert_eq!(distinct.len(), 600);
        assert!(edges.iter().all(|e| !e.is_loop()));
    }

    #[test]
    fn test_fill_column_sorts_and_meets_quota() {
        let mut rng = StdRng::seed_from_u64(12);
        let root = Square::root(64, 1000);
        // One vertical slice: the two lower-X quadrants.
        let column = vec![root.part(0, 350), root.part(2, 250)];
        let mut edges = Vec::new();
        fill_column(&column, &mut edges, 0.45, 0.22, 0.22, true, true, false, &mut rng);
        assert_eq!(edges.len(), 600);
        // Dedup runs per square, and the squares share the boundary index 32,
        // so ordering is non-decreasing rather than strict.
        assert!(edges.windows(2).all(|w| w[0] <= w[1]));
        assert!(edges.iter().all(|e| e.src <= 32 && e.dst <= 64));
    }

    proptest! {
        #[test]
        fn prop_recursive_index_stays_in_range(
            lo in 0u64..1_000_000,
            width in 1u64..1_000_000,
            cut in 0.0f64..1.0,
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let hi = lo + width;
            let idx = recursive_index(lo, hi, cut / 2.0, cut / 2.0, &mut rng);
            prop_assert!(idx >= lo && idx <= hi);
        }
    }
}
