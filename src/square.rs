use std::cmp::Ordering;
use std::fmt;

/// A rectangular sub-region of the adjacency matrix together with the number
/// of edges it still has to produce.
///
/// `h_idx` and `v_idx` record the partition path that led here, one bit per
/// cut, so sorting on `(h_idx, v_idx)` tiles the matrix consistently.
#[derive(Debug, Clone)]
pub struct Square {
    pub x_start: u64,
    pub x_end: u64,
    pub y_start: u64,
    pub y_end: u64,
    /// Remaining edge quota for this region.
    pub n_edges: u64,
    /// Partition depth, zero at the root.
    pub level: u32,
    pub h_idx: u64,
    pub v_idx: u64,
}

impl Square {
    /// The whole-matrix region every partition tree starts from.
    pub fn root(span: u64, n_edges: u64) -> Self {
        Square {
            x_start: 0,
            x_end: span,
            y_start: 0,
            y_end: span,
            n_edges,
            level: 0,
            h_idx: 0,
            v_idx: 0,
        }
    }

    /// Matrix cells covered by this region.
    pub fn area(&self) -> u64 {
        (self.x_end - self.x_start) * (self.y_end - self.y_start)
    }

    /// True when the region sits on the main diagonal.
    pub fn on_diagonal(&self) -> bool {
        self.x_end == self.y_end
    }

    /// Whether this region's quota fits the per-thread edge budget.
    pub fn within_capacity(&self, capacity: u64) -> bool {
        self.n_edges <= capacity
    }

    /// Extract one quadrant, carrying `n_edges` of the parent quota.
    ///
    /// Parts 0..4 are lower-X/lower-Y, upper-X/lower-Y, lower-X/upper-Y and
    /// upper-X/upper-Y; the ranges bisect at the integer midpoints.
    pub fn part(&self, part: u32, n_edges: u64) -> Square {
        let x_mid = (self.x_start + self.x_end) >> 1;
        let y_mid = (self.y_start + self.y_end) >> 1;
        let upper_x = part == 1 || part == 3;
        let upper_y = part == 2 || part == 3;
        Square {
            x_start: if upper_x { x_mid } else { self.x_start },
            x_end: if upper_x { self.x_end } else { x_mid },
            y_start: if upper_y { y_mid } else { self.y_start },
            y_end: if upper_y { self.y_end } else { y_mid },
            n_edges,
            level: self.level + 1,
            h_idx: (self.h_idx << 1) | u64::from(upper_x),
            v_idx: (self.v_idx << 1) | u64::from(upper_y),
        }
    }
}

// Two squares from the same partition tree can never share a path, so the
// path indices alone identify a square.
impl PartialEq for Square {
    fn eq(&self, other: &Self) -> bool {
        self.h_idx == other.h_idx && self.v_idx == other.v_idx
    }
}

impl Eq for Square {}

impl PartialOrd for Square {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Square {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.h_idx, self.v_idx).cmp(&(other.h_idx, other.v_idx))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x:[{}, {}]  y:[{}, {}]  index:[{}, {}]  edges: {}",
            self.x_start, self.x_end, self.y_start, self.y_end, self.h_idx, self.v_idx, self.n_edges
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_geometry() {
        let root = Square::root(16, 100);
        let p0 = root.part(0, 25);
        assert_eq!((p0.x_start, p0.x_end, p0.y_start, p0.y_end), (0, 8, 0, 8));
        assert_eq!((p0.h_idx, p0.v_idx, p0.level), (0, 0, 1));

        let p1 = root.part(1, 25);
        assert_eq!((p1.x_start, p1.x_end, p1.y_start, p1.y_end), (8, 16, 0, 8));
        assert_eq!((p1.h_idx, p1.v_idx), (1, 0));

        let p2 = root.part(2, 25);
        assert_eq!((p2.x_start, p2.x_end, p2.y_start, p2.y_end), (0, 8, 8, 16));
        assert_eq!((p2.h_idx, p2.v_idx), (0, 1));

        let p3 = root.part(3, 25);
        assert_eq!((p3.x_start, p3.x_end, p3.y_start, p3.y_end), (8, 16, 8, 16));
        assert_eq!((p3.h_idx, p3.v_idx), (1, 1));
    }

    #[test]
    fn test_path_indices_accumulate_per_level() {
        let root = Square::root(16, 100);
        let child = root.part(3, 50).part(1, 10);
        assert_eq!(child.level, 2);
        assert_eq!(child.h_idx, 0b11);
        assert_eq!(child.v_idx, 0b10);
    }

    #[test]
    fn test_square_ordering_is_path_lexicographic() {
        let root = Square::root(16, 100);
        let mut parts: Vec<Square> = (0..4).map(|i| root.part(i, 0)).collect();
        parts.sort_unstable();
        let paths: Vec<(u64, u64)> = parts.iter().map(|s| (s.h_idx, s.v_idx)).collect();
        assert_eq!(paths, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_diagonal_detection() {
        let root = Square::root(16, 100);
        assert!(root.on_diagonal());
        assert!(root.part(0, 0).on_diagonal());
        assert!(root.part(3, 0).on_diagonal());
        assert!(!root.part(1, 0).on_diagonal());
    }

    #[test]
    fn test_area() {
        let root = Square::root(16, 100);
        assert_eq!(root.area(), 256);
        assert_eq!(root.part(0, 0).area(), 64);
    }
}
