//! Growable dense weight matrix.
//!
//! Cells live in one row-major arena whose allocated shape (`row_capacity` x
//! `col_capacity`) doubles when the logical shape outgrows it. Callers only
//! ever see the logical `rows x cols` region; everything beyond it stays zero.

const MIN_CAPACITY: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct DenseMatrix {
    cells: Vec<u32>,
    rows: usize,
    cols: usize,
    row_capacity: usize,
    col_capacity: usize,
}

impl DenseMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero-filled matrix of the given logical shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        let mut matrix = Self::new();
        matrix.resize(rows, cols);
        matrix
    }

    /// Build from `rows * cols` cells in row-major order.
    pub fn from_row_major(rows: usize, cols: usize, cells: Vec<u32>) -> Option<Self> {
        if rows.checked_mul(cols)? != cells.len() {
            return None;
        }
        Some(Self {
            cells,
            rows,
            cols,
            row_capacity: rows,
            col_capacity: cols,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Grow the logical shape. Existing cells keep their values and new cells are zero.
    ///
    /// Shrinking is not supported; smaller dimensions are ignored.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        let rows = rows.max(self.rows);
        let cols = cols.max(self.cols);

        if cols > self.col_capacity {
            let new_col_capacity = grown_capacity(self.col_capacity, cols);
            let mut cells = vec![0u32; self.row_capacity * new_col_capacity];
            for r in 0..self.rows {
                let src = r * self.col_capacity;
                let dst = r * new_col_capacity;
                cells[dst..dst + self.cols].copy_from_slice(&self.cells[src..src + self.cols]);
            }
            self.cells = cells;
            self.col_capacity = new_col_capacity;
        }

        if rows > self.row_capacity {
            self.row_capacity = grown_capacity(self.row_capacity, rows);
            // Row-major: extra rows append to the end of the arena.
            self.cells.resize(self.row_capacity * self.col_capacity, 0);
        }

        self.rows = rows;
        self.cols = cols;
    }

    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.check_bounds(row, col);
        self.cells[row * self.col_capacity + col]
    }

    /// Add one to a cell, returning its new value.
    pub fn increment(&mut self, row: usize, col: usize) -> u32 {
        self.check_bounds(row, col);
        let cell = &mut self.cells[row * self.col_capacity + col];
        *cell = cell.saturating_add(1);
        *cell
    }

    /// The logical part of `row`.
    pub fn row(&self, row: usize) -> &[u32] {
        assert!(row < self.rows, "row {row} out of bounds ({})", self.rows);
        let start = row * self.col_capacity;
        &self.cells[start..start + self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[u32]> {
        (0..self.rows).map(move |r| self.row(r))
    }

    /// Logical cells in row-major order, without capacity padding.
    pub fn to_row_major(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.rows * self.cols);
        for row in self.iter_rows() {
            out.extend_from_slice(row);
        }
        out
    }

    fn check_bounds(&self, row: usize, col: usize) {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row}, {col}) out of bounds ({} x {})",
            self.rows,
            self.cols
        );
    }
}

impl PartialEq for DenseMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.iter_rows().zip(other.iter_rows()).all(|(a, b)| a == b)
    }
}

impl Eq for DenseMatrix {}

fn grown_capacity(current: usize, needed: usize) -> usize {
    needed.max(current.saturating_mul(2)).max(MIN_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_preserves_weights() {
        let mut m = DenseMatrix::zeros(2, 2);
        m.increment(0, 1);
        m.increment(1, 0);
        m.increment(1, 0);

        m.resize(40, 3);
        assert_eq!(m.get(0, 1), 1);
        assert_eq!(m.get(1, 0), 2);
        assert_eq!(m.get(0, 2), 0);
        assert_eq!(m.get(39, 2), 0);

        m.resize(41, 70);
        assert_eq!(m.get(0, 1), 1);
        assert_eq!(m.get(1, 0), 2);
        assert_eq!(m.row(40).len(), 70);
        assert!(m.row(40).iter().all(|&w| w == 0));
    }

    #[test]
    fn test_capacity_doubles() {
        let mut m = DenseMatrix::new();
        m.resize(1, 1);
        assert_eq!(m.row_capacity, MIN_CAPACITY);
        m.resize(17, 17);
        assert_eq!(m.row_capacity, 32);
        assert_eq!(m.col_capacity, 32);
        m.resize(18, 18);
        assert_eq!(m.col_capacity, 32);
    }

    #[test]
    fn test_row_major_roundtrip_ignores_capacity() {
        let mut m = DenseMatrix::zeros(3, 2);
        m.increment(2, 1);
        let cells = m.to_row_major();
        assert_eq!(cells, vec![0, 0, 0, 0, 0, 1]);

        let restored = DenseMatrix::from_row_major(3, 2, cells).unwrap();
        assert_eq!(restored, m);
        assert!(DenseMatrix::from_row_major(3, 3, vec![0; 6]).is_none());
    }

    #[test]
    fn test_resize_never_shrinks() {
        let mut m = DenseMatrix::zeros(4, 4);
        m.resize(2, 2);
        assert_eq!((m.rows(), m.cols()), (4, 4));
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_panics() {
        let m = DenseMatrix::zeros(2, 2);
        m.get(2, 0);
    }
}
