//! Dense row-major 2-D storage.

use serde::{Deserialize, Serialize};

/// A dense 2-D array of f64 values stored row-major, row 0 first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid2 {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

impl Grid2 {
    /// Create a grid with every cell set to `value`.
    pub fn filled(nrows: usize, ncols: usize, value: f64) -> Self {
        Self {
            data: vec![value; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create a grid by evaluating `f(row, col)` at every cell.
    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in 0..nrows {
            for col in 0..ncols {
                data.push(f(row, col));
            }
        }
        Self { data, nrows, ncols }
    }

    /// Wrap an existing row-major buffer.
    ///
    /// # Panics
    /// Panics if `data.len() != nrows * ncols`.
    pub fn from_vec(nrows: usize, ncols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            nrows * ncols,
            "buffer length must match the grid shape"
        );
        Self { data, nrows, ncols }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the indices are out of range.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.nrows && col < self.ncols);
        self.data[row * self.ncols + col]
    }

    /// Set the value at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the indices are out of range.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.nrows && col < self.ncols);
        self.data[row * self.ncols + col] = value;
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.ncols..(row + 1) * self.ncols]
    }

    /// All values in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Mutable view of all values in row-major order.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }
}
