//! In-memory model of one solution time frame.
//!
//! A frame is an ordered set of rectangular patches, each carrying a
//! dense block of per-cell solution components and optionally a block
//! of auxiliary components with the same cell layout.

use serde::{Deserialize, Serialize};

/// Extent of one patch dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchDim {
    /// Cell count along this dimension.
    pub n: usize,
    /// Coordinate of the lower cell edge.
    pub lower: f64,
    /// Cell width.
    pub delta: f64,
}

impl PatchDim {
    /// Coordinate of the upper cell edge.
    pub fn upper(&self) -> f64 {
        self.lower + self.n as f64 * self.delta
    }
}

/// Dense per-cell component block, cells in memory order with the
/// first dimension varying fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchData {
    ncells: usize,
    ncomp: usize,
    data: Vec<f64>,
}

impl PatchData {
    /// A block of `ncells * ncomp` zeros.
    pub fn zeros(ncells: usize, ncomp: usize) -> Self {
        Self {
            ncells,
            ncomp,
            data: vec![0.0; ncells * ncomp],
        }
    }

    /// Wraps an existing value buffer, cell-major.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != ncells * ncomp`.
    pub fn from_vec(ncells: usize, ncomp: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            ncells * ncomp,
            "component buffer does not match the declared cell layout"
        );
        Self { ncells, ncomp, data }
    }

    pub fn ncells(&self) -> usize {
        self.ncells
    }

    pub fn ncomp(&self) -> usize {
        self.ncomp
    }

    /// Component `comp` of linear cell `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell` or `comp` is out of range.
    pub fn get(&self, cell: usize, comp: usize) -> f64 {
        assert!(cell < self.ncells && comp < self.ncomp);
        self.data[cell * self.ncomp + comp]
    }

    /// Overwrites component `comp` of linear cell `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell` or `comp` is out of range.
    pub fn set(&mut self, cell: usize, comp: usize, value: f64) {
        assert!(cell < self.ncells && comp < self.ncomp);
        self.data[cell * self.ncomp + comp] = value;
    }

    /// The raw buffer, cell-major.
    pub fn values(&self) -> &[f64] {
        &self.data
    }
}

/// One rectangular computational patch of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Identifier carried in the frame files; not required to equal
    /// the patch position within the frame.
    pub grid_number: i32,
    /// Refinement level, 1 for the coarsest.
    pub level: usize,
    /// One entry per dimension, x first.
    pub dims: Vec<PatchDim>,
    /// Solution components.
    pub q: PatchData,
    /// Auxiliary components, when present.
    pub aux: Option<PatchData>,
}

impl Patch {
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total cell count across all dimensions.
    pub fn ncells(&self) -> usize {
        self.dims.iter().map(|dim| dim.n).product()
    }

    /// Linear index of the cell at multi-index `idx`, first dimension
    /// fastest.
    ///
    /// # Panics
    ///
    /// Panics if `idx.len()` differs from the patch dimensionality.
    pub fn cell_index(&self, idx: &[usize]) -> usize {
        assert_eq!(idx.len(), self.dims.len());
        idx.iter()
            .zip(&self.dims)
            .rev()
            .fold(0, |linear, (&i, dim)| linear * dim.n + i)
    }
}

/// One simulation snapshot: the frame scalars plus its patches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmrFrame {
    /// Simulation time of the snapshot.
    pub time: f64,
    /// Solution components per cell.
    pub meqn: usize,
    /// Auxiliary components per cell, 0 when the run carries none.
    pub maux: usize,
    /// Spatial dimensionality shared by every patch.
    pub ndim: usize,
    pub patches: Vec<Patch>,
}

impl AmrFrame {
    pub fn ngrids(&self) -> usize {
        self.patches.len()
    }

    /// The patch carrying `grid_number`, if any.
    pub fn patch_by_grid_number(&self, grid_number: i32) -> Option<&Patch> {
        self.patches
            .iter()
            .find(|patch| patch.grid_number == grid_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_index_first_dim_fastest() {
        let patch = Patch {
            grid_number: 1,
            level: 1,
            dims: vec![
                PatchDim { n: 3, lower: 0.0, delta: 1.0 },
                PatchDim { n: 2, lower: 0.0, delta: 1.0 },
            ],
            q: PatchData::zeros(6, 1),
            aux: None,
        };
        assert_eq!(patch.cell_index(&[0, 0]), 0);
        assert_eq!(patch.cell_index(&[1, 0]), 1);
        assert_eq!(patch.cell_index(&[0, 1]), 3);
        assert_eq!(patch.cell_index(&[2, 1]), 5);
        assert_eq!(patch.ncells(), 6);
    }

    #[test]
    fn test_dim_upper_edge() {
        let dim = PatchDim { n: 4, lower: -1.0, delta: 0.5 };
        assert!((dim.upper() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_data_block_layout() {
        let mut data = PatchData::zeros(2, 3);
        data.set(0, 2, 7.0);
        data.set(1, 0, 9.0);
        assert_eq!(data.values(), &[0.0, 0.0, 7.0, 9.0, 0.0, 0.0]);
        assert_eq!(data.get(0, 2), 7.0);
        assert_eq!(data.ncells(), 2);
        assert_eq!(data.ncomp(), 3);
    }

    #[test]
    #[should_panic]
    fn test_from_vec_rejects_bad_shape() {
        let _ = PatchData::from_vec(2, 2, vec![1.0, 2.0, 3.0]);
    }
}
