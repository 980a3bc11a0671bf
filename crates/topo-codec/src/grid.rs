//! Raster layout tags and the in-memory grid representation.

use serde::{Deserialize, Serialize};

use flowgrid_common::{BoundingBox, FlowgridError, FlowgridResult, Grid2};

use crate::header::TopoHeader;

/// The three plain-text raster layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopoType {
    /// One "x y z" triple per line, no header.
    Xyz,
    /// Six-field header, then one z value per line.
    ZColumn,
    /// Six-field header, then one row of z values per line.
    ZRows,
}

impl TopoType {
    /// Parse the numeric layout code used by the file tooling.
    pub fn from_code(code: u8) -> FlowgridResult<Self> {
        match code {
            1 => Ok(Self::Xyz),
            2 => Ok(Self::ZColumn),
            3 => Ok(Self::ZRows),
            other => Err(FlowgridError::format(format!(
                "unknown raster layout code {other}, expected 1, 2 or 3"
            ))),
        }
    }

    /// Numeric layout code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Xyz => 1,
            Self::ZColumn => 2,
            Self::ZRows => 3,
        }
    }

    /// Whether files of this layout begin with a header.
    pub fn has_header(&self) -> bool {
        !matches!(self, Self::Xyz)
    }
}

impl std::fmt::Display for TopoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A raster with explicit cell-center coordinate planes.
///
/// All three planes share one shape. Row 0 is the northernmost row, so
/// `y` decreases with the row index while `x` increases with the column
/// index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopoGrid {
    pub x: Grid2,
    pub y: Grid2,
    pub z: Grid2,
}

impl TopoGrid {
    /// Assemble a grid from its three planes.
    ///
    /// # Panics
    /// Panics if the planes do not share one shape.
    pub fn new(x: Grid2, y: Grid2, z: Grid2) -> Self {
        assert!(
            x.nrows() == z.nrows()
                && x.ncols() == z.ncols()
                && y.nrows() == z.nrows()
                && y.ncols() == z.ncols(),
            "coordinate and value planes must share one shape"
        );
        Self { x, y, z }
    }

    /// Build the coordinate planes a header describes, with `z` filled
    /// to a constant. Coordinates are anchored at the header's
    /// lower-left corner and advance by its cell size.
    pub fn from_header(header: &TopoHeader, z_fill: f64) -> Self {
        let xs = header.x_coords();
        let ys = header.y_coords();
        let x = Grid2::from_fn(header.nrows, header.ncols, |_, j| xs[j]);
        let y = Grid2::from_fn(header.nrows, header.ncols, |i, _| ys[i]);
        let z = Grid2::filled(header.nrows, header.ncols, z_fill);
        Self { x, y, z }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.z.nrows()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.z.ncols()
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Ascending x coordinate of each column.
    pub fn x_axis(&self) -> Vec<f64> {
        (0..self.ncols()).map(|j| self.x.get(0, j)).collect()
    }

    /// Descending y coordinate of each row, northernmost first.
    pub fn y_axis(&self) -> Vec<f64> {
        (0..self.nrows()).map(|i| self.y.get(i, 0)).collect()
    }

    /// Extent of the cell centers.
    ///
    /// # Panics
    /// Panics if the grid is empty.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.x.get(0, 0),
            self.y.get(self.nrows() - 1, 0),
            self.x.get(0, self.ncols() - 1),
            self.y.get(0, 0),
        )
    }
}
