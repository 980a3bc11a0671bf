//! Bilinear point sampling.
//!
//! Two entry points with different out-of-bounds sentinels survive from
//! the surrounding toolchain: the file-based one answers `NaN`, the
//! in-memory one `-9999.0`. Both warn and keep going; a batch of query
//! points always yields one value per point.

use std::path::Path;

use tracing::warn;

use flowgrid_common::FlowgridResult;
use topo_codec::{read_grid, TopoGrid, TopoType};

/// Bilinear sample of `grid` at `(x, y)`, `None` outside the
/// cell-center extent.
///
/// Bracketing columns are `i0`, the last with `x_axis <= x`, and `i1`,
/// the first with `x_axis >= x`; rows likewise on the descending y
/// axis. The value interpolates along x in each bracketing row, then
/// along y, with a zero slope whenever the brackets coincide. A query
/// on a node therefore returns the stored value exactly.
pub fn bilinear_at(grid: &TopoGrid, x: f64, y: f64) -> Option<f64> {
    if grid.is_empty() || !x.is_finite() || !y.is_finite() {
        return None;
    }
    let xs = grid.x_axis();
    let ys = grid.y_axis();
    let ncols = xs.len();
    let nrows = ys.len();
    if x < xs[0] || x > xs[ncols - 1] || y < ys[nrows - 1] || y > ys[0] {
        return None;
    }

    let i0 = xs.partition_point(|&v| v <= x) - 1;
    let i1 = xs.partition_point(|&v| v < x).min(ncols - 1);

    // row 0 is the northernmost row, so the axis descends
    let north = ys.partition_point(|&v| v >= y) - 1;
    let south = ys.partition_point(|&v| v > y).min(nrows - 1);

    let along_x = |row: usize| -> f64 {
        if i0 == i1 {
            grid.z.get(row, i0)
        } else {
            let slope = (grid.z.get(row, i1) - grid.z.get(row, i0)) / (xs[i1] - xs[i0]);
            grid.z.get(row, i0) + slope * (x - xs[i0])
        }
    };

    let z_north = along_x(north);
    if north == south {
        return Some(z_north);
    }
    let z_south = along_x(south);
    let slope = (z_north - z_south) / (ys[north] - ys[south]);
    Some(z_south + slope * (y - ys[south]))
}

/// Sample an in-memory grid at each query point.
///
/// Points outside the grid warn and yield `-9999.0`.
pub fn sample_grid(grid: &TopoGrid, points: &[(f64, f64)]) -> Vec<f64> {
    points
        .iter()
        .map(|&(x, y)| {
            bilinear_at(grid, x, y).unwrap_or_else(|| {
                warn!("query point ({x}, {y}) is outside the grid, returning -9999");
                -9999.0
            })
        })
        .collect()
}

/// Read a raster file and sample it at each query point.
///
/// Points outside the grid warn and yield `NaN`.
pub fn sample_file(
    path: impl AsRef<Path>,
    topotype: TopoType,
    points: &[(f64, f64)],
) -> FlowgridResult<Vec<f64>> {
    let (grid, _) = read_grid(path, topotype)?;
    Ok(points
        .iter()
        .map(|&(x, y)| {
            bilinear_at(&grid, x, y).unwrap_or_else(|| {
                warn!("query point ({x}, {y}) is outside the grid, returning NaN");
                f64::NAN
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgrid_common::Grid2;

    fn unit_cell() -> TopoGrid {
        // single cell with corners at the four unit-square nodes
        let x = Grid2::from_fn(2, 2, |_, j| j as f64);
        let y = Grid2::from_fn(2, 2, |i, _| 1.0 - i as f64);
        let z = Grid2::from_vec(2, 2, vec![0.0, 2.0, 4.0, 6.0]);
        TopoGrid::new(x, y, z)
    }

    #[test]
    fn test_center_of_unit_cell() {
        let value = bilinear_at(&unit_cell(), 0.5, 0.5).unwrap();
        assert!((value - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_nodes_are_exact() {
        let grid = unit_cell();
        assert_eq!(bilinear_at(&grid, 0.0, 1.0).unwrap(), 0.0);
        assert_eq!(bilinear_at(&grid, 1.0, 1.0).unwrap(), 2.0);
        assert_eq!(bilinear_at(&grid, 0.0, 0.0).unwrap(), 4.0);
        assert_eq!(bilinear_at(&grid, 1.0, 0.0).unwrap(), 6.0);
    }

    #[test]
    fn test_on_column_interpolates_along_y() {
        // x pinned to a node, y halfway between the rows
        let value = bilinear_at(&unit_cell(), 1.0, 0.5).unwrap();
        assert!((value - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_bounds_sentinel() {
        let grid = unit_cell();
        assert!(bilinear_at(&grid, -0.1, 0.5).is_none());
        assert!(bilinear_at(&grid, 0.5, 1.5).is_none());

        let values = sample_grid(&grid, &[(0.5, 0.5), (2.0, 2.0)]);
        assert_eq!(values.len(), 2);
        assert!((values[0] - 3.0).abs() < 1e-12);
        assert_eq!(values[1], -9999.0);
    }

    #[test]
    fn test_nan_query_is_out_of_bounds() {
        assert!(bilinear_at(&unit_cell(), f64::NAN, 0.5).is_none());
    }
}
