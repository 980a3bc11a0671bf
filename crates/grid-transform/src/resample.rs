//! Stride subsampling and linear refinement.

use std::path::Path;

use serde::{Deserialize, Serialize};

use flowgrid_common::{FlowgridError, FlowgridResult, Grid2};
use topo_codec::{read_grid, write_grid, TopoGrid, TopoType, WriteOptions};

/// Keep every `stride`-th row and column, starting at the northwest
/// corner. A stride of 1 returns the grid unchanged.
pub fn subsample(grid: &TopoGrid, stride: usize) -> FlowgridResult<TopoGrid> {
    if stride == 0 {
        return Err(FlowgridError::format("subsample stride must be at least 1"));
    }
    let rows: Vec<usize> = (0..grid.nrows()).step_by(stride).collect();
    let cols: Vec<usize> = (0..grid.ncols()).step_by(stride).collect();
    let pick =
        |plane: &Grid2| Grid2::from_fn(rows.len(), cols.len(), |i, j| plane.get(rows[i], cols[j]));
    Ok(TopoGrid::new(pick(&grid.x), pick(&grid.y), pick(&grid.z)))
}

/// Subsample a raster file, writing the reduced grid in the same
/// layout. Header layouts carry the source nodata value through.
pub fn subsample_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    topotype: TopoType,
    stride: usize,
) -> FlowgridResult<()> {
    let (grid, header) = read_grid(input, topotype)?;
    let reduced = subsample(&grid, stride)?;
    let opts = match header {
        Some(h) => WriteOptions::with_nodata(h.nodata),
        None => WriteOptions::default(),
    };
    write_grid(&reduced, output, topotype, &opts)
}

/// Target mesh of a refinement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RefineTarget {
    /// Subdivide every axis interval this many times; an axis of length
    /// `n` becomes `(n - 1) * ratio + 1`, keeping the original nodes.
    Ratio(usize),
    /// Evaluate on explicit axes. Values outside the source extent
    /// clamp to the boundary.
    Axes { x: Vec<f64>, y: Vec<f64> },
}

/// Piecewise-linear interpolation of `grid` onto a finer mesh.
///
/// Separable: each output value interpolates along x within the two
/// bracketing source rows, then along y between them. Original nodes
/// reproduce exactly.
pub fn refine(grid: &TopoGrid, target: &RefineTarget) -> FlowgridResult<TopoGrid> {
    if grid.is_empty() {
        return Err(FlowgridError::format("cannot refine an empty grid"));
    }
    let xs = grid.x_axis();
    let ys = grid.y_axis();

    let (target_x, target_y) = match target {
        RefineTarget::Ratio(0) => {
            return Err(FlowgridError::format("refinement ratio must be at least 1"))
        }
        RefineTarget::Ratio(ratio) => (refined_axis(&xs, *ratio), refined_axis(&ys, *ratio)),
        RefineTarget::Axes { x, y } => {
            if x.is_empty() || y.is_empty() {
                return Err(FlowgridError::format("refinement axes cannot be empty"));
            }
            let mut x = x.clone();
            x.sort_by(f64::total_cmp);
            // row 0 is the northernmost row
            let mut y = y.clone();
            y.sort_by(|a, b| b.total_cmp(a));
            (x, y)
        }
    };

    let cols: Vec<(usize, usize, f64)> = target_x
        .iter()
        .map(|&x| bracket_ascending(&xs, x))
        .collect();
    let rows: Vec<(usize, usize, f64)> = target_y
        .iter()
        .map(|&y| bracket_descending(&ys, y))
        .collect();

    let nrows = rows.len();
    let ncols = cols.len();
    let x_plane = Grid2::from_fn(nrows, ncols, |_, j| target_x[j]);
    let y_plane = Grid2::from_fn(nrows, ncols, |i, _| target_y[i]);
    let z_plane = Grid2::from_fn(nrows, ncols, |i, j| {
        let (r0, r1, ty) = rows[i];
        let (c0, c1, tx) = cols[j];
        let north = (1.0 - tx) * grid.z.get(r0, c0) + tx * grid.z.get(r0, c1);
        if r0 == r1 {
            north
        } else {
            let south = (1.0 - tx) * grid.z.get(r1, c0) + tx * grid.z.get(r1, c1);
            (1.0 - ty) * north + ty * south
        }
    });
    Ok(TopoGrid::new(x_plane, y_plane, z_plane))
}

/// Refine a raster file onto a finer mesh, writing the same layout.
///
/// Header layouts only; headerless triple files are unsupported here.
pub fn refine_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    topotype: TopoType,
    target: &RefineTarget,
) -> FlowgridResult<()> {
    if !topotype.has_header() {
        return Err(FlowgridError::unsupported(
            "refinement of headerless triple files is not supported",
        ));
    }
    let (grid, header) = read_grid(input, topotype)?;
    let fine = refine(&grid, target)?;
    let nodata = header.map(|h| h.nodata);
    let opts = WriteOptions {
        nodata_in: nodata,
        nodata_out: nodata,
    };
    write_grid(&fine, output, topotype, &opts)
}

fn refined_axis(axis: &[f64], ratio: usize) -> Vec<f64> {
    if axis.len() < 2 {
        return axis.to_vec();
    }
    let len = (axis.len() - 1) * ratio + 1;
    let (first, last) = (axis[0], axis[axis.len() - 1]);
    (0..len)
        .map(|k| first + (last - first) * k as f64 / (len - 1) as f64)
        .collect()
}

/// Bracketing indices and the fractional offset from the lower one.
fn bracket_ascending(axis: &[f64], x: f64) -> (usize, usize, f64) {
    let n = axis.len();
    if x <= axis[0] {
        return (0, 0, 0.0);
    }
    if x >= axis[n - 1] {
        return (n - 1, n - 1, 0.0);
    }
    let lo = axis.partition_point(|&v| v <= x) - 1;
    let hi = axis.partition_point(|&v| v < x).min(n - 1);
    if lo == hi {
        (lo, hi, 0.0)
    } else {
        (lo, hi, (x - axis[lo]) / (axis[hi] - axis[lo]))
    }
}

/// Bracketing rows on the descending y axis and the fractional offset
/// from the northern one.
fn bracket_descending(axis: &[f64], y: f64) -> (usize, usize, f64) {
    let n = axis.len();
    if y >= axis[0] {
        return (0, 0, 0.0);
    }
    if y <= axis[n - 1] {
        return (n - 1, n - 1, 0.0);
    }
    let north = axis.partition_point(|&v| v >= y) - 1;
    let south = axis.partition_point(|&v| v > y).min(n - 1);
    if north == south {
        (north, south, 0.0)
    } else {
        (north, south, (axis[north] - y) / (axis[north] - axis[south]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topo_codec::TopoHeader;

    fn plane_grid() -> TopoGrid {
        let header = TopoHeader {
            ncols: 3,
            nrows: 3,
            xll: 0.0,
            yll: 0.0,
            cellsize: 2.0,
            nodata: -9999.0,
        };
        let mut grid = TopoGrid::from_header(&header, 0.0);
        // linear surface, reproduced exactly by linear refinement
        let z = Grid2::from_fn(3, 3, |i, j| {
            3.0 * grid.x.get(i, j) - 2.0 * grid.y.get(i, j) + 1.0
        });
        grid.z = z;
        grid
    }

    #[test]
    fn test_subsample_identity_and_stride() {
        let grid = plane_grid();
        assert_eq!(subsample(&grid, 1).unwrap(), grid);

        let halved = subsample(&grid, 2).unwrap();
        assert_eq!(halved.nrows(), 2);
        assert_eq!(halved.ncols(), 2);
        assert_eq!(halved.x.get(0, 1), 4.0);
        assert_eq!(halved.z.get(1, 1), grid.z.get(2, 2));

        assert!(subsample(&grid, 0).is_err());
    }

    #[test]
    fn test_refine_ratio_keeps_nodes() {
        let grid = plane_grid();
        let fine = refine(&grid, &RefineTarget::Ratio(2)).unwrap();
        assert_eq!(fine.nrows(), 5);
        assert_eq!(fine.ncols(), 5);

        // every second fine node is an original node
        for i in 0..3 {
            for j in 0..3 {
                assert!((fine.z.get(2 * i, 2 * j) - grid.z.get(i, j)).abs() < 1e-12);
            }
        }
        // a linear surface refines without error anywhere
        for i in 0..5 {
            for j in 0..5 {
                let expected = 3.0 * fine.x.get(i, j) - 2.0 * fine.y.get(i, j) + 1.0;
                assert!((fine.z.get(i, j) - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_refine_explicit_axes_clamp() {
        let grid = plane_grid();
        let fine = refine(
            &grid,
            &RefineTarget::Axes {
                x: vec![-10.0, 1.0],
                y: vec![0.0, 3.0],
            },
        )
        .unwrap();
        // queries west of the grid clamp x to the western column
        let clamped = 3.0 * 0.0 - 2.0 * 3.0 + 1.0;
        assert!((fine.z.get(0, 0) - clamped).abs() < 1e-12);
        let interior = 3.0 * 1.0 - 2.0 * 3.0 + 1.0;
        assert!((fine.z.get(0, 1) - interior).abs() < 1e-12);
    }

    #[test]
    fn test_refine_rejects_zero_ratio() {
        assert!(refine(&plane_grid(), &RefineTarget::Ratio(0)).is_err());
    }
}
