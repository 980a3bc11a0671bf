//! Inverse-distance gridding of scattered samples.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flowgrid_common::tokens::TokenReader;
use flowgrid_common::{FlowgridError, FlowgridResult, Grid2};
use topo_codec::{write_grid_with_header, TopoGrid, TopoHeader, TopoType};

/// Squared distance below which a query point counts as sitting on a
/// sample.
const EXACT_HIT: f64 = 1e-12;

/// Inverse-distance weighted value at `(x, y)`, power 2.
///
/// A query on a sample point returns that sample's value exactly.
/// `points` must not be empty.
pub(crate) fn idw(points: &[(f64, f64, f64)], x: f64, y: f64) -> f64 {
    let mut weight_sum = 0.0;
    let mut value_sum = 0.0;
    for &(px, py, pz) in points {
        let dx = px - x;
        let dy = py - y;
        let d2 = dx * dx + dy * dy;
        if d2 < EXACT_HIT {
            return pz;
        }
        // power 2 weight, so no square root is needed
        let weight = 1.0 / d2;
        weight_sum += weight;
        value_sum += weight * pz;
    }
    value_sum / weight_sum
}

/// Grid scattered `(x, y, z)` samples onto the mesh a header describes.
///
/// Every cell takes the inverse-distance weighted value of all samples;
/// cells coinciding with a sample take its value exactly.
pub fn grid_from_scatter(
    points: &[(f64, f64, f64)],
    header: &TopoHeader,
) -> FlowgridResult<TopoGrid> {
    if points.is_empty() {
        return Err(FlowgridError::format(
            "cannot grid an empty set of scatter points",
        ));
    }
    let mut grid = TopoGrid::from_header(header, 0.0);
    let z = Grid2::from_fn(header.nrows, header.ncols, |i, j| {
        idw(points, grid.x.get(i, j), grid.y.get(i, j))
    });
    grid.z = z;
    Ok(grid)
}

/// Grid a file of scattered `x y z` samples and write the result.
///
/// The input holds whitespace-separated triples in any line wrapping.
/// The output carries `header` verbatim, so its extent and nodata value
/// are exactly what the caller declared.
pub fn grid_from_scatter_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    header: &TopoHeader,
    topotype: TopoType,
) -> FlowgridResult<()> {
    let mut tokens = TokenReader::new(BufReader::new(File::open(input)?));
    let values = tokens.take_all_floats()?;
    if values.len() % 3 != 0 {
        return Err(FlowgridError::format(format!(
            "scatter input holds {} values, not a whole number of x y z triples",
            values.len()
        )));
    }
    let points: Vec<(f64, f64, f64)> = values
        .chunks_exact(3)
        .map(|triple| (triple[0], triple[1], triple[2]))
        .collect();

    let grid = grid_from_scatter(&points, header)?;
    write_grid_with_header(header, &grid.z, output, topotype)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idw_exact_on_sample() {
        let points = vec![(0.0, 0.0, 5.0), (1.0, 0.0, 10.0)];
        assert_eq!(idw(&points, 0.0, 0.0), 5.0);
        assert_eq!(idw(&points, 1.0, 0.0), 10.0);
    }

    #[test]
    fn test_idw_midpoint_of_two_samples() {
        let points = vec![(0.0, 0.0, 0.0), (2.0, 0.0, 10.0)];
        let mid = idw(&points, 1.0, 0.0);
        assert!((mid - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_grid_from_scatter_hits_nodes() {
        let header = TopoHeader {
            ncols: 2,
            nrows: 2,
            xll: 0.0,
            yll: 0.0,
            cellsize: 1.0,
            nodata: -9999.0,
        };
        // one sample per mesh node
        let points = vec![
            (0.0, 0.0, 1.0),
            (1.0, 0.0, 2.0),
            (0.0, 1.0, 3.0),
            (1.0, 1.0, 4.0),
        ];
        let grid = grid_from_scatter(&points, &header).unwrap();
        // row 0 is the northernmost row
        assert_eq!(grid.z.get(0, 0), 3.0);
        assert_eq!(grid.z.get(0, 1), 4.0);
        assert_eq!(grid.z.get(1, 0), 1.0);
        assert_eq!(grid.z.get(1, 1), 2.0);
    }

    #[test]
    fn test_empty_scatter_rejected() {
        let header = TopoHeader {
            ncols: 2,
            nrows: 2,
            xll: 0.0,
            yll: 0.0,
            cellsize: 1.0,
            nodata: -9999.0,
        };
        assert!(grid_from_scatter(&[], &header).is_err());
    }
}
