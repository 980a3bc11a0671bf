//! Evaluator-based grid synthesis.

use std::path::Path;

use serde::{Deserialize, Serialize};

use flowgrid_common::{FlowgridError, FlowgridResult, Grid2};

use crate::grid::{TopoGrid, TopoType};
use crate::write::{write_grid, WriteOptions};

/// The rectangle a synthesized grid covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthDomain {
    pub xlower: f64,
    pub xupper: f64,
    pub ylower: f64,
    pub yupper: f64,
}

/// Evaluate `f` on an `nx` by `ny` node mesh over `domain` and write the
/// result to `path` in the requested layout.
///
/// Nodes are uniformly spaced with the domain edges included and rows
/// advance from north to south. `f` must be pure; it is called once per
/// node in unspecified order. Layouts with a header need square cells,
/// so their x and y spacing must agree to within 1e-8.
pub fn write_topo_fn(
    path: impl AsRef<Path>,
    f: impl Fn(f64, f64) -> f64,
    domain: &SynthDomain,
    nx: usize,
    ny: usize,
    topotype: TopoType,
    nodata: Option<f64>,
) -> FlowgridResult<()> {
    if nx < 2 || ny < 2 {
        return Err(FlowgridError::format(
            "synthesis needs at least two nodes per axis",
        ));
    }

    let dx = (domain.xupper - domain.xlower) / (nx - 1) as f64;
    let dy = (domain.yupper - domain.ylower) / (ny - 1) as f64;
    if topotype.has_header() && (dx - dy).abs() > 1e-8 {
        return Err(FlowgridError::format(format!(
            "layouts with a header need square cells, got dx = {dx} and dy = {dy}"
        )));
    }

    let x = Grid2::from_fn(ny, nx, |_, j| domain.xlower + j as f64 * dx);
    let y = Grid2::from_fn(ny, nx, |i, _| domain.yupper - i as f64 * dy);
    let z = Grid2::from_fn(ny, nx, |i, j| f(x.get(i, j), y.get(i, j)));
    let grid = TopoGrid::new(x, y, z);

    let opts = WriteOptions {
        nodata_in: nodata,
        nodata_out: nodata,
    };
    write_grid(&grid, path, topotype, &opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: SynthDomain = SynthDomain {
        xlower: 0.0,
        xupper: 2.0,
        ylower: 0.0,
        yupper: 2.0,
    };

    #[test]
    fn test_rejects_degenerate_mesh() {
        let result = write_topo_fn(
            "/nonexistent/out.tt2",
            |_, _| 0.0,
            &UNIT,
            1,
            3,
            TopoType::ZColumn,
            Some(-9999.0),
        );
        assert!(matches!(result, Err(FlowgridError::Format(_))));
    }

    #[test]
    fn test_rejects_non_square_cells_for_header_layouts() {
        let stretched = SynthDomain {
            xupper: 4.0,
            ..UNIT
        };
        let result = write_topo_fn(
            "/nonexistent/out.tt2",
            |_, _| 0.0,
            &stretched,
            3,
            3,
            TopoType::ZColumn,
            Some(-9999.0),
        );
        assert!(matches!(result, Err(FlowgridError::Format(_))));
    }
}
