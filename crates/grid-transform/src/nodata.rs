//! Nodata sentinel repair and remapping.

use serde::{Deserialize, Serialize};

use flowgrid_common::{FlowgridError, FlowgridResult, Grid2};
use topo_codec::{is_nodata, TopoGrid};

use crate::scatter::idw;

/// Strategy for replacing nodata cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairMethod {
    /// Iteratively average the valid 8-neighbours into each nodata
    /// cell until none remain.
    Fill,
    /// Discard nodata cells and re-grid the surviving points onto the
    /// original axes by inverse-distance weighting.
    Rebuild,
}

/// Replace every cell equal to `nodata` with an interpolated value.
///
/// `Fill` grows inward from the valid data, so lone holes resolve in
/// one pass and wider ones over several. A grid without a single valid
/// cell cannot be repaired.
pub fn repair_nodata(
    grid: &TopoGrid,
    nodata: f64,
    method: RepairMethod,
) -> FlowgridResult<TopoGrid> {
    match method {
        RepairMethod::Fill => fill_from_neighbours(grid, nodata),
        RepairMethod::Rebuild => rebuild_from_valid(grid, nodata),
    }
}

fn fill_from_neighbours(grid: &TopoGrid, nodata: f64) -> FlowgridResult<TopoGrid> {
    let mut repaired = grid.clone();
    let nrows = repaired.nrows();
    let ncols = repaired.ncols();
    let mut remaining: Vec<(usize, usize)> = (0..nrows)
        .flat_map(|i| (0..ncols).map(move |j| (i, j)))
        .filter(|&(i, j)| is_nodata(repaired.z.get(i, j), nodata))
        .collect();

    while !remaining.is_empty() {
        // each pass averages against the state the pass started from
        let snapshot = repaired.z.clone();
        let mut unresolved = Vec::new();
        for &(i, j) in &remaining {
            let mut sum = 0.0;
            let mut count = 0usize;
            for di in -1i64..=1 {
                for dj in -1i64..=1 {
                    if di == 0 && dj == 0 {
                        continue;
                    }
                    let (ni, nj) = (i as i64 + di, j as i64 + dj);
                    if ni < 0 || nj < 0 || ni >= nrows as i64 || nj >= ncols as i64 {
                        continue;
                    }
                    let value = snapshot.get(ni as usize, nj as usize);
                    if !is_nodata(value, nodata) {
                        sum += value;
                        count += 1;
                    }
                }
            }
            if count > 0 {
                repaired.z.set(i, j, sum / count as f64);
            } else {
                unresolved.push((i, j));
            }
        }
        if unresolved.len() == remaining.len() {
            return Err(FlowgridError::format(
                "grid holds no valid cells to repair from",
            ));
        }
        remaining = unresolved;
    }
    Ok(repaired)
}

fn rebuild_from_valid(grid: &TopoGrid, nodata: f64) -> FlowgridResult<TopoGrid> {
    let mut points = Vec::new();
    for i in 0..grid.nrows() {
        for j in 0..grid.ncols() {
            let z = grid.z.get(i, j);
            if !is_nodata(z, nodata) {
                points.push((grid.x.get(i, j), grid.y.get(i, j), z));
            }
        }
    }
    if points.is_empty() {
        return Err(FlowgridError::format(
            "grid holds no valid cells to repair from",
        ));
    }
    let z = Grid2::from_fn(grid.nrows(), grid.ncols(), |i, j| {
        idw(&points, grid.x.get(i, j), grid.y.get(i, j))
    });
    Ok(TopoGrid::new(grid.x.clone(), grid.y.clone(), z))
}

/// Remap the nodata sentinel in place, returning how many cells
/// changed. The one transform that mutates its input.
pub fn change_nodata(grid: &mut TopoGrid, old: f64, new: f64) -> usize {
    let mut changed = 0;
    for value in grid.z.values_mut() {
        if is_nodata(*value, old) {
            *value = new;
            changed += 1;
        }
    }
    changed
}
