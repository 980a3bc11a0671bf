//! Combining two raster surfaces.
//!
//! All three operations read their sources from files and sample them
//! bilinearly; they differ in which surface supplies the mesh and which
//! header's nodata sentinel governs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use flowgrid_common::{FlowgridError, FlowgridResult, Grid2};
use topo_codec::{is_nodata, read_grid, TopoGrid, TopoHeader, TopoType};

use crate::sample::bilinear_at;

/// Source layouts and sentinel override for the two-surface operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CombineOptions {
    pub primary_type: TopoType,
    pub secondary_type: TopoType,
    /// Nodata sentinel. When absent it comes from the governing source
    /// header: the primary for [`merge`] and [`fill_from_secondary`],
    /// the secondary for [`clip_surface`].
    pub nodata: Option<f64>,
}

impl CombineOptions {
    /// Both sources in the same layout, sentinel from the headers.
    pub fn same_type(topotype: TopoType) -> Self {
        Self {
            primary_type: topotype,
            secondary_type: topotype,
            nodata: None,
        }
    }
}

fn resolve_nodata(
    override_value: Option<f64>,
    header: Option<TopoHeader>,
    operation: &str,
) -> FlowgridResult<f64> {
    override_value
        .or(header.map(|h| h.nodata))
        .ok_or_else(|| {
            FlowgridError::format(format!(
                "{operation} needs a nodata value and the governing source has no header"
            ))
        })
}

/// Merge two surfaces onto the given axes with hard precedence.
///
/// Each output cell takes the primary's bilinear sample when the point
/// lies inside the primary's extent and the sample differs from the
/// primary nodata sentinel by at least 1.0; every other cell takes the
/// secondary's sample. No blending. Points covered by neither surface
/// come out as NaN.
pub fn merge(
    x_axis: &[f64],
    y_axis: &[f64],
    primary: impl AsRef<Path>,
    secondary: impl AsRef<Path>,
    opts: &CombineOptions,
) -> FlowgridResult<TopoGrid> {
    if x_axis.is_empty() || y_axis.is_empty() {
        return Err(FlowgridError::format("merge axes cannot be empty"));
    }
    let (primary, primary_header) = read_grid(primary, opts.primary_type)?;
    let (secondary, _) = read_grid(secondary, opts.secondary_type)?;
    let nodata = resolve_nodata(opts.nodata, primary_header, "merge")?;

    let mut xs = x_axis.to_vec();
    xs.sort_by(f64::total_cmp);
    // row 0 is the northernmost row
    let mut ys = y_axis.to_vec();
    ys.sort_by(|a, b| b.total_cmp(a));

    let nrows = ys.len();
    let ncols = xs.len();
    let z = Grid2::from_fn(nrows, ncols, |i, j| {
        match bilinear_at(&primary, xs[j], ys[i]) {
            Some(z) if (z - nodata).abs() >= 1.0 => z,
            _ => bilinear_at(&secondary, xs[j], ys[i]).unwrap_or(f64::NAN),
        }
    });
    let x_plane = Grid2::from_fn(nrows, ncols, |_, j| xs[j]);
    let y_plane = Grid2::from_fn(nrows, ncols, |i, _| ys[i]);
    Ok(TopoGrid::new(x_plane, y_plane, z))
}

/// Stamp the primary surface onto the secondary's mesh.
///
/// The result keeps the secondary's coordinates. Wherever the
/// secondary holds a valid value, the cell becomes the primary's
/// bilinear sample at that coordinate (NaN outside the primary);
/// nodata cells pass through unchanged.
pub fn clip_surface(
    primary: impl AsRef<Path>,
    secondary: impl AsRef<Path>,
    opts: &CombineOptions,
) -> FlowgridResult<TopoGrid> {
    let (primary, _) = read_grid(primary, opts.primary_type)?;
    let (mut clipped, secondary_header) = read_grid(secondary, opts.secondary_type)?;
    let nodata = resolve_nodata(opts.nodata, secondary_header, "clip_surface")?;

    for i in 0..clipped.nrows() {
        for j in 0..clipped.ncols() {
            if !is_nodata(clipped.z.get(i, j), nodata) {
                let sample = bilinear_at(&primary, clipped.x.get(i, j), clipped.y.get(i, j))
                    .unwrap_or(f64::NAN);
                clipped.z.set(i, j, sample);
            }
        }
    }
    Ok(clipped)
}

/// Fill the primary's nodata cells from the secondary surface.
///
/// The result keeps the primary's mesh; only cells equal to the
/// primary nodata sentinel change, each replaced by the secondary's
/// bilinear sample at that coordinate (NaN outside the secondary).
pub fn fill_from_secondary(
    primary: impl AsRef<Path>,
    secondary: impl AsRef<Path>,
    opts: &CombineOptions,
) -> FlowgridResult<TopoGrid> {
    let (mut filled, primary_header) = read_grid(primary, opts.primary_type)?;
    let (secondary, _) = read_grid(secondary, opts.secondary_type)?;
    let nodata = resolve_nodata(opts.nodata, primary_header, "fill_from_secondary")?;

    for i in 0..filled.nrows() {
        for j in 0..filled.ncols() {
            if is_nodata(filled.z.get(i, j), nodata) {
                let sample = bilinear_at(&secondary, filled.x.get(i, j), filled.y.get(i, j))
                    .unwrap_or(f64::NAN);
                filled.z.set(i, j, sample);
            }
        }
    }
    Ok(filled)
}
