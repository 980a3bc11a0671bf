//! Writing the three raster layouts.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use flowgrid_common::{fmt, FlowgridError, FlowgridResult, Grid2};

use crate::grid::{TopoGrid, TopoType};
use crate::header::{HeaderLayout, TopoHeader};
use crate::read::read_grid;

/// Options for the grid writers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Sentinel already present in the data.
    pub nodata_in: Option<f64>,
    /// Sentinel to emit; cells holding `nodata_in` are rewritten to this
    /// value on the way out. Defaults to `nodata_in`.
    pub nodata_out: Option<f64>,
}

impl WriteOptions {
    /// Sentinel used for both reading and writing.
    pub fn with_nodata(nodata: f64) -> Self {
        Self {
            nodata_in: Some(nodata),
            nodata_out: Some(nodata),
        }
    }

    fn header_nodata(&self) -> Option<f64> {
        self.nodata_out.or(self.nodata_in)
    }

    fn remap(&self, value: f64) -> f64 {
        match (self.nodata_in, self.nodata_out) {
            (Some(from), Some(to)) if is_nodata(value, from) => to,
            _ => value,
        }
    }
}

/// Check a value against a nodata sentinel. A NaN sentinel matches NaN
/// cells, which never compare equal directly.
pub fn is_nodata(value: f64, nodata: f64) -> bool {
    if nodata.is_nan() {
        value.is_nan()
    } else {
        value == nodata
    }
}

/// Write a raster to `path` in the requested layout.
///
/// Layouts with a header get one synthesized from the cell centers: the
/// cell size comes from the spacing of adjacent centers and the
/// lower-left corner sits half a cell outside the lower-left center.
pub fn write_grid(
    grid: &TopoGrid,
    path: impl AsRef<Path>,
    topotype: TopoType,
    opts: &WriteOptions,
) -> FlowgridResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_grid_to(grid, &mut writer, topotype, opts)?;
    writer.flush()?;
    Ok(())
}

/// Write a raster to an open writer. See [`write_grid`].
pub fn write_grid_to(
    grid: &TopoGrid,
    writer: &mut impl Write,
    topotype: TopoType,
    opts: &WriteOptions,
) -> FlowgridResult<()> {
    if grid.is_empty() {
        return Err(FlowgridError::format("refusing to write an empty grid"));
    }
    let nrows = grid.nrows();
    if nrows > 1 && grid.y.get(0, 0) < grid.y.get(nrows - 1, 0) {
        return Err(FlowgridError::format(
            "rows advance south to north; row 0 must be the northernmost",
        ));
    }

    match topotype {
        TopoType::Xyz => write_xyz(grid, writer, opts),
        TopoType::ZColumn | TopoType::ZRows => {
            let header = derive_header(grid, opts)?;
            header.write_to(writer, HeaderLayout::ValueKey)?;
            write_z_block(&grid.z, writer, topotype, opts)
        }
    }
}

/// Write a raster from an explicit header and value plane, bypassing
/// coordinate derivation. The header is emitted as given, so a
/// following read reproduces it exactly.
pub fn write_grid_with_header(
    header: &TopoHeader,
    z: &Grid2,
    path: impl AsRef<Path>,
    topotype: TopoType,
) -> FlowgridResult<()> {
    if z.nrows() != header.nrows || z.ncols() != header.ncols {
        return Err(FlowgridError::format(format!(
            "value plane is {}x{} but the header declares {}x{}",
            z.nrows(),
            z.ncols(),
            header.nrows,
            header.ncols
        )));
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    match topotype {
        TopoType::Xyz => {
            let mut grid = TopoGrid::from_header(header, 0.0);
            grid.z = z.clone();
            write_xyz(&grid, &mut writer, &WriteOptions::default())?;
        }
        TopoType::ZColumn | TopoType::ZRows => {
            header.write_to(&mut writer, HeaderLayout::ValueKey)?;
            write_z_block(z, &mut writer, topotype, &WriteOptions::default())?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn write_xyz(grid: &TopoGrid, writer: &mut impl Write, opts: &WriteOptions) -> FlowgridResult<()> {
    for i in 0..grid.nrows() {
        for j in 0..grid.ncols() {
            writeln!(
                writer,
                "{}  {}  {}",
                fmt::sci_pad(grid.x.get(i, j), 22, 15),
                fmt::sci_pad(grid.y.get(i, j), 22, 15),
                fmt::sci_pad(opts.remap(grid.z.get(i, j)), 22, 15)
            )?;
        }
    }
    Ok(())
}

fn write_z_block(
    z: &Grid2,
    writer: &mut impl Write,
    topotype: TopoType,
    opts: &WriteOptions,
) -> FlowgridResult<()> {
    match topotype {
        TopoType::ZColumn => {
            for value in z.values() {
                writeln!(writer, "{}", fmt::sci_pad(opts.remap(*value), 22, 15))?;
            }
        }
        TopoType::ZRows => {
            for i in 0..z.nrows() {
                let row: Vec<String> = z
                    .row(i)
                    .iter()
                    .map(|v| fmt::sci_pad(opts.remap(*v), 22, 15))
                    .collect();
                writeln!(writer, "{}", row.join("   "))?;
            }
        }
        TopoType::Xyz => unreachable!("xyz layout carries no z block"),
    }
    Ok(())
}

fn derive_header(grid: &TopoGrid, opts: &WriteOptions) -> FlowgridResult<TopoHeader> {
    let nodata = opts.header_nodata().ok_or_else(|| {
        FlowgridError::format("a nodata value is required to write a layout with a header")
    })?;

    let nrows = grid.nrows();
    let ncols = grid.ncols();
    let span_x = (ncols > 1)
        .then(|| (grid.x.get(0, ncols - 1) - grid.x.get(0, 0)) / (ncols - 1) as f64);
    let span_y = (nrows > 1)
        .then(|| (grid.y.get(0, 0) - grid.y.get(nrows - 1, 0)) / (nrows - 1) as f64);
    let (cell_x, cell_y) = match (span_x, span_y) {
        (Some(cx), Some(cy)) => (cx, cy),
        (Some(cx), None) => (cx, cx),
        (None, Some(cy)) => (cy, cy),
        (None, None) => {
            return Err(FlowgridError::format(
                "cannot infer a cell size from a single cell",
            ))
        }
    };

    if (cell_x - cell_y).abs() > 1e-8 {
        warn!(
            "cell size differs between axes (dx = {}, dy = {}); the header uses the x spacing",
            cell_x, cell_y
        );
    }

    Ok(TopoHeader {
        ncols,
        nrows,
        xll: grid.x.get(0, 0) - 0.5 * cell_x,
        yll: grid.y.get(nrows - 1, 0) - 0.5 * cell_y,
        cellsize: cell_x,
        nodata,
    })
}

/// Convert a raster file between layouts.
///
/// When the source carries a header and no nodata value is supplied,
/// the source header's value is reused. Converting a headerless source
/// to a layout with a header requires an explicit nodata value.
pub fn convert_topotype(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    type_in: TopoType,
    type_out: TopoType,
    nodata: Option<f64>,
) -> FlowgridResult<()> {
    let (grid, header) = read_grid(input, type_in)?;
    let nodata = nodata.or(header.map(|h| h.nodata));
    if type_out.has_header() && nodata.is_none() {
        return Err(FlowgridError::format(
            "converting a headerless file to a layout with a header requires a nodata value",
        ));
    }

    let opts = WriteOptions {
        nodata_in: nodata,
        nodata_out: nodata,
    };
    write_grid(&grid, output, type_out, &opts)
}

/// Rewrite a file with the canonical value-first header, data lines
/// copied through untouched.
pub fn swap_header(input: impl AsRef<Path>, output: impl AsRef<Path>) -> FlowgridResult<()> {
    rewrite_header(input, output, HeaderLayout::ValueKey)
}

/// Rewrite a file with a key-first ESRI header, data lines copied
/// through untouched.
pub fn esri_header(input: impl AsRef<Path>, output: impl AsRef<Path>) -> FlowgridResult<()> {
    rewrite_header(input, output, HeaderLayout::KeyValue)
}

fn rewrite_header(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    layout: HeaderLayout,
) -> FlowgridResult<()> {
    let mut reader = BufReader::new(File::open(input)?);
    let header = TopoHeader::read_from(&mut reader)?;

    let mut writer = BufWriter::new(File::create(output)?);
    header.write_to(&mut writer, layout)?;
    std::io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::read_grid_from;
    use std::io::Cursor;

    fn center_grid() -> TopoGrid {
        // 3x2 grid of unit cells with centers at half-integer coordinates
        let x = Grid2::from_fn(2, 3, |_, j| 0.5 + j as f64);
        let y = Grid2::from_fn(2, 3, |i, _| 1.5 - i as f64);
        let z = Grid2::from_fn(2, 3, |i, j| (i * 3 + j) as f64);
        TopoGrid::new(x, y, z)
    }

    #[test]
    fn test_header_derived_from_centers() {
        let header = derive_header(&center_grid(), &WriteOptions::with_nodata(-9999.0)).unwrap();
        assert_eq!(header.ncols, 3);
        assert_eq!(header.nrows, 2);
        assert_eq!(header.cellsize, 1.0);
        // corner sits half a cell outside the lower-left center
        assert_eq!(header.xll, 0.0);
        assert_eq!(header.yll, 0.0);
    }

    #[test]
    fn test_header_layouts_require_nodata() {
        let mut buffer = Vec::new();
        let result = write_grid_to(
            &center_grid(),
            &mut buffer,
            TopoType::ZColumn,
            &WriteOptions::default(),
        );
        assert!(matches!(result, Err(FlowgridError::Format(_))));

        // headerless triples do not need one
        write_grid_to(
            &center_grid(),
            &mut buffer,
            TopoType::Xyz,
            &WriteOptions::default(),
        )
        .unwrap();
    }

    #[test]
    fn test_south_first_rows_rejected() {
        let grid = center_grid();
        let flipped = TopoGrid::new(
            grid.x.clone(),
            Grid2::from_fn(2, 3, |i, _| 0.5 + i as f64),
            grid.z.clone(),
        );
        let mut buffer = Vec::new();
        let result = write_grid_to(
            &flipped,
            &mut buffer,
            TopoType::Xyz,
            &WriteOptions::default(),
        );
        assert!(matches!(result, Err(FlowgridError::Format(_))));
    }

    #[test]
    fn test_nodata_remap_on_emission() {
        let mut grid = center_grid();
        grid.z.set(0, 1, -9999.0);
        let opts = WriteOptions {
            nodata_in: Some(-9999.0),
            nodata_out: Some(-32768.0),
        };

        let mut buffer = Vec::new();
        write_grid_to(&grid, &mut buffer, TopoType::ZColumn, &opts).unwrap();
        let (back, header) = read_grid_from(&mut Cursor::new(buffer), TopoType::ZColumn).unwrap();
        assert_eq!(back.z.get(0, 1), -32768.0);
        assert_eq!(header.unwrap().nodata, -32768.0);
    }

    #[test]
    fn test_write_read_z_roundtrip() {
        let grid = center_grid();
        for topotype in [TopoType::Xyz, TopoType::ZColumn, TopoType::ZRows] {
            let mut buffer = Vec::new();
            write_grid_to(
                &grid,
                &mut buffer,
                topotype,
                &WriteOptions::with_nodata(-9999.0),
            )
            .unwrap();
            let (back, _) = read_grid_from(&mut Cursor::new(buffer), topotype).unwrap();
            assert_eq!(back.z, grid.z);
        }
    }

    #[test]
    fn test_xyz_roundtrip_keeps_coordinates() {
        let grid = center_grid();
        let mut buffer = Vec::new();
        write_grid_to(&grid, &mut buffer, TopoType::Xyz, &WriteOptions::default()).unwrap();
        let (back, _) = read_grid_from(&mut Cursor::new(buffer), TopoType::Xyz).unwrap();
        assert_eq!(back.x, grid.x);
        assert_eq!(back.y, grid.y);
        assert_eq!(back.z, grid.z);
    }

    #[test]
    fn test_single_cell_has_no_cell_size() {
        let grid = TopoGrid::new(
            Grid2::filled(1, 1, 0.0),
            Grid2::filled(1, 1, 0.0),
            Grid2::filled(1, 1, 5.0),
        );
        let mut buffer = Vec::new();
        let result = write_grid_to(
            &grid,
            &mut buffer,
            TopoType::ZColumn,
            &WriteOptions::with_nodata(-9999.0),
        );
        assert!(matches!(result, Err(FlowgridError::Format(_))));
    }
}
