//! Reading the three raster layouts.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flowgrid_common::{FlowgridError, FlowgridResult, Grid2, TokenReader};

use crate::grid::{TopoGrid, TopoType};
use crate::header::TopoHeader;

/// Read a raster file.
///
/// Layouts with a header return it alongside the grid; type 1 files
/// carry no header and return `None`. Values may be wrapped across
/// lines arbitrarily; exactly `nrows * ncols` of them must be present.
pub fn read_grid(
    path: impl AsRef<Path>,
    topotype: TopoType,
) -> FlowgridResult<(TopoGrid, Option<TopoHeader>)> {
    let file = File::open(path)?;
    read_grid_from(&mut BufReader::new(file), topotype)
}

/// Read a raster from an open reader.
pub fn read_grid_from(
    reader: &mut impl BufRead,
    topotype: TopoType,
) -> FlowgridResult<(TopoGrid, Option<TopoHeader>)> {
    match topotype {
        TopoType::Xyz => Ok((read_xyz(reader)?, None)),
        TopoType::ZColumn | TopoType::ZRows => {
            let header = TopoHeader::read_from(reader)?;
            let grid = read_values(reader, &header)?;
            Ok((grid, Some(header)))
        }
    }
}

/// Headerless triples: the row length is inferred from the first point
/// whose x coordinate decreases, which marks the wrap onto a new row.
fn read_xyz(reader: &mut impl BufRead) -> FlowgridResult<TopoGrid> {
    let mut tokens = TokenReader::new(reader);
    let values = tokens.take_all_floats()?;
    if values.is_empty() {
        return Err(FlowgridError::format("xyz file holds no data"));
    }
    if values.len() % 3 != 0 {
        return Err(FlowgridError::format(format!(
            "xyz file holds {} values, not a whole number of x y z triples",
            values.len()
        )));
    }

    let points = values.len() / 3;
    let mut ncols = points;
    for k in 1..points {
        if values[3 * k] < values[3 * (k - 1)] {
            ncols = k;
            break;
        }
    }
    if points % ncols != 0 {
        return Err(FlowgridError::format(format!(
            "xyz file wraps after {ncols} points but holds {points}, not a whole number of rows"
        )));
    }
    let nrows = points / ncols;

    let plane = |offset: usize| {
        Grid2::from_fn(nrows, ncols, |i, j| values[3 * (i * ncols + j) + offset])
    };
    Ok(TopoGrid::new(plane(0), plane(1), plane(2)))
}

fn read_values(reader: &mut impl BufRead, header: &TopoHeader) -> FlowgridResult<TopoGrid> {
    let mut tokens = TokenReader::new(reader);
    let values = tokens.take_floats(header.nrows * header.ncols)?;
    if tokens.next_token()?.is_some() {
        return Err(FlowgridError::format(format!(
            "file holds more than the {} values its header declares",
            header.nrows * header.ncols
        )));
    }

    let mut grid = TopoGrid::from_header(header, 0.0);
    grid.z = Grid2::from_vec(header.nrows, header.ncols, values);
    Ok(grid)
}
