//! Rectangular extraction, in memory or streaming over a file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flowgrid_common::tokens::{parse_float, TokenReader};
use flowgrid_common::{BoundingBox, FlowgridError, FlowgridResult, Grid2};
use topo_codec::{HeaderLayout, TopoGrid, TopoHeader, TopoType};

/// Extract the maximal sub-rectangle of rows and columns whose cell
/// centers fall inside `bounds` (inclusive on every edge).
///
/// A box that misses the grid entirely yields an empty grid.
pub fn subset(grid: &TopoGrid, bounds: &BoundingBox) -> TopoGrid {
    let xs = grid.x_axis();
    let ys = grid.y_axis();
    let cols: Vec<usize> = (0..xs.len())
        .filter(|&j| xs[j] >= bounds.min_x && xs[j] <= bounds.max_x)
        .collect();
    let rows: Vec<usize> = (0..ys.len())
        .filter(|&i| ys[i] >= bounds.min_y && ys[i] <= bounds.max_y)
        .collect();

    let pick =
        |plane: &Grid2| Grid2::from_fn(rows.len(), cols.len(), |i, j| plane.get(rows[i], cols[j]));
    TopoGrid::new(pick(&grid.x), pick(&grid.y), pick(&grid.z))
}

/// Streaming subset of a raster file with a header.
///
/// Never materializes the source grid: the output header is derived by
/// intersecting `bounds` with the source header's node mesh, then a
/// single forward pass copies qualifying value tokens through verbatim.
/// An output row is only terminated once it received at least one
/// value, so memory stays proportional to one row regardless of file
/// size. The selection agrees with [`subset`] applied to the fully-read
/// grid.
///
/// Headerless triple files cannot be streamed this way and are
/// rejected as unsupported. Returns the derived output header.
pub fn subset_file_streaming(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    topotype: TopoType,
    bounds: &BoundingBox,
) -> FlowgridResult<TopoHeader> {
    if !topotype.has_header() {
        return Err(FlowgridError::unsupported(
            "streaming subset needs a header layout; read the triples into memory instead",
        ));
    }

    let mut reader = BufReader::new(File::open(input)?);
    let source = TopoHeader::read_from(&mut reader)?;

    let xs = source.x_coords();
    let ys = source.y_coords();
    let col_keep: Vec<bool> = xs
        .iter()
        .map(|&x| x >= bounds.min_x && x <= bounds.max_x)
        .collect();
    let row_keep: Vec<bool> = ys
        .iter()
        .map(|&y| y >= bounds.min_y && y <= bounds.max_y)
        .collect();

    let first_col = col_keep.iter().position(|&k| k);
    let first_row = row_keep.iter().position(|&k| k);
    let (j0, i0) = match (first_col, first_row) {
        (Some(j), Some(i)) => (j, i),
        _ => {
            return Err(FlowgridError::format(
                "requested box does not overlap the source grid",
            ))
        }
    };
    let j1 = col_keep.iter().rposition(|&k| k).unwrap_or(j0);
    let i1 = row_keep.iter().rposition(|&k| k).unwrap_or(i0);

    let target = TopoHeader {
        ncols: j1 - j0 + 1,
        nrows: i1 - i0 + 1,
        xll: xs[j0],
        yll: ys[i1],
        cellsize: source.cellsize,
        nodata: source.nodata,
    };

    let mut writer = BufWriter::new(File::create(output)?);
    target.write_to(&mut writer, HeaderLayout::ValueKey)?;

    let mut tokens = TokenReader::new(reader);
    let mut written = 0usize;
    for i in 0..source.nrows {
        let mut row: Vec<String> = Vec::new();
        for j in 0..source.ncols {
            let token = match tokens.next_token()? {
                Some(token) => token,
                None => {
                    return Err(FlowgridError::format(format!(
                        "input ended inside row {i}, expected {} rows of {} values",
                        source.nrows, source.ncols
                    )))
                }
            };
            parse_float(&token)?;
            if row_keep[i] && col_keep[j] {
                row.push(token);
            }
        }
        if row.is_empty() {
            continue;
        }
        written += row.len();
        match topotype {
            TopoType::ZColumn => {
                for token in &row {
                    writeln!(writer, "{token}")?;
                }
            }
            TopoType::ZRows => writeln!(writer, "{}", row.join("   "))?,
            TopoType::Xyz => unreachable!("headerless layout rejected above"),
        }
    }
    if tokens.next_token()?.is_some() {
        return Err(FlowgridError::format(
            "input holds more values than its header declares",
        ));
    }
    if written != target.nrows * target.ncols {
        return Err(FlowgridError::format(format!(
            "wrote {written} values where the derived header declares {}",
            target.nrows * target.ncols
        )));
    }
    writer.flush()?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> TopoGrid {
        let header = TopoHeader {
            ncols: 4,
            nrows: 3,
            xll: 0.0,
            yll: 0.0,
            cellsize: 1.0,
            nodata: -9999.0,
        };
        let mut grid = TopoGrid::from_header(&header, 0.0);
        grid.z = Grid2::from_fn(3, 4, |i, j| (i * 4 + j) as f64);
        grid
    }

    #[test]
    fn test_full_box_is_identity() {
        let grid = sample_grid();
        let full = subset(&grid, &grid.bbox());
        assert_eq!(full, grid);
    }

    #[test]
    fn test_inclusive_edges() {
        let grid = sample_grid();
        // box edges sit exactly on the second column and middle row
        let part = subset(&grid, &BoundingBox::new(1.0, 1.0, 3.0, 2.0));
        assert_eq!(part.ncols(), 3);
        assert_eq!(part.nrows(), 2);
        assert_eq!(part.x.get(0, 0), 1.0);
        assert_eq!(part.y.get(0, 0), 2.0);
        assert_eq!(part.z.get(0, 0), 1.0);
        assert_eq!(part.z.get(1, 2), 7.0);
    }

    #[test]
    fn test_missing_box_yields_empty() {
        let grid = sample_grid();
        let out = subset(&grid, &BoundingBox::new(50.0, 50.0, 60.0, 60.0));
        assert!(out.is_empty());
    }
}
