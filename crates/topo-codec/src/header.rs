//! The six-field positional header shared by the raster layouts.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use flowgrid_common::tokens::{parse_count, parse_float};
use flowgrid_common::{fmt, BoundingBox, FlowgridError, FlowgridResult};

/// Parsed header of a raster file with a header layout.
///
/// One field per line, value and keyword in either column order:
///
/// ```text
///      3                              ncols
///      2                              nrows
///  0.000000000000000e+00              xlower
///  0.000000000000000e+00              ylower
///  1.000000000000000e+00              cellsize
///  -9999                              nodata_value
/// ```
///
/// `xll`/`yll` name the lower-left anchor; the files in circulation
/// label it xll, xlower, xllcorner or xllcenter interchangeably.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopoHeader {
    pub ncols: usize,
    pub nrows: usize,
    pub xll: f64,
    pub yll: f64,
    pub cellsize: f64,
    pub nodata: f64,
}

/// Column order used when writing a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeaderLayout {
    /// Value first, keyword second ("3 ncols").
    #[default]
    ValueKey,
    /// ESRI convention, uppercase keyword first ("NCOLS 3").
    KeyValue,
}

fn canonical_key(token: &str) -> Option<&'static str> {
    match token.to_ascii_lowercase().as_str() {
        "ncols" => Some("ncols"),
        "nrows" => Some("nrows"),
        "xll" | "xllcenter" | "xllcorner" | "xlower" => Some("xll"),
        "yll" | "yllcenter" | "yllcorner" | "ylower" => Some("yll"),
        "cellsize" => Some("cellsize"),
        "nodata_value" => Some("nodata_value"),
        _ => None,
    }
}

impl TopoHeader {
    /// Read a header, leaving `reader` positioned at the first data line.
    ///
    /// Each field line may put the value or the keyword first; matching
    /// is case-insensitive and accepts the corner/center synonyms. Lines
    /// carrying no known keyword are skipped. Running out of input
    /// before all six fields resolve is a format error.
    pub fn read_from(reader: &mut impl BufRead) -> FlowgridResult<Self> {
        let mut fields: HashMap<&'static str, String> = HashMap::new();

        while fields.len() < 6 {
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                return Err(FlowgridError::format(
                    "input ended before all six header fields were found",
                ));
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 {
                continue;
            }
            if let Some(key) = canonical_key(tokens[0]) {
                fields.insert(key, tokens[1].to_owned());
            }
            if let Some(key) = canonical_key(tokens[1]) {
                fields.insert(key, tokens[0].to_owned());
            }
        }

        let field = |key: &str| -> &str {
            // all six keys are present once the loop exits
            fields.get(key).map(String::as_str).unwrap_or_default()
        };

        let header = Self {
            ncols: parse_count(field("ncols"))?,
            nrows: parse_count(field("nrows"))?,
            xll: parse_float(field("xll"))?,
            yll: parse_float(field("yll"))?,
            cellsize: parse_float(field("cellsize"))?,
            nodata: parse_float(field("nodata_value"))?,
        };

        if header.ncols == 0 || header.nrows == 0 {
            return Err(FlowgridError::format(format!(
                "header declares a degenerate grid ({} columns, {} rows)",
                header.ncols, header.nrows
            )));
        }
        if !(header.cellsize.is_finite() && header.cellsize > 0.0) {
            return Err(FlowgridError::format(format!(
                "header cellsize must be positive, found {}",
                header.cellsize
            )));
        }

        Ok(header)
    }

    /// Read just the header of a file.
    pub fn read_from_path(path: impl AsRef<Path>) -> FlowgridResult<Self> {
        let file = File::open(path)?;
        Self::read_from(&mut BufReader::new(file))
    }

    /// Write the header in the requested column order.
    pub fn write_to(&self, writer: &mut impl Write, layout: HeaderLayout) -> FlowgridResult<()> {
        match layout {
            HeaderLayout::ValueKey => {
                writeln!(writer, "{:6}                              ncols", self.ncols)?;
                writeln!(writer, "{:6}                              nrows", self.nrows)?;
                writeln!(writer, "{}              xlower", fmt::sci_pad(self.xll, 22, 15))?;
                writeln!(writer, "{}              ylower", fmt::sci_pad(self.yll, 22, 15))?;
                writeln!(
                    writer,
                    "{}              cellsize",
                    fmt::sci_pad(self.cellsize, 22, 15)
                )?;
                writeln!(
                    writer,
                    "{:>10}                 nodata_value",
                    fmt::compact(self.nodata)
                )?;
            }
            HeaderLayout::KeyValue => {
                writeln!(writer, "NCOLS {}", self.ncols)?;
                writeln!(writer, "NROWS {}", self.nrows)?;
                writeln!(writer, "XLLCORNER {}", fmt::sci(self.xll, 15))?;
                writeln!(writer, "YLLCORNER {}", fmt::sci(self.yll, 15))?;
                writeln!(writer, "CELLSIZE {}", fmt::sci(self.cellsize, 15))?;
                writeln!(writer, "NODATA_VALUE {}", fmt::compact(self.nodata))?;
            }
        }
        Ok(())
    }

    /// Node extent of the grid the header describes.
    pub fn extent(&self) -> BoundingBox {
        BoundingBox::new(
            self.xll,
            self.yll,
            self.xll + self.cellsize * (self.ncols - 1) as f64,
            self.yll + self.cellsize * (self.nrows - 1) as f64,
        )
    }

    /// Ascending x coordinate of each column.
    pub fn x_coords(&self) -> Vec<f64> {
        (0..self.ncols)
            .map(|j| self.xll + j as f64 * self.cellsize)
            .collect()
    }

    /// Descending y coordinate of each row, northernmost first.
    pub fn y_coords(&self) -> Vec<f64> {
        (0..self.nrows)
            .map(|i| self.yll + (self.nrows - 1 - i) as f64 * self.cellsize)
            .collect()
    }
}

/// Read only the header of a file and report its node extent.
pub fn header_extent(path: impl AsRef<Path>) -> FlowgridResult<BoundingBox> {
    Ok(TopoHeader::read_from_path(path)?.extent())
}
