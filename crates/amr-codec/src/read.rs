//! Reading a frame back from its time, primary and auxiliary files.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use flowgrid_common::tokens::{parse_count, parse_float, parse_int};
use flowgrid_common::{FlowgridError, FlowgridResult};

use crate::frame::{AmrFrame, Patch, PatchData, PatchDim};
use crate::paths;

/// Positions must agree to this absolute tolerance between the
/// primary and auxiliary sub-headers of one patch.
const AUX_POSITION_TOL: f64 = 1.0e-4;

/// Options for [`read_frame`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReadOptions {
    /// File name prefix shared by the three streams.
    pub prefix: String,
    /// Attach the auxiliary stream when the frame declares aux
    /// components.
    pub read_aux: bool,
}

impl Default for FrameReadOptions {
    fn default() -> Self {
        Self {
            prefix: "fort".to_owned(),
            read_aux: false,
        }
    }
}

/// Frame scalars from the time file:
/// `(time, meqn, ngrids, maux, ndim)`.
pub fn read_frame_time(
    dir: impl AsRef<Path>,
    frameno: usize,
    prefix: &str,
) -> FlowgridResult<(f64, usize, usize, usize, usize)> {
    let path = paths::time_path(dir.as_ref(), prefix, frameno);
    let mut reader = BufReader::new(File::open(path)?);
    let time = parse_float(&value_line(&mut reader)?)?;
    let meqn = parse_count(&value_line(&mut reader)?)?;
    let ngrids = parse_count(&value_line(&mut reader)?)?;
    let maux = parse_count(&value_line(&mut reader)?)?;
    let ndim = parse_count(&value_line(&mut reader)?)?;
    Ok((time, meqn, ngrids, maux, ndim))
}

/// Reads frame number `frameno` from `dir`.
///
/// The auxiliary stream is attached only when `read_aux` is set and
/// the frame declares aux components; a missing aux file is then
/// reported at info level and the frame comes back aux-less.
pub fn read_frame(
    dir: impl AsRef<Path>,
    frameno: usize,
    opts: &FrameReadOptions,
) -> FlowgridResult<AmrFrame> {
    let dir = dir.as_ref();
    let (time, meqn, ngrids, maux, ndim) = read_frame_time(dir, frameno, &opts.prefix)?;
    if !(1..=3).contains(&ndim) {
        return Err(FlowgridError::format(format!(
            "frame declares dimensionality {ndim}, expected 1, 2 or 3"
        )));
    }
    if ndim == 3 {
        return Err(FlowgridError::unsupported(
            "reading three-dimensional frames is not implemented",
        ));
    }
    if meqn == 0 {
        return Err(FlowgridError::format(
            "frame declares zero solution components",
        ));
    }

    let mut reader = BufReader::new(File::open(paths::q_path(dir, &opts.prefix, frameno))?);
    let mut patches = Vec::with_capacity(ngrids);
    for _ in 0..ngrids {
        let header = read_patch_header(&mut reader, ndim)?;
        let q = read_cells(&mut reader, &header.dims, meqn)?;
        patches.push(Patch {
            grid_number: header.grid_number,
            level: header.level,
            dims: header.dims,
            q,
            aux: None,
        });
    }

    let mut frame = AmrFrame {
        time,
        meqn,
        maux,
        ndim,
        patches,
    };
    if maux > 0 && opts.read_aux {
        attach_aux(&mut frame, dir, frameno, &opts.prefix)?;
    }
    Ok(frame)
}

/// Sub-header of one patch as it appears in the primary and auxiliary
/// streams.
struct PatchHeader {
    grid_number: i32,
    level: usize,
    dims: Vec<PatchDim>,
}

fn read_patch_header(reader: &mut impl BufRead, ndim: usize) -> FlowgridResult<PatchHeader> {
    let grid_number = i32::try_from(parse_int(&value_line(reader)?)?)
        .map_err(|_| FlowgridError::format("grid number out of range"))?;
    let level = parse_count(&value_line(reader)?)?;
    if level == 0 {
        return Err(FlowgridError::format(format!(
            "grid {grid_number} has refinement level 0, levels start at 1"
        )));
    }
    let mut sizes = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        sizes.push(parse_count(&value_line(reader)?)?);
    }
    let mut lowers = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        lowers.push(parse_float(&value_line(reader)?)?);
    }
    let mut dims = Vec::with_capacity(ndim);
    for (n, lower) in sizes.into_iter().zip(lowers) {
        let delta = parse_float(&value_line(reader)?)?;
        dims.push(PatchDim { n, lower, delta });
    }
    skip_line(reader)?;
    Ok(PatchHeader {
        grid_number,
        level,
        dims,
    })
}

/// Dense component block, cells consumed with the first dimension
/// fastest and a separator line after each row of a 2-D patch.
fn read_cells(
    reader: &mut impl BufRead,
    dims: &[PatchDim],
    ncomp: usize,
) -> FlowgridResult<PatchData> {
    let ncells = dims.iter().map(|dim| dim.n).product();
    let mut data = PatchData::zeros(ncells, ncomp);
    match dims.len() {
        1 => {
            for i in 0..dims[0].n {
                let cell = read_cell(reader, ncomp)?;
                for (comp, value) in cell.into_iter().enumerate() {
                    data.set(i, comp, value);
                }
            }
        }
        2 => {
            let (nx, ny) = (dims[0].n, dims[1].n);
            for j in 0..ny {
                for i in 0..nx {
                    let cell = read_cell(reader, ncomp)?;
                    for (comp, value) in cell.into_iter().enumerate() {
                        data.set(i + j * nx, comp, value);
                    }
                }
                skip_line(reader)?;
            }
        }
        _ => unreachable!("dimensionality checked before reading cells"),
    }
    Ok(data)
}

/// First whitespace token of the next line. A blank line or end of
/// input inside a sub-header is malformed.
fn value_line(reader: &mut impl BufRead) -> FlowgridResult<String> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(FlowgridError::format("input ended inside a header record"));
    }
    line.split_whitespace()
        .next()
        .map(str::to_owned)
        .ok_or_else(|| FlowgridError::format("expected a value line, found a blank one"))
}

/// Accumulates whitespace tokens line by line until one cell is
/// complete; surplus tokens on the final line are dropped.
fn read_cell(reader: &mut impl BufRead, ncomp: usize) -> FlowgridResult<Vec<f64>> {
    let mut tokens: Vec<String> = Vec::new();
    while tokens.len() < ncomp {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(FlowgridError::format(format!(
                "input ended while reading a cell of {ncomp} components"
            )));
        }
        tokens.extend(line.split_whitespace().map(str::to_owned));
    }
    tokens.iter().take(ncomp).map(|t| parse_float(t)).collect()
}

/// Consumes one separator line; end of input is tolerated.
fn skip_line(reader: &mut impl BufRead) -> FlowgridResult<()> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(())
}

fn attach_aux(
    frame: &mut AmrFrame,
    dir: &Path,
    frameno: usize,
    prefix: &str,
) -> FlowgridResult<()> {
    let suffixed = paths::aux_frame_path(dir, prefix, frameno);
    let plain = paths::aux_plain_path(dir, prefix);
    let path = if suffixed.exists() {
        suffixed
    } else if plain.exists() {
        plain
    } else {
        info!(
            "no auxiliary file {} or {}, continuing without aux data",
            suffixed.display(),
            plain.display()
        );
        return Ok(());
    };

    let mut index = HashMap::new();
    for (position, patch) in frame.patches.iter().enumerate() {
        index.insert(patch.grid_number, position);
    }

    let mut reader = BufReader::new(File::open(path)?);
    for _ in 0..frame.patches.len() {
        let header = read_patch_header(&mut reader, frame.ndim)?;
        let position = *index.get(&header.grid_number).ok_or_else(|| {
            FlowgridError::consistency(format!(
                "auxiliary stream names grid {} which the primary stream does not contain",
                header.grid_number
            ))
        })?;
        check_aux_header(&frame.patches[position], &header)?;
        let aux = read_cells(&mut reader, &frame.patches[position].dims, frame.maux)?;
        frame.patches[position].aux = Some(aux);
    }
    Ok(())
}

/// The auxiliary sub-header must describe the same patch as the
/// primary one: exact level and sizes, positions within tolerance.
fn check_aux_header(patch: &Patch, aux: &PatchHeader) -> FlowgridResult<()> {
    if aux.level != patch.level {
        return Err(FlowgridError::consistency(format!(
            "auxiliary level {} does not match level {} of grid {}",
            aux.level, patch.level, patch.grid_number
        )));
    }
    if aux.dims.len() != patch.dims.len() {
        return Err(FlowgridError::consistency(format!(
            "auxiliary dimensionality {} does not match grid {}",
            aux.dims.len(),
            patch.grid_number
        )));
    }
    for (axis, (have, want)) in aux.dims.iter().zip(&patch.dims).enumerate() {
        if have.n != want.n {
            return Err(FlowgridError::consistency(format!(
                "auxiliary size {} does not match size {} on axis {axis} of grid {}",
                have.n, want.n, patch.grid_number
            )));
        }
        if (have.lower - want.lower).abs() >= AUX_POSITION_TOL {
            return Err(FlowgridError::consistency(format!(
                "auxiliary lower bound {} does not match {} on axis {axis} of grid {}",
                have.lower, want.lower, patch.grid_number
            )));
        }
        if (have.delta - want.delta).abs() >= AUX_POSITION_TOL {
            return Err(FlowgridError::consistency(format!(
                "auxiliary cell width {} does not match {} on axis {axis} of grid {}",
                have.delta, want.delta, patch.grid_number
            )));
        }
    }
    Ok(())
}
