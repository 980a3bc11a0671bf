//! Writing the time, primary and auxiliary files of one frame.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use flowgrid_common::{fmt, FlowgridError, FlowgridResult};

use crate::frame::{AmrFrame, Patch, PatchData};
use crate::paths;

/// Dimension names as they appear in sub-header labels, x first.
pub(crate) const DIM_NAMES: [&str; 3] = ["x", "y", "z"];

/// Options for [`write_frame`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameWriteOptions {
    /// File name prefix shared by the three streams.
    pub prefix: String,
    /// Also write the auxiliary stream when the frame declares aux
    /// components.
    pub write_aux: bool,
}

impl Default for FrameWriteOptions {
    fn default() -> Self {
        Self {
            prefix: "fort".to_owned(),
            write_aux: false,
        }
    }
}

/// Writes `frame` as frame number `frameno` under `dir`.
///
/// Produces the time and primary files, plus the auxiliary file when
/// `write_aux` is set and the frame declares aux components. Every
/// patch must then carry an aux block.
pub fn write_frame(
    frame: &AmrFrame,
    dir: impl AsRef<Path>,
    frameno: usize,
    opts: &FrameWriteOptions,
) -> FlowgridResult<()> {
    validate(frame)?;
    let dir = dir.as_ref();

    let mut t_file = BufWriter::new(File::create(paths::time_path(dir, &opts.prefix, frameno))?);
    float_line(&mut t_file, frame.time, "time")?;
    int_line(&mut t_file, frame.meqn, "meqn")?;
    int_line(&mut t_file, frame.patches.len(), "ngrids")?;
    int_line(&mut t_file, frame.maux, "maux")?;
    int_line(&mut t_file, frame.ndim, "ndim")?;
    t_file.flush()?;

    let mut q_file = BufWriter::new(File::create(paths::q_path(dir, &opts.prefix, frameno))?);
    let mut aux_file = if frame.maux > 0 && opts.write_aux {
        let path = paths::aux_frame_path(dir, &opts.prefix, frameno);
        Some(BufWriter::new(File::create(path)?))
    } else {
        None
    };

    for patch in &frame.patches {
        write_patch(&mut q_file, patch, &patch.q)?;
        if let Some(aux_file) = aux_file.as_mut() {
            let aux = patch.aux.as_ref().ok_or_else(|| {
                FlowgridError::format(format!(
                    "frame declares maux = {} but patch {} carries no aux block",
                    frame.maux, patch.grid_number
                ))
            })?;
            write_patch(aux_file, patch, aux)?;
        }
    }
    q_file.flush()?;
    if let Some(mut aux_file) = aux_file {
        aux_file.flush()?;
    }
    Ok(())
}

fn validate(frame: &AmrFrame) -> FlowgridResult<()> {
    if !(1..=3).contains(&frame.ndim) {
        return Err(FlowgridError::format(format!(
            "frame dimensionality {} is outside 1..=3",
            frame.ndim
        )));
    }
    if frame.meqn == 0 {
        return Err(FlowgridError::format(
            "frame carries zero solution components",
        ));
    }
    for patch in &frame.patches {
        if patch.dims.len() != frame.ndim {
            return Err(FlowgridError::consistency(format!(
                "patch {} has {} dimensions, the frame declares {}",
                patch.grid_number,
                patch.dims.len(),
                frame.ndim
            )));
        }
        if patch.level == 0 {
            return Err(FlowgridError::format(format!(
                "patch {} has refinement level 0, levels start at 1",
                patch.grid_number
            )));
        }
        let ncells = patch.ncells();
        if patch.q.ncomp() != frame.meqn || patch.q.ncells() != ncells {
            return Err(FlowgridError::consistency(format!(
                "solution block of patch {} does not match its cell layout",
                patch.grid_number
            )));
        }
        if let Some(aux) = &patch.aux {
            if aux.ncomp() != frame.maux || aux.ncells() != ncells {
                return Err(FlowgridError::consistency(format!(
                    "auxiliary block of patch {} does not match its cell layout",
                    patch.grid_number
                )));
            }
        }
    }
    Ok(())
}

/// Sub-header and dense dump of one component block.
fn write_patch(writer: &mut impl Write, patch: &Patch, data: &PatchData) -> FlowgridResult<()> {
    int_line(writer, patch.grid_number, "grid_number")?;
    int_line(writer, patch.level, "AMR_level")?;
    for (dim, name) in patch.dims.iter().zip(DIM_NAMES) {
        int_line(writer, dim.n, &format!("m{name}"))?;
    }
    for (dim, name) in patch.dims.iter().zip(DIM_NAMES) {
        float_line(writer, dim.lower, &format!("{name}low"))?;
    }
    for (dim, name) in patch.dims.iter().zip(DIM_NAMES) {
        float_line(writer, dim.delta, &format!("d{name}"))?;
    }
    writeln!(writer)?;

    match patch.dims.len() {
        1 => {
            for i in 0..patch.dims[0].n {
                cell_line(writer, data, i)?;
            }
        }
        2 => {
            let (nx, ny) = (patch.dims[0].n, patch.dims[1].n);
            for j in 0..ny {
                for i in 0..nx {
                    cell_line(writer, data, i + j * nx)?;
                }
                writeln!(writer)?;
            }
        }
        3 => {
            let (nx, ny, nz) = (patch.dims[0].n, patch.dims[1].n, patch.dims[2].n);
            for k in 0..nz {
                for j in 0..ny {
                    for i in 0..nx {
                        cell_line(writer, data, i + (j + k * ny) * nx)?;
                    }
                    writeln!(writer)?;
                }
                writeln!(writer)?;
            }
        }
        _ => unreachable!("dimensionality validated before writing"),
    }
    Ok(())
}

/// One value line of the sub-header, 5-wide integer then label.
fn int_line(writer: &mut impl Write, value: impl Display, label: &str) -> FlowgridResult<()> {
    writeln!(writer, "{value:5}                  {label}")?;
    Ok(())
}

/// One value line of the sub-header, 18-wide scientific then label.
fn float_line(writer: &mut impl Write, value: f64, label: &str) -> FlowgridResult<()> {
    writeln!(writer, "{}     {label}", fmt::sci_pad(value, 18, 8))?;
    Ok(())
}

/// All components of one cell, concatenated 16-wide scientific.
fn cell_line(writer: &mut impl Write, data: &PatchData, cell: usize) -> FlowgridResult<()> {
    for comp in 0..data.ncomp() {
        write!(writer, "{}", fmt::sci_pad(data.get(cell, comp), 16, 8))?;
    }
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PatchDim;

    fn one_patch_frame() -> AmrFrame {
        AmrFrame {
            time: 0.5,
            meqn: 1,
            maux: 0,
            ndim: 1,
            patches: vec![Patch {
                grid_number: 1,
                level: 1,
                dims: vec![PatchDim { n: 2, lower: 0.0, delta: 1.0 }],
                q: PatchData::from_vec(2, 1, vec![3.0, 4.0]),
                aux: None,
            }],
        }
    }

    #[test]
    fn test_sub_header_line_layout() {
        let mut out = Vec::new();
        int_line(&mut out, 12, "meqn").unwrap();
        float_line(&mut out, 2.0, "time").unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "   12                  meqn");
        assert_eq!(
            lines.next().unwrap(),
            "    2.00000000e+00     time"
        );
    }

    #[test]
    fn test_write_rejects_level_zero() {
        let mut frame = one_patch_frame();
        frame.patches[0].level = 0;
        let dir = tempfile::tempdir().unwrap();
        let err = write_frame(&frame, dir.path(), 0, &FrameWriteOptions::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_write_aux_requires_aux_blocks() {
        let mut frame = one_patch_frame();
        frame.maux = 2;
        let dir = tempfile::tempdir().unwrap();
        let opts = FrameWriteOptions {
            write_aux: true,
            ..FrameWriteOptions::default()
        };
        assert!(write_frame(&frame, dir.path(), 0, &opts).is_err());
    }

    #[test]
    fn test_two_dim_dump_has_slice_blanks() {
        let patch = Patch {
            grid_number: 1,
            level: 1,
            dims: vec![
                PatchDim { n: 2, lower: 0.0, delta: 1.0 },
                PatchDim { n: 2, lower: 0.0, delta: 1.0 },
            ],
            q: PatchData::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]),
            aux: None,
        };
        let mut out = Vec::new();
        write_patch(&mut out, &patch, &patch.q).unwrap();
        let text = String::from_utf8(out).unwrap();
        let blank_count = text.lines().filter(|line| line.trim().is_empty()).count();
        // One separator after the sub-header, one after each row of cells.
        assert_eq!(blank_count, 3);
        assert!(text.contains("  1.00000000e+00\n  2.00000000e+00\n\n"));
    }
}
