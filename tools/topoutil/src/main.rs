//! Command line front end for the raster and frame codecs.
//!
//! Every subcommand is a thin wrapper: parse arguments, call one
//! library entry point, print the result. Failures propagate and exit
//! the process non-zero.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use amr_codec::{available_frames, latest_run_frames, read_frame_time};
use flowgrid_common::BoundingBox;
use grid_transform::{refine_file, subsample_file, subset, subset_file_streaming, RefineTarget};
use topo_codec::{
    convert_topotype, esri_header, read_grid, swap_header, write_grid, TopoHeader, TopoType,
    WriteOptions,
};

#[derive(Parser, Debug)]
#[command(name = "topoutil")]
#[command(about = "Inspect and transform plain-text rasters and solution frames")]
struct Args {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header and extent of a raster
    Info {
        /// Raster file
        file: PathBuf,
        /// Layout code: 1 = xyz triples, 2 = one value per line, 3 = one row per line
        #[arg(long, short = 't', default_value = "3")]
        topotype: u8,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Rewrite a raster in another layout
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Layout code of the input
        #[arg(long)]
        from: u8,
        /// Layout code of the output
        #[arg(long)]
        to: u8,
        /// Nodata value to use when the input carries no header
        #[arg(long)]
        nodata: Option<f64>,
    },
    /// Cut a bounding box out of a raster
    Subset {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, short = 't', default_value = "3")]
        topotype: u8,
        /// Box as min_x,min_y,max_x,max_y
        #[arg(long)]
        bbox: BoundingBox,
        /// Stream row by row instead of materializing the grid
        #[arg(long)]
        cheap: bool,
    },
    /// Keep every k-th node along both axes
    Subsample {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, short = 't', default_value = "3")]
        topotype: u8,
        /// Node stride, 1 keeps everything
        #[arg(long)]
        stride: usize,
    },
    /// Interpolate onto a finer mesh
    Refine {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, short = 't', default_value = "3")]
        topotype: u8,
        /// Cell split factor per axis
        #[arg(long)]
        ratio: usize,
    },
    /// Rewrite the header in the other positional convention
    SwapHeader {
        input: PathBuf,
        output: PathBuf,
        /// Write a key-first ESRI header instead
        #[arg(long)]
        esri: bool,
    },
    /// List the solution frames in an output directory
    Frames {
        dir: PathBuf,
        /// File name prefix shared by the frame files
        #[arg(long, default_value = "fort")]
        prefix: String,
        /// Include frames left over from earlier runs
        #[arg(long)]
        all: bool,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Info { file, topotype, json } => info_cmd(&file, topotype, json),
        Command::Convert { input, output, from, to, nodata } => {
            let type_in = TopoType::from_code(from)?;
            let type_out = TopoType::from_code(to)?;
            info!(%type_in, %type_out, "converting {}", input.display());
            convert_topotype(&input, &output, type_in, type_out, nodata)?;
            Ok(())
        }
        Command::Subset { input, output, topotype, bbox, cheap } => {
            subset_cmd(&input, &output, topotype, &bbox, cheap)
        }
        Command::Subsample { input, output, topotype, stride } => {
            let topotype = TopoType::from_code(topotype)?;
            subsample_file(&input, &output, topotype, stride)?;
            info!("wrote every {stride}-th node to {}", output.display());
            Ok(())
        }
        Command::Refine { input, output, topotype, ratio } => {
            let topotype = TopoType::from_code(topotype)?;
            refine_file(&input, &output, topotype, &RefineTarget::Ratio(ratio))?;
            info!("wrote {ratio}-fold refinement to {}", output.display());
            Ok(())
        }
        Command::SwapHeader { input, output, esri } => {
            if esri {
                esri_header(&input, &output)?;
            } else {
                swap_header(&input, &output)?;
            }
            Ok(())
        }
        Command::Frames { dir, prefix, all, json } => frames_cmd(&dir, &prefix, all, json),
    }
}

#[derive(Serialize)]
struct RasterInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<TopoHeader>,
    extent: BoundingBox,
    ncols: usize,
    nrows: usize,
}

fn info_cmd(file: &Path, topotype: u8, json: bool) -> Result<()> {
    let topotype = TopoType::from_code(topotype)?;
    let info = if topotype.has_header() {
        let header = TopoHeader::read_from_path(file)?;
        RasterInfo {
            extent: header.extent(),
            ncols: header.ncols,
            nrows: header.nrows,
            header: Some(header),
        }
    } else {
        // Triples carry no header, so the whole file is scanned.
        let (grid, _) = read_grid(file, topotype)?;
        RasterInfo {
            header: None,
            extent: grid.bbox(),
            ncols: grid.ncols(),
            nrows: grid.nrows(),
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{} columns x {} rows", info.ncols, info.nrows);
        println!("x: {} .. {}", info.extent.min_x, info.extent.max_x);
        println!("y: {} .. {}", info.extent.min_y, info.extent.max_y);
        if let Some(header) = &info.header {
            println!("cellsize: {}", header.cellsize);
            println!("nodata:   {}", header.nodata);
        }
    }
    Ok(())
}

fn subset_cmd(
    input: &Path,
    output: &Path,
    topotype: u8,
    bbox: &BoundingBox,
    cheap: bool,
) -> Result<()> {
    let topotype = TopoType::from_code(topotype)?;
    if cheap {
        let header = subset_file_streaming(input, output, topotype, bbox)?;
        info!(
            ncols = header.ncols,
            nrows = header.nrows,
            "wrote streamed subset to {}",
            output.display()
        );
        return Ok(());
    }

    let (grid, header) = read_grid(input, topotype)?;
    let cut = subset(&grid, bbox);
    let opts = match header {
        Some(h) => WriteOptions::with_nodata(h.nodata),
        None => WriteOptions::default(),
    };
    write_grid(&cut, output, topotype, &opts)?;
    info!(
        ncols = cut.ncols(),
        nrows = cut.nrows(),
        "wrote subset to {}",
        output.display()
    );
    Ok(())
}

#[derive(Serialize)]
struct FrameInfo {
    frame: usize,
    time: f64,
    ngrids: usize,
}

fn frames_cmd(dir: &Path, prefix: &str, all: bool, json: bool) -> Result<()> {
    let frames = if all {
        available_frames(dir, prefix)?
    } else {
        latest_run_frames(dir, prefix)?
    };

    let mut rows = Vec::with_capacity(frames.len());
    for frameno in frames {
        let (time, _, ngrids, _, _) = read_frame_time(dir, frameno, prefix)?;
        rows.push(FrameInfo {
            frame: frameno,
            time,
            ngrids,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("no frames under {}", dir.display());
    } else {
        for row in &rows {
            println!(
                "frame {:4}   t = {:<14}   {} patches",
                row.frame, row.time, row.ngrids
            );
        }
    }
    Ok(())
}
