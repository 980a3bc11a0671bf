//! Plain-text raster codec.
//!
//! Three on-disk layouts share one positional header convention:
//!
//! ```text
//! type 1   headerless "x y z" triples, northwest corner first
//! type 2   six-field header, one z value per line
//! type 3   six-field header, one row of z values per line
//! ```
//!
//! Reading reconstructs cell-center coordinate planes anchored at the
//! header's lower-left corner; writing derives the corner back from the
//! cell centers. The two conventions intentionally differ by half a
//! cell, matching the files produced and consumed by the surrounding
//! toolchain.
//!
//! # Example
//!
//! ```ignore
//! use topo_codec::{read_grid, write_grid, TopoType, WriteOptions};
//!
//! let (grid, header) = read_grid("bathymetry.tt3", TopoType::ZRows)?;
//! let opts = WriteOptions {
//!     nodata_in: header.map(|h| h.nodata),
//!     nodata_out: Some(f64::NAN),
//! };
//! write_grid(&grid, "bathymetry.tt2", TopoType::ZColumn, &opts)?;
//! ```

pub mod grid;
pub mod header;
pub mod read;
pub mod synth;
pub mod write;

pub use grid::{TopoGrid, TopoType};
pub use header::{header_extent, HeaderLayout, TopoHeader};
pub use read::{read_grid, read_grid_from};
pub use synth::{write_topo_fn, SynthDomain};
pub use write::{
    convert_topotype, esri_header, is_nodata, swap_header, write_grid, write_grid_to,
    write_grid_with_header, WriteOptions,
};
