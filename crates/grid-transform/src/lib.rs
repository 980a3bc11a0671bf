//! Coordinate-aware raster transforms.
//!
//! Everything here consumes and produces the owned [`TopoGrid`] value
//! from `topo-codec`; no transform mutates its input except the
//! documented in-place nodata remap. The library splits into:
//!
//! ```text
//! sample     bilinear point lookup (two sentinel conventions)
//! subset     rectangular extraction, in memory or file streaming
//! resample   stride subsampling and linear refinement
//! merge      two-surface precedence merge, clip and fill
//! nodata     sentinel repair and remapping
//! scatter    inverse-distance gridding of scattered samples
//! ```
//!
//! # Example
//!
//! ```ignore
//! use flowgrid_common::BoundingBox;
//! use grid_transform::{sample_file, subset};
//! use topo_codec::{read_grid, TopoType};
//!
//! let (grid, _) = read_grid("coast.tt3", TopoType::ZRows)?;
//! let near_shore = subset(&grid, &BoundingBox::new(-120.0, 34.0, -119.0, 35.0));
//! let depths = sample_file("coast.tt3", TopoType::ZRows, &[(-119.5, 34.25)])?;
//! ```

pub mod merge;
pub mod nodata;
pub mod resample;
pub mod sample;
pub mod scatter;
pub mod subset;

pub use merge::{clip_surface, fill_from_secondary, merge, CombineOptions};
pub use nodata::{change_nodata, repair_nodata, RepairMethod};
pub use resample::{refine, refine_file, subsample, subsample_file, RefineTarget};
pub use sample::{bilinear_at, sample_file, sample_grid};
pub use scatter::{grid_from_scatter, grid_from_scatter_file};
pub use subset::{subset, subset_file_streaming};
