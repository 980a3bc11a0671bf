//! Codec for multi-patch solution frames.
//!
//! A frame number `NNNN` is stored as up to three plain-text files
//! sharing one prefix:
//!
//! ```text
//! fort.tNNNN   frame scalars: time, meqn, ngrids, maux, ndim
//! fort.qNNNN   per-patch sub-header plus dense solution dump
//! fort.aNNNN   auxiliary dump with the same structure (optional;
//!              a frame-independent fort.a is the fallback)
//! ```
//!
//! Every value line carries the value first and a label second, so a
//! reader takes the first whitespace token of each line and ignores
//! the rest.
//!
//! # Example
//!
//! ```ignore
//! use amr_codec::{read_frame, latest_run_frames, FrameReadOptions};
//!
//! let opts = FrameReadOptions::default();
//! for frameno in latest_run_frames("_output", &opts.prefix)? {
//!     let frame = read_frame("_output", frameno, &opts)?;
//!     println!("t = {} with {} patches", frame.time, frame.ngrids());
//! }
//! ```

pub mod discover;
pub mod frame;
mod paths;
pub mod read;
pub mod write;

pub use discover::{available_frames, for_each_frame, latest_run_frames};
pub use frame::{AmrFrame, Patch, PatchData, PatchDim};
pub use read::{read_frame, read_frame_time, FrameReadOptions};
pub use write::{write_frame, FrameWriteOptions};
