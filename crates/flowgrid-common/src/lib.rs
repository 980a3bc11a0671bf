//! Common types and utilities shared across the flowgrid crates.

pub mod bbox;
pub mod error;
pub mod fmt;
pub mod grid2;
pub mod tokens;

pub use bbox::BoundingBox;
pub use error::{FlowgridError, FlowgridResult};
pub use grid2::Grid2;
pub use tokens::TokenReader;
