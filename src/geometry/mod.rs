//! Boxes, grids, and block-alignment arithmetic.

pub mod box3;
pub mod grid;

pub use box3::Box3;
pub use grid::{slabs_from_box, Grid};
