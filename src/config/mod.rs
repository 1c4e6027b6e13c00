//! Configuration models for a cell.

pub mod cell;

pub use cell::CellConfig;
