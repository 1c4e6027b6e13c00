//! Builders to assemble a cell from configuration.

pub mod cell_builder;

pub use cell_builder::CellBuilder;
