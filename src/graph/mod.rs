//! Spatial graph and per-cell chemical state.
//!
//! The simulated volume is a graph of [`Cell`]s. Each cell has a region
//! (cytoplasm, membrane, extracellular) that fixes its subsection layout, a
//! [`ConcentrationContainer`] with the committed state, a pending
//! [`DeltaBuffer`](crate::delta::DeltaBuffer) and an optional polygon
//! footprint used by the adjacency geometry.

mod automaton;
mod cell;
mod container;
mod region;

pub use automaton::{AutomatonGraph, Neighborhood};
pub use cell::{Cell, CellCoordinate};
pub use container::ConcentrationContainer;
pub use region::{CellRegion, CellSubsection, CellTopology};
