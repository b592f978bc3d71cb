//! Configuration module for loading simulation parameters.

mod parameters;

pub use parameters::{SimulationParameters, SpatialParameters, TimeParameters, VesicleParameters};
