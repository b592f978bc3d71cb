//! Cell Automaton X - spatial reaction-diffusion engine with vesicle agents
//!
//! Space is a graph of cells with polygon footprints and per-compartment
//! concentration pools. Modules (diffusion, membrane transport, reactions)
//! read the state committed at the end of the previous epoch and propose
//! deltas; the deltas are committed together at the end of the epoch.
//! Vesicles move continuously on top of the grid and exchange cargo with the
//! cells they overlap.

// Unit suffixes in names (grid_M, temperature_K)
#![allow(non_snake_case)]

pub mod adjacency;
pub mod chemistry;
pub mod config;
pub mod delta;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod modules;
pub mod simulation;
pub mod units;
pub mod vesicle;

pub use adjacency::{apply_diffusive_ratio, initialize_area_mappings, AreaMapping, MappingId};
pub use chemistry::{ChemicalEntity, Feature, FeatureKind, FeatureOwner, FeatureRegistry};
pub use config::SimulationParameters;
pub use delta::{ConcentrationDelta, DeltaBuffer, ModuleId};
pub use error::{Result, SimulationError};
pub use graph::{
    AutomatonGraph, Cell, CellCoordinate, CellRegion, CellSubsection, CellTopology,
    ConcentrationContainer, Neighborhood,
};
pub use modules::{
    ComplexBuildingRule, Diffusion, EpochContext, EpochScale, MembraneDiffusion, Proposal,
    Reactant, ReactantRole, Reaction, ReactionKinetics, UpdateModule,
};
pub use simulation::{IntegrationScheme, Simulation, SimulationClock, SimulationMetrics};
pub use vesicle::{
    associate_vesicle, BrownianMotion, DirectedTransport, DisplacementModule, Vesicle, VesicleId,
    VesicleLayer, VesicleState,
};
