//! Error types for the spatial simulation engine.
//!
//! Configuration errors and unsupported operations are fatal: they abort the
//! current epoch before anything is committed. Geometric degeneracies are not
//! errors; they are logged through the `log` facade and the affected coupling
//! is skipped.

use thiserror::Error;

use crate::chemistry::{ChemicalEntity, FeatureKind, FeatureOwner};
use crate::graph::CellCoordinate;
use crate::vesicle::VesicleId;

/// Unified error type for all simulation operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A coordinate lookup missed the graph.
    #[error("invalid topology: no cell at {0}")]
    InvalidTopology(CellCoordinate),

    /// A module references an entity (or itself) that lacks a required feature.
    #[error("missing feature {kind:?} for {owner}")]
    MissingFeature { owner: FeatureOwner, kind: FeatureKind },

    /// Reactants were assigned contradictory roles.
    #[error("reactant role inconsistency in '{reaction}': {entity} {message}")]
    ReactantRole {
        reaction: String,
        entity: ChemicalEntity,
        message: String,
    },

    /// The requested operation is not implemented for this variant.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid configuration (builders, parameters).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A vesicle lookup missed the vesicle layer.
    #[error("unknown vesicle {0}")]
    UnknownVesicle(VesicleId),
}

impl SimulationError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        SimulationError::Configuration(message.into())
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        SimulationError::Unsupported(message.into())
    }

    /// Whether this error is a configuration problem (never retried).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SimulationError::MissingFeature { .. }
                | SimulationError::ReactantRole { .. }
                | SimulationError::Configuration(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimulationError>;
