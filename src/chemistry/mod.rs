//! Chemical-entity collaborator.
//!
//! Entities are opaque handles; their physical features (diffusivity,
//! permeability, rate constants) are resolved through a [`FeatureRegistry`]
//! owned by the simulation instance.

mod entity;
mod features;

pub use entity::{ChemicalEntity, EntityKind};
pub use features::{Feature, FeatureKind, FeatureOwner, FeatureRegistry};
