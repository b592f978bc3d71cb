//! Physical features and the registry that resolves them.
//!
//! The registry is an explicit context object owned by the simulation. Modules
//! declare which (owner, kind) pairs they need; missing entries are fatal
//! configuration errors.

use std::collections::HashMap;
use std::fmt;

use super::ChemicalEntity;
use crate::delta::ModuleId;
use crate::error::{Result, SimulationError};
use crate::units::{per_minute_to_per_second, CM_TO_UM, MOLE_PER_LITRE};

/// Kinds of physical features a module can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    /// Diffusivity (µm²/s)
    Diffusivity,
    /// Membrane permeability (µm/s)
    MembranePermeability,
    /// Rate constant of an irreversible reaction
    RateConstant,
    /// Forward rate constant of a reversible reaction
    ForwardsRateConstant,
    /// Backward rate constant of a reversible reaction
    BackwardsRateConstant,
    /// Enzyme turnover number kcat (1/s)
    TurnoverNumber,
    /// Michaelis constant Km (mol/µm³)
    MichaelisConstant,
}

impl FeatureKind {
    /// Exponent of the node distance the feature is divided by when scaled.
    pub fn length_exponent(&self) -> i32 {
        match self {
            FeatureKind::Diffusivity => 2,
            FeatureKind::MembranePermeability => 1,
            _ => 0,
        }
    }

    /// Whether the feature is a rate that gets multiplied by the time step.
    pub fn is_time_scaled(&self) -> bool {
        !matches!(self, FeatureKind::MichaelisConstant)
    }
}

/// The "entity or module" a feature is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureOwner {
    Entity(ChemicalEntity),
    Module(ModuleId),
}

impl From<&ChemicalEntity> for FeatureOwner {
    fn from(entity: &ChemicalEntity) -> Self {
        FeatureOwner::Entity(entity.clone())
    }
}

impl From<&ModuleId> for FeatureOwner {
    fn from(module: &ModuleId) -> Self {
        FeatureOwner::Module(module.clone())
    }
}

impl fmt::Display for FeatureOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureOwner::Entity(entity) => write!(f, "entity '{}'", entity),
            FeatureOwner::Module(module) => write!(f, "module '{}'", module),
        }
    }
}

/// A physical feature in internal units with an optional literature source.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub kind: FeatureKind,
    /// Value in internal units (µm, s, mol/µm³)
    pub value: f64,
    pub source: Option<String>,
}

impl Feature {
    pub fn new(kind: FeatureKind, value: f64) -> Self {
        Self { kind, value, source: None }
    }

    /// Attach a citation.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Diffusivity given in cm²/s.
    pub fn diffusivity_cm2_per_sec(value: f64) -> Self {
        Self::new(FeatureKind::Diffusivity, value * CM_TO_UM * CM_TO_UM)
    }

    /// Diffusivity given in µm²/s.
    pub fn diffusivity_um2_per_sec(value: f64) -> Self {
        Self::new(FeatureKind::Diffusivity, value)
    }

    /// Membrane permeability given in cm/s.
    pub fn permeability_cm_per_sec(value: f64) -> Self {
        Self::new(FeatureKind::MembranePermeability, value * CM_TO_UM)
    }

    /// First-order rate constant given per second.
    pub fn first_order_rate_per_sec(kind: FeatureKind, value: f64) -> Self {
        Self::new(kind, value)
    }

    /// First-order rate constant given per minute.
    pub fn first_order_rate_per_minute(kind: FeatureKind, value: f64) -> Self {
        Self::new(kind, per_minute_to_per_second(value))
    }

    /// Second-order rate constant given in 1/(mol/L · s).
    pub fn second_order_rate_per_molar_sec(kind: FeatureKind, value: f64) -> Self {
        Self::new(kind, value / MOLE_PER_LITRE)
    }

    /// Second-order rate constant given in 1/(mol/L · min).
    pub fn second_order_rate_per_molar_minute(kind: FeatureKind, value: f64) -> Self {
        Self::new(kind, per_minute_to_per_second(value) / MOLE_PER_LITRE)
    }

    /// Michaelis constant given in mol/L.
    pub fn michaelis_constant_molar(value: f64) -> Self {
        Self::new(FeatureKind::MichaelisConstant, value * MOLE_PER_LITRE)
    }
}

/// Registry of features keyed by owner and kind.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: HashMap<(FeatureOwner, FeatureKind), Feature>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a feature.
    pub fn set_feature(&mut self, owner: impl Into<FeatureOwner>, feature: Feature) {
        let owner = owner.into();
        log::debug!("Feature {:?} = {:e} set for {}", feature.kind, feature.value, owner);
        self.features.insert((owner, feature.kind), feature);
    }

    pub fn has_feature(&self, owner: &FeatureOwner, kind: FeatureKind) -> bool {
        self.features.contains_key(&(owner.clone(), kind))
    }

    pub fn feature(&self, owner: &FeatureOwner, kind: FeatureKind) -> Option<&Feature> {
        self.features.get(&(owner.clone(), kind))
    }

    /// Resolve a feature or fail with [`SimulationError::MissingFeature`].
    pub fn require(&self, owner: &FeatureOwner, kind: FeatureKind) -> Result<&Feature> {
        self.feature(owner, kind).ok_or_else(|| SimulationError::MissingFeature {
            owner: owner.clone(),
            kind,
        })
    }

    /// Check a list of requirements, failing on the first missing one.
    pub fn check(&self, requirements: &[(FeatureOwner, FeatureKind)]) -> Result<()> {
        for (owner, kind) in requirements {
            self.require(owner, *kind)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permeability_conversion() {
        let feature = Feature::permeability_cm_per_sec(3.5e-3);
        assert!((feature.value - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_second_order_per_minute_conversion() {
        let feature =
            Feature::second_order_rate_per_molar_minute(FeatureKind::ForwardsRateConstant, 2.4e8);
        // 2.4e8 / 60 = 4e6 L/(mol s) = 4e21 µm³/(mol s)
        assert!((feature.value / 4e21 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_feature_is_configuration_error() {
        let registry = FeatureRegistry::new();
        let owner = FeatureOwner::Entity(ChemicalEntity::small_molecule("X"));
        let err = registry.require(&owner, FeatureKind::Diffusivity).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_set_and_resolve() {
        let mut registry = FeatureRegistry::new();
        let glucose = ChemicalEntity::small_molecule("glucose");
        registry.set_feature(&glucose, Feature::diffusivity_um2_per_sec(600.0));

        let owner = FeatureOwner::from(&glucose);
        assert!(registry.has_feature(&owner, FeatureKind::Diffusivity));
        assert!(!registry.has_feature(&owner, FeatureKind::MembranePermeability));
        assert_eq!(registry.require(&owner, FeatureKind::Diffusivity).unwrap().value, 600.0);
    }
}
