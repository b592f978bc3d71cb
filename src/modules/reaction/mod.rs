//! Chemical reactions inside cells and vesicles.
//!
//! A reaction is a set of reactants with roles plus a rate law. Per evaluated
//! container the reactants are resolved to concrete subsections (a
//! "reactant set"); complex-building reactions generate their sets from the
//! current pool instead. A container without any set contributes nothing.
//!
//! Deltas per set, with the velocity `v` in concentration per time step:
//!
//! ```text
//! substrate −= n · v
//! product   += n · v
//! ```
//!
//! Catalysts enter the velocity but are not consumed.

mod builder;
mod complex;
mod kinetics;

pub use builder::ReactionBuilder;
pub use complex::ComplexBuildingRule;
pub use kinetics::{mass_action_term, michaelis_menten, reversible_velocity, ReactionKinetics};

use super::{propose_per_cell, propose_per_vesicle, EpochContext, Proposal, UpdateModule};
use crate::chemistry::{ChemicalEntity, Feature, FeatureKind, FeatureOwner, FeatureRegistry};
use crate::delta::{ConcentrationDelta, ModuleId};
use crate::error::{Result, SimulationError};
use crate::graph::{Cell, CellSubsection, CellTopology, ConcentrationContainer};
use crate::vesicle::Vesicle;

/// Role of a reactant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactantRole {
    Substrate,
    Product,
    Catalyst,
}

/// A participant of a reaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Reactant {
    pub entity: ChemicalEntity,
    pub role: ReactantRole,
    pub stoichiometric_number: f64,
    /// Exponent of the concentration in mass-action terms
    pub reaction_order: f64,
    /// Preferred topology; anchored entities default to the membrane, all
    /// others to the inner and then the outer pool
    pub topology: Option<CellTopology>,
}

impl Reactant {
    pub fn new(entity: ChemicalEntity, role: ReactantRole) -> Self {
        Self {
            entity,
            role,
            stoichiometric_number: 1.0,
            reaction_order: 1.0,
            topology: None,
        }
    }

    pub fn substrate(entity: ChemicalEntity) -> Self {
        Self::new(entity, ReactantRole::Substrate)
    }

    pub fn product(entity: ChemicalEntity) -> Self {
        Self::new(entity, ReactantRole::Product)
    }

    pub fn catalyst(entity: ChemicalEntity) -> Self {
        Self::new(entity, ReactantRole::Catalyst)
    }

    pub fn with_stoichiometry(mut self, stoichiometric_number: f64) -> Self {
        self.stoichiometric_number = stoichiometric_number;
        self
    }

    pub fn with_order(mut self, reaction_order: f64) -> Self {
        self.reaction_order = reaction_order;
        self
    }

    pub fn in_topology(mut self, topology: CellTopology) -> Self {
        self.topology = Some(topology);
        self
    }

    /// Subsection of `container` this reactant lives in, if any.
    pub fn resolve(&self, container: &ConcentrationContainer) -> Option<CellSubsection> {
        match self.topology {
            Some(topology) => container.subsection_for(topology),
            None if self.entity.is_membrane_anchored() => {
                container.subsection_for(CellTopology::Membrane)
            }
            None => container
                .subsection_for(CellTopology::Inner)
                .or_else(|| container.subsection_for(CellTopology::Outer)),
        }
    }
}

/// A reactant bound to a concrete subsection.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedReactant {
    pub(crate) entity: ChemicalEntity,
    pub(crate) subsection: CellSubsection,
    pub(crate) stoichiometric_number: f64,
    pub(crate) reaction_order: f64,
}

impl ResolvedReactant {
    pub(crate) fn single(entity: ChemicalEntity, subsection: CellSubsection) -> Self {
        Self {
            entity,
            subsection,
            stoichiometric_number: 1.0,
            reaction_order: 1.0,
        }
    }

    fn concentration(&self, container: &ConcentrationContainer) -> f64 {
        container.get(self.subsection, &self.entity)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct ReactantSet {
    pub(crate) substrates: Vec<ResolvedReactant>,
    pub(crate) products: Vec<ResolvedReactant>,
    pub(crate) catalysts: Vec<ResolvedReactant>,
}

impl ReactantSet {
    fn term(reactants: &[ResolvedReactant], container: &ConcentrationContainer) -> f64 {
        mass_action_term(
            reactants
                .iter()
                .map(|r| (r.concentration(container), r.reaction_order)),
        )
    }
}

/// Rate constants resolved and scaled for one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ScaledRates {
    Single(f64),
    Pair { forward: f64, backward: f64 },
    Enzyme { turnover: f64, michaelis_constant: f64 },
}

#[derive(Debug, Clone)]
pub struct Reaction {
    identifier: ModuleId,
    kinetics: ReactionKinetics,
    reactants: Vec<Reactant>,
    include_vesicles: bool,
}

impl Reaction {
    pub fn builder() -> ReactionBuilder {
        ReactionBuilder::default()
    }

    pub fn kinetics(&self) -> &ReactionKinetics {
        &self.kinetics
    }

    pub fn reactants(&self) -> &[Reactant] {
        &self.reactants
    }

    pub fn substrates(&self) -> impl Iterator<Item = &Reactant> {
        self.reactants
            .iter()
            .filter(|r| r.role == ReactantRole::Substrate)
    }

    pub fn products(&self) -> impl Iterator<Item = &Reactant> {
        self.reactants
            .iter()
            .filter(|r| r.role == ReactantRole::Product)
    }

    pub fn catalysts(&self) -> impl Iterator<Item = &Reactant> {
        self.reactants
            .iter()
            .filter(|r| r.role == ReactantRole::Catalyst)
    }

    pub fn includes_vesicles(&self) -> bool {
        self.include_vesicles
    }

    /// The reverse reaction: substrates and products swap and the new
    /// identifier receives swapped forward and backward rate constants.
    ///
    /// Only reversible reactions can be inverted.
    pub fn inverted(&self, features: &mut FeatureRegistry) -> Result<Reaction> {
        if self.kinetics != ReactionKinetics::Reversible {
            return Err(SimulationError::unsupported(format!(
                "cannot invert '{}' with {:?} kinetics",
                self.identifier, self.kinetics
            )));
        }
        let owner = FeatureOwner::from(&self.identifier);
        let forward = features
            .require(&owner, FeatureKind::ForwardsRateConstant)?
            .clone();
        let backward = features
            .require(&owner, FeatureKind::BackwardsRateConstant)?
            .clone();

        let identifier = ModuleId::new(&format!("{} (inverted)", self.identifier));
        features.set_feature(
            &identifier,
            Feature {
                kind: FeatureKind::ForwardsRateConstant,
                ..backward
            },
        );
        features.set_feature(
            &identifier,
            Feature {
                kind: FeatureKind::BackwardsRateConstant,
                ..forward
            },
        );

        let reactants = self
            .reactants
            .iter()
            .cloned()
            .map(|mut reactant| {
                reactant.role = match reactant.role {
                    ReactantRole::Substrate => ReactantRole::Product,
                    ReactantRole::Product => ReactantRole::Substrate,
                    ReactantRole::Catalyst => ReactantRole::Catalyst,
                };
                reactant
            })
            .collect();

        Ok(Reaction {
            identifier,
            kinetics: ReactionKinetics::Reversible,
            reactants,
            include_vesicles: self.include_vesicles,
        })
    }

    fn scaled_rates(&self, context: &EpochContext<'_>) -> Result<ScaledRates> {
        let owner = FeatureOwner::from(&self.identifier);
        let rate = |kind| context.scaled_feature(&owner, kind);
        Ok(match self.kinetics {
            ReactionKinetics::Irreversible => ScaledRates::Single(rate(FeatureKind::RateConstant)?),
            ReactionKinetics::Reversible | ReactionKinetics::ComplexBuilding(_) => ScaledRates::Pair {
                forward: rate(FeatureKind::ForwardsRateConstant)?,
                backward: rate(FeatureKind::BackwardsRateConstant)?,
            },
            ReactionKinetics::MichaelisMenten => ScaledRates::Enzyme {
                turnover: rate(FeatureKind::TurnoverNumber)?,
                michaelis_constant: rate(FeatureKind::MichaelisConstant)?,
            },
        })
    }

    /// Reactant sets available in `container`.
    pub(crate) fn reactant_sets(&self, container: &ConcentrationContainer) -> Vec<ReactantSet> {
        if let ReactionKinetics::ComplexBuilding(rule) = &self.kinetics {
            return rule.reactant_sets(container);
        }

        let mut set = ReactantSet::default();
        for reactant in &self.reactants {
            let Some(subsection) = reactant.resolve(container) else {
                return Vec::new();
            };
            let resolved = ResolvedReactant {
                entity: reactant.entity.clone(),
                subsection,
                stoichiometric_number: reactant.stoichiometric_number,
                reaction_order: reactant.reaction_order,
            };
            match reactant.role {
                ReactantRole::Substrate => set.substrates.push(resolved),
                ReactantRole::Product => set.products.push(resolved),
                ReactantRole::Catalyst => set.catalysts.push(resolved),
            }
        }
        vec![set]
    }

    fn velocity(set: &ReactantSet, container: &ConcentrationContainer, rates: ScaledRates) -> f64 {
        let catalysis = ReactantSet::term(&set.catalysts, container);
        match rates {
            ScaledRates::Single(rate) => rate * ReactantSet::term(&set.substrates, container) * catalysis,
            ScaledRates::Pair { forward, backward } => reversible_velocity(
                forward,
                ReactantSet::term(&set.substrates, container) * catalysis,
                backward,
                ReactantSet::term(&set.products, container) * catalysis,
            ),
            ScaledRates::Enzyme {
                turnover,
                michaelis_constant,
            } => {
                let (Some(enzyme), Some(substrate)) = (set.catalysts.first(), set.substrates.first()) else {
                    return 0.0;
                };
                michaelis_menten(
                    turnover * enzyme.concentration(container),
                    michaelis_constant,
                    substrate.concentration(container),
                )
            }
        }
    }

    /// Concentration changes of one container over one evaluated step.
    fn container_deltas(
        &self,
        container: &ConcentrationContainer,
        rates: ScaledRates,
    ) -> Vec<ConcentrationDelta> {
        let mut deltas = Vec::new();
        for set in self.reactant_sets(container) {
            let velocity = Self::velocity(&set, container, rates);
            if velocity == 0.0 || !velocity.is_finite() {
                continue;
            }
            let signed = set
                .substrates
                .iter()
                .map(|r| (r, -velocity))
                .chain(set.products.iter().map(|r| (r, velocity)));
            for (reactant, signed_velocity) in signed {
                deltas.push(ConcentrationDelta::new(
                    self.identifier.clone(),
                    reactant.subsection,
                    reactant.entity.clone(),
                    reactant.stoichiometric_number * signed_velocity,
                ));
            }
        }
        deltas
    }
}

impl UpdateModule for Reaction {
    fn identifier(&self) -> &ModuleId {
        &self.identifier
    }

    fn required_features(&self) -> Vec<(FeatureOwner, FeatureKind)> {
        self.kinetics
            .required_feature_kinds()
            .iter()
            .map(|kind| (FeatureOwner::from(&self.identifier), *kind))
            .collect()
    }

    fn applies_to_cell(&self, _cell: &Cell) -> bool {
        true
    }

    fn applies_to_vesicle(&self, _vesicle: &Vesicle) -> bool {
        self.include_vesicles
    }

    fn propose(&self, context: &EpochContext<'_>) -> Result<Vec<Proposal>> {
        let rates = self.scaled_rates(context)?;

        let mut proposals = propose_per_cell(self, context, |cell| {
            Ok(self
                .container_deltas(&cell.concentrations, rates)
                .into_iter()
                .map(|delta| Proposal::cell(cell.coordinate(), delta))
                .collect())
        })?;
        proposals.extend(propose_per_vesicle(self, context, |vesicle| {
            Ok(self
                .container_deltas(&vesicle.concentrations, rates)
                .into_iter()
                .map(|delta| Proposal::vesicle(vesicle.id(), delta))
                .collect())
        })?);
        Ok(proposals)
    }
}
