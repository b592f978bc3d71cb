use super::{ComplexBuildingRule, Reactant, ReactantRole, Reaction, ReactionKinetics};
use crate::chemistry::ChemicalEntity;
use crate::delta::ModuleId;
use crate::error::{Result, SimulationError};
use crate::graph::CellTopology;

/// Setters may be called in any order; everything is validated in
/// [`ReactionBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct ReactionBuilder {
    identifier: Option<String>,
    kinetics: Option<ReactionKinetics>,
    reactants: Vec<Reactant>,
    include_vesicles: bool,
}

impl ReactionBuilder {
    /// Identifier under which the rate constants are registered.
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn kinetics(mut self, kinetics: ReactionKinetics) -> Self {
        self.kinetics = Some(kinetics);
        self
    }

    pub fn irreversible(self) -> Self {
        self.kinetics(ReactionKinetics::Irreversible)
    }

    pub fn reversible(self) -> Self {
        self.kinetics(ReactionKinetics::Reversible)
    }

    pub fn michaelis_menten(self) -> Self {
        self.kinetics(ReactionKinetics::MichaelisMenten)
    }

    pub fn complex_building(self, rule: ComplexBuildingRule) -> Self {
        self.kinetics(ReactionKinetics::ComplexBuilding(rule))
    }

    pub fn reactant(mut self, reactant: Reactant) -> Self {
        self.reactants.push(reactant);
        self
    }

    pub fn substrate(self, entity: ChemicalEntity) -> Self {
        self.reactant(Reactant::substrate(entity))
    }

    pub fn substrate_with(self, entity: ChemicalEntity, stoichiometric_number: f64) -> Self {
        self.reactant(Reactant::substrate(entity).with_stoichiometry(stoichiometric_number))
    }

    pub fn product(self, entity: ChemicalEntity) -> Self {
        self.reactant(Reactant::product(entity))
    }

    pub fn product_with(self, entity: ChemicalEntity, stoichiometric_number: f64) -> Self {
        self.reactant(Reactant::product(entity).with_stoichiometry(stoichiometric_number))
    }

    pub fn catalyst(self, entity: ChemicalEntity) -> Self {
        self.reactant(Reactant::catalyst(entity))
    }

    /// Also evaluate the reaction inside vesicle lumens and membranes.
    pub fn include_vesicles(mut self, include: bool) -> Self {
        self.include_vesicles = include;
        self
    }

    pub fn build(self) -> Result<Reaction> {
        let identifier = self
            .identifier
            .ok_or_else(|| SimulationError::config("reaction needs an identifier"))?;
        let kinetics = self.kinetics.unwrap_or(ReactionKinetics::Irreversible);

        for reactant in &self.reactants {
            validate_numbers(&identifier, reactant)?;
            validate_topology(&identifier, reactant)?;
        }
        validate_roles(&identifier, &self.reactants)?;

        let count = |role| self.reactants.iter().filter(|r| r.role == role).count();
        let substrates = count(ReactantRole::Substrate);
        let products = count(ReactantRole::Product);
        let catalysts = count(ReactantRole::Catalyst);

        match &kinetics {
            ReactionKinetics::ComplexBuilding(_) if !self.reactants.is_empty() => {
                return Err(SimulationError::config(format!(
                    "complex building reaction '{}' generates its own reactants",
                    identifier
                )));
            }
            ReactionKinetics::ComplexBuilding(_) => {}
            ReactionKinetics::MichaelisMenten if substrates != 1 || catalysts != 1 => {
                return Err(SimulationError::config(format!(
                    "Michaelis-Menten reaction '{}' needs exactly one substrate and one enzyme, got {} and {}",
                    identifier, substrates, catalysts
                )));
            }
            ReactionKinetics::Reversible if products == 0 => {
                return Err(SimulationError::config(format!(
                    "reversible reaction '{}' needs at least one product",
                    identifier
                )));
            }
            _ if substrates == 0 => {
                return Err(SimulationError::config(format!(
                    "reaction '{}' needs at least one substrate",
                    identifier
                )));
            }
            _ => {}
        }

        log::debug!(
            "Built reaction '{}' ({:?}, {} reactants)",
            identifier,
            kinetics,
            self.reactants.len()
        );
        Ok(Reaction {
            identifier: ModuleId::new(&identifier),
            kinetics,
            reactants: self.reactants,
            include_vesicles: self.include_vesicles,
        })
    }
}

fn role_error(reaction: &str, entity: &ChemicalEntity, message: impl Into<String>) -> SimulationError {
    SimulationError::ReactantRole {
        reaction: reaction.to_string(),
        entity: entity.clone(),
        message: message.into(),
    }
}

fn validate_numbers(reaction: &str, reactant: &Reactant) -> Result<()> {
    if !(reactant.stoichiometric_number.is_finite() && reactant.stoichiometric_number > 0.0) {
        return Err(SimulationError::config(format!(
            "stoichiometric number of {} in '{}' must be positive, got {}",
            reactant.entity, reaction, reactant.stoichiometric_number
        )));
    }
    if !(reactant.reaction_order.is_finite() && reactant.reaction_order >= 0.0) {
        return Err(SimulationError::config(format!(
            "reaction order of {} in '{}' must be non-negative, got {}",
            reactant.entity, reaction, reactant.reaction_order
        )));
    }
    Ok(())
}

fn validate_topology(reaction: &str, reactant: &Reactant) -> Result<()> {
    match reactant.topology {
        Some(topology) if reactant.entity.is_membrane_anchored() && topology != CellTopology::Membrane => {
            Err(role_error(
                reaction,
                &reactant.entity,
                format!("is membrane anchored but placed in the {:?} topology", topology),
            ))
        }
        _ => Ok(()),
    }
}

/// The same entity in the same topology may appear once only.
fn validate_roles(reaction: &str, reactants: &[Reactant]) -> Result<()> {
    for (index, reactant) in reactants.iter().enumerate() {
        for other in &reactants[index + 1..] {
            if other.entity != reactant.entity || other.topology != reactant.topology {
                continue;
            }
            let message = match (reactant.role, other.role) {
                (a, b) if a == b => format!("is listed twice as {:?}", a),
                (ReactantRole::Catalyst, role) | (role, ReactantRole::Catalyst) => {
                    format!("is both catalyst and {:?}", role)
                }
                _ => "is both consumed and produced".to_string(),
            };
            return Err(role_error(reaction, &reactant.entity, message));
        }
    }
    Ok(())
}
