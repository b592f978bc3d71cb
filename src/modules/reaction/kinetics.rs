//! Rate laws.
//!
//! All velocities are returned in concentration per evaluated time step: the
//! rate constants passed in are already scaled to the epoch.
//!
//! References:
//! - Michaelis L, Menten ML (1913) Biochem Z 49:333-369

use super::complex::ComplexBuildingRule;
use crate::chemistry::FeatureKind;

/// Rate law of a reaction.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactionKinetics {
    /// Mass action with a single rate constant
    Irreversible,
    /// Mass action with forward and backward rate constants
    Reversible,
    /// Saturating enzyme kinetics; the catalyst is the enzyme
    MichaelisMenten,
    /// Reversible binding with reactant sets generated from the current pool
    ComplexBuilding(ComplexBuildingRule),
}

impl ReactionKinetics {
    /// Features the reaction must carry under its own identifier.
    pub fn required_feature_kinds(&self) -> &'static [FeatureKind] {
        match self {
            ReactionKinetics::Irreversible => &[FeatureKind::RateConstant],
            ReactionKinetics::Reversible | ReactionKinetics::ComplexBuilding(_) => &[
                FeatureKind::ForwardsRateConstant,
                FeatureKind::BackwardsRateConstant,
            ],
            ReactionKinetics::MichaelisMenten => {
                &[FeatureKind::TurnoverNumber, FeatureKind::MichaelisConstant]
            }
        }
    }

    pub fn is_reversible(&self) -> bool {
        matches!(
            self,
            ReactionKinetics::Reversible | ReactionKinetics::ComplexBuilding(_)
        )
    }
}

/// Product of concentrations raised to their reaction orders.
///
/// Negative concentrations count as zero.
pub fn mass_action_term<I>(concentrations: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    concentrations
        .into_iter()
        .map(|(concentration, order)| concentration.max(0.0).powf(order))
        .product()
}

/// v = k_f · Π[S]^o − k_b · Π[P]^o
pub fn reversible_velocity(forward: f64, substrate_term: f64, backward: f64, product_term: f64) -> f64 {
    forward * substrate_term - backward * product_term
}

/// Simple Michaelis-Menten kinetics
///
/// v = Vmax * [S] / (Km + [S]) with Vmax = kcat * [E]
pub fn michaelis_menten(vmax: f64, km: f64, substrate: f64) -> f64 {
    if substrate <= 0.0 {
        return 0.0;
    }
    vmax * substrate / (km + substrate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_michaelis_menten_half_saturation() {
        let v = michaelis_menten(2.0, 0.5, 0.5);
        assert!((v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_michaelis_menten_zero_substrate() {
        assert_eq!(michaelis_menten(2.0, 0.5, 0.0), 0.0);
        assert_eq!(michaelis_menten(2.0, 0.5, -1.0), 0.0);
    }

    #[test]
    fn test_mass_action_orders() {
        let term = mass_action_term([(2.0, 2.0), (3.0, 1.0)]);
        assert!((term - 12.0).abs() < 1e-12);
        assert_eq!(mass_action_term([(-1.0, 1.0)]), 0.0);
        // empty product is one
        assert_eq!(mass_action_term(std::iter::empty()), 1.0);
    }

    #[test]
    fn test_reversible_equilibrium_is_zero() {
        // K = kf / kb = [P] / [S]
        let v = reversible_velocity(4.0, 1.0, 2.0, 2.0);
        assert_eq!(v, 0.0);
    }
}
