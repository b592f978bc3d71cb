//! Displacement modules for vesicles.
//!
//! Brownian motion of a sphere (Stokes-Einstein):
//! D = k_B·T / (6π·η·r)
//! σ = √(2·D·Δt) per axis, Δx = σ·θ with θ ~ N(0, 1)
//!
//! References:
//! - Einstein A (1905) Ann Phys 17:549-560

use std::f64::consts::PI;

use rand::prelude::*;
use rand_distr::StandardNormal;

use super::{Vesicle, VesicleState};
use crate::delta::ModuleId;
use crate::geometry::DVec2;
use crate::modules::EpochScale;

/// Boltzmann constant (J/K)
pub const BOLTZMANN_J_PER_K: f64 = 1.380649e-23;

/// A pluggable source of vesicle displacement proposals.
pub trait DisplacementModule: Send + Sync {
    fn identifier(&self) -> &ModuleId;

    /// Whether the module moves `vesicle` in its current state.
    fn applies_to(&self, vesicle: &Vesicle) -> bool;

    /// Displacement (µm) for one evaluated time step.
    fn propose_displacement(&self, vesicle: &Vesicle, scale: &EpochScale, rng: &mut StdRng) -> DVec2;
}

/// Thermal motion of unattached vesicles.
#[derive(Debug, Clone)]
pub struct BrownianMotion {
    identifier: ModuleId,
    /// Dynamic viscosity of the medium (Pa·s)
    pub viscosity_pa_s: f64,
    /// Absolute temperature (K)
    pub temperature_K: f64,
}

impl BrownianMotion {
    pub fn new(viscosity_pa_s: f64, temperature_K: f64) -> Self {
        Self {
            identifier: ModuleId::new("brownian motion"),
            viscosity_pa_s,
            temperature_K,
        }
    }

    /// Stokes-Einstein diffusivity of a sphere of `radius_um` (µm²/s).
    pub fn diffusivity_um2_per_sec(&self, radius_um: f64) -> f64 {
        let radius_m = radius_um * 1e-6;
        let diffusivity_m2_per_sec =
            BOLTZMANN_J_PER_K * self.temperature_K / (6.0 * PI * self.viscosity_pa_s * radius_m);
        diffusivity_m2_per_sec * 1e12
    }
}

impl Default for BrownianMotion {
    /// Water at body temperature
    fn default() -> Self {
        Self::new(6.9e-4, 310.0)
    }
}

impl DisplacementModule for BrownianMotion {
    fn identifier(&self) -> &ModuleId {
        &self.identifier
    }

    fn applies_to(&self, vesicle: &Vesicle) -> bool {
        vesicle.state() == VesicleState::Unattached
    }

    fn propose_displacement(&self, vesicle: &Vesicle, scale: &EpochScale, rng: &mut StdRng) -> DVec2 {
        let diffusivity = self.diffusivity_um2_per_sec(vesicle.radius_um());
        let sigma = (2.0 * diffusivity * scale.effective_time_step()).sqrt();
        DVec2::new(
            sigma * rng.sample::<f64, _>(StandardNormal),
            sigma * rng.sample::<f64, _>(StandardNormal),
        )
    }
}

/// Constant-velocity transport of vesicles in one attachment state, e.g.
/// motor-driven movement along microtubules.
#[derive(Debug, Clone)]
pub struct DirectedTransport {
    identifier: ModuleId,
    pub state: VesicleState,
    /// Velocity (µm/s)
    pub velocity_um_per_sec: DVec2,
}

impl DirectedTransport {
    pub fn new(identifier: &str, state: VesicleState, velocity_um_per_sec: DVec2) -> Self {
        Self {
            identifier: ModuleId::new(identifier),
            state,
            velocity_um_per_sec,
        }
    }
}

impl DisplacementModule for DirectedTransport {
    fn identifier(&self) -> &ModuleId {
        &self.identifier
    }

    fn applies_to(&self, vesicle: &Vesicle) -> bool {
        vesicle.state() == self.state
    }

    fn propose_displacement(&self, _vesicle: &Vesicle, scale: &EpochScale, _rng: &mut StdRng) -> DVec2 {
        self.velocity_um_per_sec * scale.effective_time_step()
    }
}
