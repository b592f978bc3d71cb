//! Mobile vesicle agents.
//!
//! Vesicles carry their own cargo container and move continuously in the
//! plane. Each epoch, displacement modules propose moves, the collision gate
//! rejects illegal ones and the rest are committed. Chemical exchange with
//! the grid goes through the vesicle's association weights.

mod association;
mod collision;
mod layer;
mod motility;
#[allow(clippy::module_inception)]
mod vesicle;

pub use association::associate_vesicle;
pub use collision::Confinement;
pub use layer::{VesicleLayer, DEFAULT_MEMBRANE_MARGIN_UM};
pub use motility::{BrownianMotion, DirectedTransport, DisplacementModule, BOLTZMANN_J_PER_K};
pub use vesicle::{DisplacementDelta, Vesicle, VesicleId, VesicleState};
