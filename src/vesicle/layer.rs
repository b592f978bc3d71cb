//! The vesicle layer: all vesicles of a simulation plus the obstacles they
//! collide with.

use std::collections::BTreeMap;

use rand::prelude::*;

use super::collision::{self, Confinement, Obstacles};
use super::{associate_vesicle, DisplacementDelta, DisplacementModule, Vesicle, VesicleId, VesicleState};
use crate::error::{Result, SimulationError};
use crate::geometry::{Bounds, DVec2, LineSegment, Polygon};
use crate::graph::{AutomatonGraph, CellCoordinate};
use crate::modules::EpochScale;

/// Default safety margin between vesicles and membranes (µm).
pub const DEFAULT_MEMBRANE_MARGIN_UM: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct VesicleLayer {
    vesicles: Vec<Vesicle>,
    next_identifier: u32,
    bounds: Option<Bounds>,
    membranes: Vec<LineSegment>,
    confinements: Vec<Confinement>,
    membrane_margin_um: f64,
    rng: StdRng,
}

impl Default for VesicleLayer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl VesicleLayer {
    /// Empty layer whose tie-breaks are drawn from a generator seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            vesicles: Vec::new(),
            next_identifier: 0,
            bounds: None,
            membranes: Vec::new(),
            confinements: Vec::new(),
            membrane_margin_um: DEFAULT_MEMBRANE_MARGIN_UM,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = Some(bounds);
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn add_membrane_segment(&mut self, segment: LineSegment) {
        self.membranes.push(segment);
    }

    pub fn membrane_segments(&self) -> &[LineSegment] {
        &self.membranes
    }

    pub fn set_membrane_margin(&mut self, margin_um: f64) {
        self.membrane_margin_um = margin_um;
    }

    /// Keep vesicles in `state` inside `region`.
    pub fn add_confinement(&mut self, state: VesicleState, region: Polygon) {
        self.confinements.push(Confinement::new(state, region));
    }

    /// Place a new vesicle; its cargo starts empty.
    pub fn add_vesicle(&mut self, position: DVec2, radius_um: f64) -> Result<VesicleId> {
        if !(radius_um.is_finite() && radius_um > 0.0) {
            return Err(SimulationError::config(format!(
                "vesicle radius must be positive, got {}",
                radius_um
            )));
        }
        if let Some(bounds) = &self.bounds {
            if !bounds.contains_circle(position, radius_um) {
                return Err(SimulationError::config(format!(
                    "vesicle at {} with radius {} µm does not fit the simulation bounds",
                    position, radius_um
                )));
            }
        }
        let id = VesicleId(self.next_identifier);
        self.next_identifier += 1;
        self.vesicles.push(Vesicle::new(id, position, radius_um));
        log::debug!("Added {} at {}", id, position);
        Ok(id)
    }

    pub fn remove_vesicle(&mut self, id: VesicleId) -> Result<Vesicle> {
        let index = self.index_of(id)?;
        log::debug!("Removed {}", id);
        Ok(self.vesicles.remove(index))
    }

    fn index_of(&self, id: VesicleId) -> Result<usize> {
        self.vesicles
            .iter()
            .position(|vesicle| vesicle.id() == id)
            .ok_or(SimulationError::UnknownVesicle(id))
    }

    pub fn vesicle(&self, id: VesicleId) -> Result<&Vesicle> {
        let index = self.index_of(id)?;
        Ok(&self.vesicles[index])
    }

    pub fn vesicle_mut(&mut self, id: VesicleId) -> Result<&mut Vesicle> {
        let index = self.index_of(id)?;
        Ok(&mut self.vesicles[index])
    }

    pub fn vesicles(&self) -> impl Iterator<Item = &Vesicle> {
        self.vesicles.iter()
    }

    pub(crate) fn vesicle_slice(&self) -> &[Vesicle] {
        &self.vesicles
    }

    pub fn len(&self) -> usize {
        self.vesicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vesicles.is_empty()
    }

    /// Collect displacement proposals and compute tentative positions.
    pub fn propose_displacements(&mut self, modules: &[Box<dyn DisplacementModule>], scale: &EpochScale) {
        for vesicle in &mut self.vesicles {
            for module in modules {
                if !module.applies_to(vesicle) {
                    continue;
                }
                let displacement = module.propose_displacement(vesicle, scale, &mut self.rng);
                vesicle.add_potential_displacement_delta(DisplacementDelta::new(
                    module.identifier().clone(),
                    displacement,
                ));
            }
            vesicle.calculate_total_displacement();
        }
    }

    /// Reject illegal tentative positions. Returns the number of rejections.
    pub fn resolve_collisions(&mut self) -> usize {
        let obstacles = Obstacles {
            bounds: self.bounds.as_ref(),
            membranes: &self.membranes,
            confinements: &self.confinements,
            margin_um: self.membrane_margin_um,
        };
        collision::resolve(&mut self.vesicles, obstacles, &mut self.rng)
    }

    /// Move every vesicle to its tentative position. Returns how many moved.
    pub fn commit_positions(&mut self) -> usize {
        let mut moved = 0;
        for vesicle in &mut self.vesicles {
            if vesicle.is_moving() {
                moved += 1;
            }
            vesicle.update_position();
        }
        moved
    }

    /// Drop this epoch's displacement proposals without moving.
    pub fn discard_displacements(&mut self) {
        for vesicle in &mut self.vesicles {
            vesicle.clear_potential_displacement_deltas();
            vesicle.reset_next_position();
        }
    }

    /// Recompute associations of vesicles that moved (or all of them).
    pub fn associate(&mut self, graph: &AutomatonGraph, all: bool) -> usize {
        let mut updated = 0;
        for vesicle in &mut self.vesicles {
            if all || vesicle.needs_association() {
                let cells = associate_vesicle(graph, vesicle);
                vesicle.set_associated_cells(cells);
                updated += 1;
            }
        }
        updated
    }

    pub(crate) fn invalidate_associations(&mut self) {
        for vesicle in &mut self.vesicles {
            vesicle.invalidate_association();
        }
    }

    /// Summed association weight of every vesicle per cell.
    pub fn occupancy(&self) -> BTreeMap<CellCoordinate, f64> {
        let mut occupancy = BTreeMap::new();
        for vesicle in &self.vesicles {
            for (coordinate, weight) in vesicle.associated_cells() {
                *occupancy.entry(*coordinate).or_insert(0.0) += weight;
            }
        }
        occupancy
    }

    pub fn has_deltas(&self) -> bool {
        self.vesicles.iter().any(|vesicle| vesicle.deltas.has_deltas())
    }

    pub(crate) fn clear_potential_deltas(&mut self) {
        for vesicle in &mut self.vesicles {
            vesicle.deltas.clear_potential_deltas();
        }
    }

    /// Commit pending cargo deltas of every vesicle.
    pub fn apply_deltas(&mut self) {
        for vesicle in &mut self.vesicles {
            vesicle.apply_deltas();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vesicle::DirectedTransport;

    #[test]
    fn test_identifiers_are_not_reused() {
        let mut layer = VesicleLayer::new(1);
        let a = layer.add_vesicle(DVec2::new(1.0, 1.0), 0.1).unwrap();
        layer.remove_vesicle(a).unwrap();
        let b = layer.add_vesicle(DVec2::new(1.0, 1.0), 0.1).unwrap();
        assert_ne!(a, b);
        assert!(matches!(layer.vesicle(a), Err(SimulationError::UnknownVesicle(_))));
    }

    #[test]
    fn test_invalid_radius() {
        let mut layer = VesicleLayer::default();
        assert!(layer.add_vesicle(DVec2::ZERO, 0.0).is_err());
    }

    #[test]
    fn test_directed_transport_stops_at_bounds() {
        let mut layer = VesicleLayer::new(3);
        layer.set_bounds(Bounds::new(DVec2::ZERO, DVec2::new(1.0, 1.0)));
        let id = layer.add_vesicle(DVec2::new(0.5, 0.5), 0.1).unwrap();
        let modules: Vec<Box<dyn DisplacementModule>> = vec![Box::new(DirectedTransport::new(
            "push",
            VesicleState::Unattached,
            DVec2::new(150.0, 0.0),
        ))];
        let scale = EpochScale::new(1e-3, 1.0);

        for _ in 0..10 {
            layer.propose_displacements(&modules, &scale);
            layer.resolve_collisions();
            layer.commit_positions();
        }
        // 0.15 µm steps: 0.65, 0.8; 0.95 would cross the bound
        let x = layer.vesicle(id).unwrap().position().x;
        assert!((x - 0.8).abs() < 1e-9, "x = {}", x);
    }
}
