//! Vesicle agents: point-like cargo carriers moving in continuous space.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::delta::{DeltaBuffer, ModuleId};
use crate::geometry::{Circle, DVec2};
use crate::graph::{CellCoordinate, CellRegion, ConcentrationContainer};

/// Identifier assigned by the vesicle layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VesicleId(pub u32);

impl fmt::Display for VesicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vesicle {}", self.0)
    }
}

/// Attachment state. Transitions are driven by external motility modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VesicleState {
    #[default]
    Unattached,
    ActinAttached,
    MicrotubuleAttached,
    MembraneAttached,
    /// Pushed by an actin comet tail
    ActinPropelled,
}

/// A proposed 2D displacement (µm).
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementDelta {
    pub module: ModuleId,
    pub displacement: DVec2,
}

impl DisplacementDelta {
    pub fn new(module: ModuleId, displacement: DVec2) -> Self {
        Self {
            module,
            displacement,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Vesicle {
    id: VesicleId,
    radius_um: f64,
    position: DVec2,
    next_position: DVec2,
    state: VesicleState,
    /// Committed cargo concentrations
    pub concentrations: ConcentrationContainer,
    /// Pending cargo deltas of the current epoch
    pub deltas: DeltaBuffer,
    displacement_deltas: Vec<DisplacementDelta>,
    associated_cells: BTreeMap<CellCoordinate, f64>,
    association_dirty: bool,
}

impl Vesicle {
    pub fn new(id: VesicleId, position: DVec2, radius_um: f64) -> Self {
        Self {
            id,
            radius_um,
            position,
            next_position: position,
            state: VesicleState::default(),
            concentrations: CellRegion::Vesicle.new_container(),
            deltas: DeltaBuffer::new(),
            displacement_deltas: Vec::new(),
            associated_cells: BTreeMap::new(),
            association_dirty: true,
        }
    }

    pub fn id(&self) -> VesicleId {
        self.id
    }

    pub fn radius_um(&self) -> f64 {
        self.radius_um
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    /// Tentative position of the current epoch.
    pub fn next_position(&self) -> DVec2 {
        self.next_position
    }

    pub fn state(&self) -> VesicleState {
        self.state
    }

    pub fn set_state(&mut self, state: VesicleState) {
        self.state = state;
    }

    /// Surface area of the spherical vesicle (µm²).
    pub fn surface_area_um2(&self) -> f64 {
        4.0 * PI * self.radius_um * self.radius_um
    }

    /// Volume of the spherical vesicle (µm³).
    pub fn volume_um3(&self) -> f64 {
        4.0 / 3.0 * PI * self.radius_um.powi(3)
    }

    /// Footprint at the committed position.
    pub fn circle(&self) -> Circle {
        Circle::new(self.position, self.radius_um)
    }

    pub fn add_potential_displacement_delta(&mut self, delta: DisplacementDelta) {
        self.displacement_deltas.push(delta);
    }

    pub fn potential_displacement_deltas(&self) -> &[DisplacementDelta] {
        &self.displacement_deltas
    }

    pub fn has_displacement_deltas(&self) -> bool {
        !self.displacement_deltas.is_empty()
    }

    /// Sum proposals into the tentative next position. Returns the total.
    pub fn calculate_total_displacement(&mut self) -> DVec2 {
        let total: DVec2 = self
            .displacement_deltas
            .iter()
            .map(|delta| delta.displacement)
            .sum();
        self.next_position = self.position + total;
        total
    }

    /// Reject this epoch's move: the tentative position becomes the current one.
    pub fn reset_next_position(&mut self) {
        self.next_position = self.position;
    }

    pub fn clear_potential_displacement_deltas(&mut self) {
        self.displacement_deltas.clear();
    }

    /// Whether the tentative position differs from the committed one.
    pub fn is_moving(&self) -> bool {
        self.next_position != self.position
    }

    /// Commit the tentative position.
    pub fn update_position(&mut self) {
        if self.is_moving() {
            self.position = self.next_position;
            self.association_dirty = true;
        }
        self.displacement_deltas.clear();
    }

    /// Move without going through the displacement protocol (host placement).
    pub fn place_at(&mut self, position: DVec2) {
        self.position = position;
        self.next_position = position;
        self.association_dirty = true;
    }

    /// Cells overlapped by the footprint with their area fractions.
    pub fn associated_cells(&self) -> &BTreeMap<CellCoordinate, f64> {
        &self.associated_cells
    }

    pub(crate) fn set_associated_cells(&mut self, cells: BTreeMap<CellCoordinate, f64>) {
        self.associated_cells = cells;
        self.association_dirty = false;
    }

    pub fn needs_association(&self) -> bool {
        self.association_dirty
    }

    pub(crate) fn invalidate_association(&mut self) {
        self.association_dirty = true;
    }

    /// Commit pending cargo deltas.
    pub fn apply_deltas(&mut self) {
        self.deltas.apply_deltas(&mut self.concentrations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vesicle() -> Vesicle {
        Vesicle::new(VesicleId(0), DVec2::new(1.0, 1.0), 0.1)
    }

    #[test]
    fn test_derived_area_and_volume() {
        let v = vesicle();
        assert!((v.surface_area_um2() - 4.0 * PI * 0.01).abs() < 1e-12);
        assert!((v.volume_um3() - 4.0 / 3.0 * PI * 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_displacements_sum_into_next_position() {
        let mut v = vesicle();
        v.add_potential_displacement_delta(DisplacementDelta::new(
            ModuleId::new("a"),
            DVec2::new(0.1, 0.0),
        ));
        v.add_potential_displacement_delta(DisplacementDelta::new(
            ModuleId::new("b"),
            DVec2::new(0.0, -0.2),
        ));
        let total = v.calculate_total_displacement();

        assert!((total - DVec2::new(0.1, -0.2)).length() < 1e-12);
        assert!((v.next_position() - DVec2::new(1.1, 0.8)).length() < 1e-12);
        assert_eq!(v.position(), DVec2::new(1.0, 1.0));
    }

    #[test]
    fn test_reset_restores_exact_position() {
        let mut v = vesicle();
        for i in 0..10 {
            v.add_potential_displacement_delta(DisplacementDelta::new(
                ModuleId::new("brownian"),
                DVec2::new(0.013 * i as f64, -0.007),
            ));
            v.calculate_total_displacement();
        }
        v.reset_next_position();
        assert_eq!(v.next_position(), v.position());
        assert!(!v.is_moving());
    }

    #[test]
    fn test_update_position_commits_and_clears() {
        let mut v = vesicle();
        v.add_potential_displacement_delta(DisplacementDelta::new(
            ModuleId::new("a"),
            DVec2::new(0.5, 0.0),
        ));
        v.calculate_total_displacement();
        v.set_associated_cells(BTreeMap::new());
        v.update_position();

        assert_eq!(v.position(), DVec2::new(1.5, 1.0));
        assert!(!v.has_displacement_deltas());
        assert!(v.needs_association());
    }
}
