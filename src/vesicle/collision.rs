//! Collision gate for tentative vesicle positions.
//!
//! A move is rejected when the vesicle at its tentative position would leave
//! the simulation bounds, touch a membrane segment (enlarged by a safety
//! margin), leave the confinement of its current state, or overlap another
//! vesicle. Membrane-attached vesicles may touch membranes but never cross
//! one. Rejected vesicles stay where they are and retry next epoch.

use rand::prelude::*;

use super::{Vesicle, VesicleState};
use crate::geometry::{Bounds, Circle, LineSegment, Polygon};

/// Region a vesicle in `state` must not leave.
#[derive(Debug, Clone)]
pub struct Confinement {
    pub state: VesicleState,
    pub region: Polygon,
}

impl Confinement {
    pub fn new(state: VesicleState, region: Polygon) -> Self {
        Self { state, region }
    }
}

/// Static obstacles checked for each vesicle on its own.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Obstacles<'a> {
    pub(crate) bounds: Option<&'a Bounds>,
    pub(crate) membranes: &'a [LineSegment],
    pub(crate) confinements: &'a [Confinement],
    pub(crate) margin_um: f64,
}

impl Obstacles<'_> {
    /// Reason the tentative position is illegal, if any.
    pub(crate) fn violation(&self, vesicle: &Vesicle) -> Option<&'static str> {
        let next = vesicle.next_position();
        let radius = vesicle.radius_um();

        if let Some(bounds) = self.bounds {
            if !bounds.contains_circle(next, radius) {
                return Some("simulation bounds");
            }
        }

        // attached vesicles sit on the membrane; they may slide along it but not cross
        let attached = vesicle.state() == VesicleState::MembraneAttached;
        let footprint = Circle::new(next, radius + self.margin_um);
        let path = LineSegment::new(vesicle.position(), next);
        let hits_membrane = self.membranes.iter().any(|membrane| {
            (!attached && footprint.intersects_segment(membrane)) || path.intersection(membrane).is_some()
        });
        if hits_membrane {
            return Some("membrane");
        }

        let leaves_confinement = self
            .confinements
            .iter()
            .filter(|confinement| confinement.state == vesicle.state())
            .any(|confinement| !confinement.region.contains(next));
        if leaves_confinement {
            return Some("confinement");
        }
        None
    }
}

/// Whether two vesicles overlap at their tentative positions.
pub(crate) fn overlapping(a: &Vesicle, b: &Vesicle) -> bool {
    let reach = a.radius_um() + b.radius_um();
    a.next_position().distance_squared(b.next_position()) < reach * reach
}

/// Reject moves until no tentative position is illegal.
///
/// Static obstacles are checked first. Then overlapping pairs are resolved:
/// when only one of the two is moving its move is rejected, otherwise a fair
/// coin decides which of the two stays. Rejections can create new overlaps,
/// so pairs are rechecked until stable. Returns the number of rejected moves.
pub(crate) fn resolve(vesicles: &mut [Vesicle], obstacles: Obstacles<'_>, rng: &mut StdRng) -> usize {
    let mut rejected = 0;

    for vesicle in vesicles.iter_mut() {
        if !vesicle.is_moving() {
            continue;
        }
        if let Some(reason) = obstacles.violation(vesicle) {
            log::debug!("Rejected move of {} ({})", vesicle.id(), reason);
            vesicle.reset_next_position();
            rejected += 1;
        }
    }

    loop {
        let mut changed = false;
        for i in 0..vesicles.len() {
            for j in (i + 1)..vesicles.len() {
                if !overlapping(&vesicles[i], &vesicles[j]) {
                    continue;
                }
                let victim = match (vesicles[i].is_moving(), vesicles[j].is_moving()) {
                    (false, false) => continue,
                    (true, false) => i,
                    (false, true) => j,
                    (true, true) => {
                        if rng.gen_bool(0.5) {
                            i
                        } else {
                            j
                        }
                    }
                };
                log::debug!(
                    "Rejected move of {} (collision with {})",
                    vesicles[victim].id(),
                    vesicles[if victim == i { j } else { i }].id()
                );
                vesicles[victim].reset_next_position();
                rejected += 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    rejected
}
