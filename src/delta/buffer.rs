//! Pending delta buffers and the commit barrier.

use std::collections::BTreeMap;

use super::{ConcentrationDelta, ModuleId};
use crate::chemistry::ChemicalEntity;
use crate::graph::{CellSubsection, ConcentrationContainer};

/// Summed deltas per (subsection, entity).
pub type DeltaTotals = BTreeMap<(CellSubsection, ChemicalEntity), f64>;

/// Relative undershoot below zero that is treated as round-off.
const NEGATIVE_TOLERANCE: f64 = 1e-9;

/// Sum deltas per (subsection, entity).
pub fn accumulate(deltas: &[ConcentrationDelta]) -> DeltaTotals {
    let mut totals = DeltaTotals::new();
    for delta in deltas {
        *totals
            .entry((delta.subsection(), delta.entity().clone()))
            .or_insert(0.0) += delta.quantity();
    }
    totals
}

/// Add summed deltas to a container.
///
/// Results are clamped at zero; undershoots beyond round-off and non-finite
/// sums are reported through the log. A non-finite sum leaves the old value in
/// place. Returns the number of entries written.
pub fn flush(totals: &DeltaTotals, container: &mut ConcentrationContainer) -> usize {
    let mut written = 0;
    for ((subsection, entity), total) in totals {
        if !total.is_finite() {
            log::warn!(
                "Discarding non-finite delta {} for {} in {:?}",
                total,
                entity,
                subsection
            );
            continue;
        }
        let current = container.get(*subsection, entity);
        let updated = current + total;
        if updated < 0.0 && -updated > NEGATIVE_TOLERANCE * current.abs() {
            log::warn!(
                "Concentration of {} in {:?} undershoots zero ({:e} + {:e}), clamping",
                entity,
                subsection,
                current,
                total
            );
        }
        container.set(*subsection, entity.clone(), updated);
        written += 1;
    }
    written
}

/// Per-cell (or per-vesicle) list of not yet committed deltas.
#[derive(Debug, Clone, Default)]
pub struct DeltaBuffer {
    pending: Vec<ConcentrationDelta>,
}

impl DeltaBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a delta without touching visible concentrations.
    pub fn add_potential_delta(&mut self, delta: ConcentrationDelta) {
        self.pending.push(delta);
    }

    pub fn has_deltas(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn potential_deltas(&self) -> &[ConcentrationDelta] {
        &self.pending
    }

    pub fn clear_potential_deltas(&mut self) {
        self.pending.clear();
    }

    /// Drop every pending delta except those produced by `module`.
    pub fn clear_potential_deltas_but(&mut self, module: &ModuleId) {
        self.pending.retain(|delta| delta.module() == module);
    }

    /// Commit: sum, add to `container`, clear.
    pub fn apply_deltas(&mut self, container: &mut ConcentrationContainer) {
        if self.pending.is_empty() {
            return;
        }
        let totals = accumulate(&self.pending);
        flush(&totals, container);
        self.pending.clear();
    }
}
