//! Concentration delta engine.
//!
//! Two-phase protocol shared by every module:
//! 1. **Propose**: modules read the state committed at the end of the
//!    previous epoch and push [`ConcentrationDelta`]s into a [`DeltaBuffer`].
//!    Nothing visible changes.
//! 2. **Commit**: [`DeltaBuffer::apply_deltas`] sums the pending deltas per
//!    (subsection, entity), adds the sums to the container and clears the
//!    buffer.
//!
//! The commit is split into the pure functions [`accumulate`] and [`flush`]
//! so the barrier can be inspected and tested in isolation.

mod buffer;

pub use buffer::{accumulate, flush, DeltaBuffer, DeltaTotals};

use std::fmt;
use std::sync::Arc;

use crate::chemistry::ChemicalEntity;
use crate::graph::CellSubsection;

/// Identifier of the module that produced a delta.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
    pub fn new(identifier: &str) -> Self {
        Self(Arc::from(identifier))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable proposal to change one concentration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationDelta {
    module: ModuleId,
    subsection: CellSubsection,
    entity: ChemicalEntity,
    /// Signed change in mol/µm³
    quantity: f64,
}

impl ConcentrationDelta {
    pub fn new(
        module: ModuleId,
        subsection: CellSubsection,
        entity: ChemicalEntity,
        quantity: f64,
    ) -> Self {
        Self {
            module,
            subsection,
            entity,
            quantity,
        }
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    pub fn subsection(&self) -> CellSubsection {
        self.subsection
    }

    pub fn entity(&self) -> &ChemicalEntity {
        &self.entity
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Same delta with its quantity multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            quantity: self.quantity * factor,
            ..self.clone()
        }
    }
}
