//! Chemical entity handles.
//!
//! The engine never looks inside an entity beyond identity, its kind and the
//! membrane-anchor flag. Physical properties live in the
//! [`FeatureRegistry`](super::FeatureRegistry).

use std::fmt;
use std::sync::Arc;

/// Closed set of entity kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// Small molecule (metabolite, ion, drug)
    SmallMolecule,
    /// Protein (enzyme, receptor, transporter)
    Protein,
    /// Non-covalent complex of two or more entities, parts kept sorted
    Complex(Vec<ChemicalEntity>),
}

#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct EntityData {
    identifier: String,
    kind: EntityKind,
    membrane_anchored: bool,
}

/// Opaque chemical entity handle. Clones share the same data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChemicalEntity(Arc<EntityData>);

impl ChemicalEntity {
    fn build(identifier: impl Into<String>, kind: EntityKind, membrane_anchored: bool) -> Self {
        Self(Arc::new(EntityData {
            identifier: identifier.into(),
            kind,
            membrane_anchored,
        }))
    }

    /// Create a small molecule.
    pub fn small_molecule(identifier: impl Into<String>) -> Self {
        Self::build(identifier, EntityKind::SmallMolecule, false)
    }

    /// Create a soluble protein.
    pub fn protein(identifier: impl Into<String>) -> Self {
        Self::build(identifier, EntityKind::Protein, false)
    }

    /// Create a protein that only exists in membrane subsections.
    pub fn membrane_protein(identifier: impl Into<String>) -> Self {
        Self::build(identifier, EntityKind::Protein, true)
    }

    /// Bind two entities into a complex.
    ///
    /// Parts of nested complexes are flattened and sorted, so `complex(a, b)`
    /// and `complex(b, a)` are the same entity. The complex is membrane
    /// anchored if any part is.
    pub fn complex(first: &ChemicalEntity, second: &ChemicalEntity) -> Self {
        let mut parts = Vec::new();
        for entity in [first, second] {
            match entity.kind() {
                EntityKind::Complex(inner) => parts.extend(inner.iter().cloned()),
                _ => parts.push(entity.clone()),
            }
        }
        parts.sort();

        let identifier = parts
            .iter()
            .map(|part| part.identifier())
            .collect::<Vec<_>>()
            .join(":");
        let membrane_anchored = parts.iter().any(|part| part.is_membrane_anchored());

        Self::build(identifier, EntityKind::Complex(parts), membrane_anchored)
    }

    pub fn identifier(&self) -> &str {
        &self.0.identifier
    }

    pub fn kind(&self) -> &EntityKind {
        &self.0.kind
    }

    pub fn is_membrane_anchored(&self) -> bool {
        self.0.membrane_anchored
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.0.kind, EntityKind::Complex(_))
    }

    /// Whether `other` is this entity or one of its complex parts.
    pub fn contains(&self, other: &ChemicalEntity) -> bool {
        if self == other {
            return true;
        }
        match &self.0.kind {
            EntityKind::Complex(parts) => parts.iter().any(|part| part.contains(other)),
            _ => false,
        }
    }
}

impl fmt::Display for ChemicalEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}
