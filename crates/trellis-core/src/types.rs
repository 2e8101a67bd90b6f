//! Identifier and record types shared across the catalog
//!
//! All handles are opaque newtypes over the storage engine's integer
//! identifiers. `LabelId` is a plain `i32` because it is embedded in
//! every vertex/edge identity on disk and must stay compact.

use serde::{Deserialize, Serialize};

/// Label id type, unique within the owning graph
///
/// Drawn from `[1, MAX_LABEL_ID]` by a per-graph wrapping sequence.
pub type LabelId = i32;

/// Upper bound of the label id space for a graph
///
/// Label ids are part of every element's on-disk identity, so the space
/// is kept small; the per-graph sequence wraps back to 1 after emitting
/// this value.
pub const MAX_LABEL_ID: LabelId = 65535;

/// Opaque handle to a graph catalog row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub u64);

/// Opaque handle to a namespace (the schema-like container backing a graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceId(pub u64);

/// Opaque handle to the physical relation backing a label's data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationId(pub u64);

/// Kind of a label: a collection of vertices or a collection of edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelKind {
    /// Vertex label
    Vertex,
    /// Edge label
    Edge,
}

impl LabelKind {
    /// Single-character tag used in log output
    pub fn as_char(self) -> char {
        match self {
            LabelKind::Vertex => 'v',
            LabelKind::Edge => 'e',
        }
    }
}

/// Graph catalog row: the graph's name and its backing namespace
///
/// The namespace handle is the graph's identity across renames; only
/// `name` ever changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Graph name, unique process-wide, case-sensitive
    pub name: String,
    /// Backing namespace, 1:1 with the graph
    pub namespace: NamespaceId,
}

/// Label catalog row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRecord {
    /// Assigned id, unique within the owning graph
    pub id: LabelId,
    /// Vertex or edge; fixed at creation
    pub kind: LabelKind,
    /// Backing physical relation for this label's data
    pub relation: RelationId,
}

/// Relation registry row kept by the namespace manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRecord {
    /// Relation handle recorded for the label that owns it
    pub id: RelationId,
}
