//! Trellis Core - Graph/Label Metadata Catalog
//!
//! This crate is the metadata catalog layer for a graph-structured data
//! store layered on a general-purpose transactional engine (LMDB). It
//! tracks which named graphs exist, which namespace backs each graph,
//! which labels (typed collections of vertices or edges) belong to each
//! graph, and which unique small integer id each label owns within its
//! graph.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          Command layer (external)            │
//! └──────────────┬──────────────────────────────┘
//!                │ one RwTxn per statement
//! ┌──────────────┴──────────────────────────────┐
//! │             Graph Catalog                    │
//! │  (create / drop / rename protocols)          │
//! ├──────────────┬───────────────┬──────────────┤
//! │ Label Catalog│ Id Allocator  │ Namespace Mgr │
//! │ (rows, ids)  │ (cyclic probe)│ (ns/seq/rels) │
//! └──────────────┴───────────────┴──────────────┘
//!                │
//!          LMDB environment (heed)
//! ```
//!
//! Every mutating operation runs inside a caller-supplied `RwTxn`, so a
//! multi-step protocol (namespace side effects plus catalog rows) is a
//! single atomic unit: no committed state can ever hold a catalog row
//! without its backing namespace objects, or vice versa.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod error;
pub mod namespace;
pub mod sequence;
pub mod testing;
pub mod types;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use types::{GraphId, LabelId, LabelKind, NamespaceId, RelationId, MAX_LABEL_ID};
