//! Graph catalog - graph name → backing namespace
//!
//! The catalog is the single entry point for graph and label metadata:
//! it orchestrates the create/drop/rename protocols for graphs, keeps
//! graph rows and their backing namespace objects mutually consistent,
//! and registers labels with collision-free ids.
//!
//! # Transactional model
//!
//! The catalog does not own transactions. Every mutating operation
//! takes the caller's `heed::RwTxn` and performs all of its steps
//! inside it; the caller commits or drops the transaction, so either
//! all steps of an operation become durable or none do. An `RwTxn`
//! reads its own writes, which is what lets step N+1 of a protocol see
//! the objects step N just created. LMDB write transactions are
//! exclusive, so a get-before-put inside one is a race-free uniqueness
//! check.
//!
//! Read-only queries take `&RoTxn`; an `RwTxn` derefs to one, so the
//! same queries work mid-operation.

pub mod labels;

use heed::types::{SerdeBincode, Str, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn, byteorder};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::namespace::NamespaceManager;
use crate::sequence::LabelIdAllocator;
use crate::types::{
    GraphId, GraphRecord, LabelId, LabelKind, LabelRecord, NamespaceId, RelationId, MAX_LABEL_ID,
};
use crate::{Error, Result};
use self::labels::LabelCatalog;

/// Catalog storage format version
const FORMAT_VERSION: u32 = 1;

/// Default LMDB map size; graph/label metadata is tiny
const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024;

/// Metadata stored in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogMetadata {
    /// Storage format version
    pub version: u32,
}

impl Default for CatalogMetadata {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
        }
    }
}

/// Graph/label metadata catalog over an LMDB environment
#[derive(Clone)]
pub struct Catalog {
    /// LMDB environment supplying transactional units
    env: Env,

    /// Graph name → graph id
    graphs_by_name: Database<Str, U64<byteorder::NativeEndian>>,
    /// Graph id → graph row
    graphs_by_id: Database<U64<byteorder::NativeEndian>, SerdeBincode<GraphRecord>>,

    /// Metadata database (format version)
    metadata_db: Database<Str, SerdeBincode<CatalogMetadata>>,

    /// Namespace manager (namespaces, relation registry, sequences)
    namespaces: NamespaceManager,
    /// Label catalog
    labels: LabelCatalog,

    /// Next graph id (monotone; never reused, gaps from aborts are fine)
    next_graph_id: Arc<RwLock<u64>>,

    /// Bound of each new graph's label id sequence
    label_id_max: LabelId,
}

impl Catalog {
    /// Open or create a catalog at the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_at_path(path.as_ref(), DEFAULT_MAP_SIZE, MAX_LABEL_ID)
    }

    /// Open a catalog with a specific LMDB map size
    pub fn with_map_size<P: AsRef<Path>>(path: P, map_size: usize) -> Result<Self> {
        Self::open_at_path(path.as_ref(), map_size, MAX_LABEL_ID)
    }

    /// Open a catalog whose new graphs get a label id space of `[1, max]`
    ///
    /// The default bound is [`MAX_LABEL_ID`]; a smaller bound is useful in
    /// tests that exercise wraparound and exhaustion.
    pub fn with_label_id_max<P: AsRef<Path>>(path: P, max: LabelId) -> Result<Self> {
        if max < 1 {
            return Err(Error::invalid_argument(
                "label id space bound must be at least 1",
            ));
        }
        Self::open_at_path(path.as_ref(), DEFAULT_MAP_SIZE, max)
    }

    fn open_at_path(path: &Path, map_size: usize, label_id_max: LabelId) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(10)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;

        let graphs_by_name = env.create_database(&mut wtxn, Some("graphs_by_name"))?;
        let graphs_by_id: Database<U64<byteorder::NativeEndian>, SerdeBincode<GraphRecord>> =
            env.create_database(&mut wtxn, Some("graphs_by_id"))?;
        let metadata_db = env.create_database(&mut wtxn, Some("metadata"))?;

        let namespaces = NamespaceManager::open(&env, &mut wtxn)?;
        let labels = LabelCatalog::open(&env, &mut wtxn)?;

        if metadata_db.get(&wtxn, "main")?.is_none() {
            metadata_db.put(&mut wtxn, "main", &CatalogMetadata::default())?;
        }

        let next_graph_id = graphs_by_id
            .iter(&wtxn)?
            .map(|r| r.map(|(id, _)| id))
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .max()
            .map(|max_id| max_id + 1)
            .unwrap_or(1);

        wtxn.commit()?;

        Ok(Self {
            env,
            graphs_by_name,
            graphs_by_id,
            metadata_db,
            namespaces,
            labels,
            next_graph_id: Arc::new(RwLock::new(next_graph_id)),
            label_id_max,
        })
    }

    /// The underlying LMDB environment
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Begin a write transaction (one atomic catalog unit)
    pub fn write_txn(&self) -> Result<RwTxn<'_>> {
        Ok(self.env.write_txn()?)
    }

    /// Begin a read-only transaction
    pub fn read_txn(&self) -> Result<RoTxn<'_>> {
        Ok(self.env.read_txn()?)
    }

    /// The namespace manager, for the layers that create and drop the
    /// physical relations backing labels
    pub fn namespaces(&self) -> &NamespaceManager {
        &self.namespaces
    }

    /// Get current metadata
    pub fn get_metadata(&self, rtxn: &RoTxn) -> Result<CatalogMetadata> {
        self.metadata_db
            .get(rtxn, "main")?
            .ok_or_else(|| Error::internal("catalog metadata not found"))
    }

    /// Create a graph
    ///
    /// Creates the backing namespace (same name as the graph, so users can
    /// find it by name alone) together with the graph's label id sequence,
    /// then inserts the graph row. A name collision at either level fails
    /// with [`Error::DuplicateName`] and, because everything runs in the
    /// caller's transaction, leaves neither a namespace nor a row behind.
    pub fn create_graph(&self, wtxn: &mut RwTxn, name: &str) -> Result<GraphId> {
        if name.is_empty() {
            return Err(Error::invalid_argument("graph name must not be empty"));
        }

        let namespace = self.namespaces.create_namespace(wtxn, name)?;
        self.namespaces
            .create_sequence(wtxn, namespace, self.label_id_max)?;

        if self.graphs_by_name.get(wtxn, name)?.is_some() {
            return Err(Error::duplicate_name(format!(
                "graph \"{name}\" already exists"
            )));
        }

        let id = {
            let mut next_id = self.next_graph_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };

        self.graphs_by_name.put(wtxn, name, &id)?;
        self.graphs_by_id.put(
            wtxn,
            &id,
            &GraphRecord {
                name: name.to_string(),
                namespace,
            },
        )?;

        info!(graph = name, "graph \"{name}\" has been created");
        Ok(GraphId(id))
    }

    /// Drop a graph
    ///
    /// The label id sequence is removed as its own explicit step before
    /// the namespace, so a restrict-mode failure is always about user
    /// data (remaining labels), never internal bookkeeping objects. With
    /// `cascade` the namespace drop removes the labels' backing relations
    /// and the label rows are deleted with them; without it the drop
    /// fails with [`Error::DependentObjectsExist`] while labels remain.
    pub fn drop_graph(&self, wtxn: &mut RwTxn, name: &str, cascade: bool) -> Result<()> {
        let Some(id) = self.get_graph_id(wtxn, name)? else {
            return Err(Error::unknown_graph(name));
        };
        let record = self
            .graphs_by_id
            .get(wtxn, &id.0)?
            .ok_or_else(|| Error::internal(format!("graph row {} missing", id.0)))?;

        self.namespaces.drop_sequence(wtxn, record.namespace)?;

        match self.namespaces.drop_namespace(wtxn, name, cascade) {
            Err(Error::DependentObjectsExist(_)) => {
                let remaining = self.labels.count_for_graph(wtxn, id)?;
                return Err(Error::DependentObjectsExist(format!(
                    "graph \"{name}\" still contains {remaining} label(s); \
                     drop them first or drop the graph with cascade"
                )));
            }
            other => other?,
        }

        self.labels.remove_graph(wtxn, id)?;
        self.graphs_by_name.delete(wtxn, name)?;
        self.graphs_by_id.delete(wtxn, &id.0)?;

        info!(graph = name, cascade, "graph \"{name}\" has been dropped");
        Ok(())
    }

    /// Rename a graph, preserving its namespace identity
    ///
    /// Renames the backing namespace first, then updates the graph row;
    /// both run in the caller's transaction, so a collision on either
    /// name rolls the whole rename back.
    pub fn rename_graph(&self, wtxn: &mut RwTxn, old: &str, new: &str) -> Result<()> {
        if new.is_empty() {
            return Err(Error::invalid_argument("graph name must not be empty"));
        }
        let Some(id) = self.get_graph_id(wtxn, old)? else {
            return Err(Error::unknown_graph(old));
        };
        if self.graphs_by_name.get(wtxn, new)?.is_some() {
            return Err(Error::duplicate_name(format!(
                "graph \"{new}\" already exists"
            )));
        }

        self.namespaces.rename_namespace(wtxn, old, new)?;

        let mut record = self
            .graphs_by_id
            .get(wtxn, &id.0)?
            .ok_or_else(|| Error::internal(format!("graph row {} missing", id.0)))?;
        record.name = new.to_string();
        self.graphs_by_name.delete(wtxn, old)?;
        self.graphs_by_name.put(wtxn, new, &id.0)?;
        self.graphs_by_id.put(wtxn, &id.0, &record)?;

        info!(old, new, "graph \"{old}\" renamed to \"{new}\"");
        Ok(())
    }

    /// Alter a graph
    ///
    /// Single dispatch point for graph alterations; only `RENAME` is
    /// supported. The operation keyword is case-insensitive, graph names
    /// are case-sensitive.
    pub fn alter_graph(
        &self,
        wtxn: &mut RwTxn,
        name: &str,
        operation: &str,
        new_value: &str,
    ) -> Result<()> {
        if operation.eq_ignore_ascii_case("rename") {
            self.rename_graph(wtxn, name, new_value)
        } else {
            Err(Error::invalid_argument(format!(
                "invalid operation \"{operation}\"; valid operations: RENAME"
            )))
        }
    }

    /// Register a label under an existing graph
    ///
    /// The backing relation must already exist (created by the layer
    /// above through the namespace manager); this assigns the id and
    /// records the row. Returns the assigned id.
    pub fn register_label(
        &self,
        wtxn: &mut RwTxn,
        graph: GraphId,
        name: &str,
        kind: LabelKind,
        relation: RelationId,
    ) -> Result<LabelId> {
        if name.is_empty() {
            return Err(Error::invalid_argument("label name must not be empty"));
        }
        let record = self
            .graphs_by_id
            .get(wtxn, &graph.0)?
            .ok_or_else(|| Error::UnknownGraph(format!("graph {} does not exist", graph.0)))?;

        if self.labels.get(wtxn, graph, name)?.is_some() {
            return Err(Error::duplicate_name(format!(
                "label \"{name}\" already exists in graph \"{}\"",
                record.name
            )));
        }

        let allocator = LabelIdAllocator::new(&self.namespaces, &self.labels);
        let id = allocator.allocate(wtxn, graph, record.namespace)?;

        self.labels
            .insert(wtxn, graph, name, LabelRecord { id, kind, relation })?;
        Ok(id)
    }

    /// Whether a graph with this name exists
    pub fn graph_exists(&self, rtxn: &RoTxn, name: &str) -> Result<bool> {
        Ok(self.get_graph_id(rtxn, name)?.is_some())
    }

    /// Look up a graph id by name
    pub fn get_graph_id(&self, rtxn: &RoTxn, name: &str) -> Result<Option<GraphId>> {
        Ok(self.graphs_by_name.get(rtxn, name)?.map(GraphId))
    }

    /// Look up the namespace backing a graph
    ///
    /// The handle is stable across renames; only the graph's name changes.
    pub fn get_graph_namespace(&self, rtxn: &RoTxn, name: &str) -> Result<Option<NamespaceId>> {
        let Some(id) = self.get_graph_id(rtxn, name)? else {
            return Ok(None);
        };
        Ok(self
            .graphs_by_id
            .get(rtxn, &id.0)?
            .map(|record| record.namespace))
    }

    /// Whether a label with this name exists in the graph
    pub fn label_exists(&self, rtxn: &RoTxn, graph: GraphId, name: &str) -> Result<bool> {
        Ok(self.labels.get(rtxn, graph, name)?.is_some())
    }

    /// Look up a label's id by name within its graph
    pub fn get_label_id(&self, rtxn: &RoTxn, graph: GraphId, name: &str) -> Result<Option<LabelId>> {
        Ok(self.labels.get(rtxn, graph, name)?.map(|record| record.id))
    }

    /// Fetch a full label row by name within its graph
    pub fn get_label(&self, rtxn: &RoTxn, graph: GraphId, name: &str) -> Result<Option<LabelRecord>> {
        self.labels.get(rtxn, graph, name)
    }

    /// Whether the id is assigned to some label of the graph
    pub fn label_id_in_use(&self, rtxn: &RoTxn, graph: GraphId, id: LabelId) -> Result<bool> {
        self.labels.id_in_use(rtxn, graph, id)
    }
}
