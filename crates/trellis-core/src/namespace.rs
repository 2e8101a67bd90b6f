//! Namespace manager - schema-like containers backing graphs
//!
//! A namespace groups a graph's backing objects: the physical relations
//! that store label data and the graph's label id sequence. The catalog
//! consumes this manager for its create/drop/rename protocols; the
//! layers above the catalog use the relation registry when they create
//! or drop a label's backing relation.
//!
//! All mutating calls take the caller's `RwTxn` so that every step of a
//! multi-step catalog operation lands in one atomic unit. Namespaces
//! are addressed by name; renames move only the name key, so the
//! namespace id (and everything keyed by it) survives a rename.

use heed::types::{SerdeBincode, Str, U64};
use heed::{Database, Env, RoTxn, RwTxn, byteorder};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

use crate::sequence::SequenceState;
use crate::types::{LabelId, NamespaceId, RelationId, RelationRecord};
use crate::{Error, Result};

/// Manager for namespaces, their relation registries, and their sequences
#[derive(Clone)]
pub struct NamespaceManager {
    /// Namespace name → namespace id
    namespaces: Database<Str, U64<byteorder::NativeEndian>>,
    /// (namespace id, relation name) → relation registry row
    relations: Database<SerdeBincode<(u64, String)>, SerdeBincode<RelationRecord>>,
    /// Namespace id → label id sequence state
    sequences: Database<U64<byteorder::NativeEndian>, SerdeBincode<SequenceState>>,
    /// Next namespace id (monotone; gaps from aborted units are fine)
    next_namespace_id: Arc<RwLock<u64>>,
    /// Next relation id
    next_relation_id: Arc<RwLock<u64>>,
}

impl NamespaceManager {
    /// Open (or create) the namespace databases inside `wtxn`
    ///
    /// Id counters are initialized by scanning existing rows, so reopening
    /// a catalog never reuses a handle that was already given out.
    pub fn open(env: &Env, wtxn: &mut RwTxn) -> Result<Self> {
        let namespaces = env.create_database(wtxn, Some("namespaces"))?;
        let relations: Database<SerdeBincode<(u64, String)>, SerdeBincode<RelationRecord>> =
            env.create_database(wtxn, Some("relations"))?;
        let sequences = env.create_database(wtxn, Some("sequences"))?;

        let next_namespace_id = namespaces
            .iter(wtxn)?
            .map(|r| r.map(|(_, id)| id))
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .max()
            .map(|max_id| max_id + 1)
            .unwrap_or(1);

        let next_relation_id = relations
            .iter(wtxn)?
            .map(|r| r.map(|(_, rec)| rec.id.0))
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .max()
            .map(|max_id| max_id + 1)
            .unwrap_or(1);

        Ok(Self {
            namespaces,
            relations,
            sequences,
            next_namespace_id: Arc::new(RwLock::new(next_namespace_id)),
            next_relation_id: Arc::new(RwLock::new(next_relation_id)),
        })
    }

    /// Create a namespace, failing if the name is already taken
    pub fn create_namespace(&self, wtxn: &mut RwTxn, name: &str) -> Result<NamespaceId> {
        if name.is_empty() {
            return Err(Error::invalid_argument("namespace name must not be empty"));
        }
        if self.namespaces.get(wtxn, name)?.is_some() {
            return Err(Error::duplicate_name(format!(
                "namespace \"{name}\" already exists"
            )));
        }

        let id = {
            let mut next_id = self.next_namespace_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };

        self.namespaces.put(wtxn, name, &id)?;
        trace!(namespace = name, id, "namespace created");
        Ok(NamespaceId(id))
    }

    /// Drop a namespace
    ///
    /// Restrict mode (`cascade = false`) fails while the namespace still
    /// contains relations or its label id sequence; cascade removes them
    /// along with the namespace.
    pub fn drop_namespace(&self, wtxn: &mut RwTxn, name: &str, cascade: bool) -> Result<()> {
        let ns = self
            .namespaces
            .get(wtxn, name)?
            .ok_or_else(|| Error::internal(format!("namespace \"{name}\" does not exist")))?;

        let contained = self.relation_count(wtxn, NamespaceId(ns))?;
        if contained > 0 {
            if !cascade {
                return Err(Error::DependentObjectsExist(format!(
                    "namespace \"{name}\" still contains {contained} relation(s)"
                )));
            }
            // Propagate iteration errors; a partial key scan here would
            // let the cascade report success while relation rows survive.
            let keys: Vec<(u64, String)> = self
                .relations
                .iter(wtxn)?
                .map(|r| r.map(|(key, _)| key))
                .collect::<std::result::Result<Vec<_>, _>>()?
                .into_iter()
                .filter(|(owner, _)| *owner == ns)
                .collect();
            for key in &keys {
                self.relations.delete(wtxn, key)?;
            }
        }

        if self.sequences.get(wtxn, &ns)?.is_some() {
            if !cascade {
                // The catalog drops the sequence as its own earlier step, so
                // a restrict failure here means the drop protocol was skipped.
                return Err(Error::DependentObjectsExist(format!(
                    "namespace \"{name}\" still contains its label id sequence"
                )));
            }
            self.sequences.delete(wtxn, &ns)?;
        }

        self.namespaces.delete(wtxn, name)?;
        trace!(namespace = name, cascade, "namespace dropped");
        Ok(())
    }

    /// Rename a namespace, preserving its id and everything keyed by it
    pub fn rename_namespace(&self, wtxn: &mut RwTxn, old: &str, new: &str) -> Result<()> {
        let id = self
            .namespaces
            .get(wtxn, old)?
            .ok_or_else(|| Error::internal(format!("namespace \"{old}\" does not exist")))?;
        if self.namespaces.get(wtxn, new)?.is_some() {
            return Err(Error::duplicate_name(format!(
                "namespace \"{new}\" already exists"
            )));
        }

        self.namespaces.delete(wtxn, old)?;
        self.namespaces.put(wtxn, new, &id)?;
        trace!(old, new, id, "namespace renamed");
        Ok(())
    }

    /// Look up a namespace id by name
    pub fn get_namespace_id(&self, rtxn: &RoTxn, name: &str) -> Result<Option<NamespaceId>> {
        Ok(self.namespaces.get(rtxn, name)?.map(NamespaceId))
    }

    /// Create the label id sequence owned by `namespace`, bounded to `[1, max]`
    pub fn create_sequence(
        &self,
        wtxn: &mut RwTxn,
        namespace: NamespaceId,
        max: LabelId,
    ) -> Result<()> {
        if max < 1 {
            return Err(Error::invalid_argument(
                "label id sequence bound must be at least 1",
            ));
        }
        if self.sequences.get(wtxn, &namespace.0)?.is_some() {
            return Err(Error::internal(format!(
                "namespace {} already owns a label id sequence",
                namespace.0
            )));
        }
        self.sequences
            .put(wtxn, &namespace.0, &SequenceState::new(max))?;
        Ok(())
    }

    /// Drop the label id sequence owned by `namespace`
    pub fn drop_sequence(&self, wtxn: &mut RwTxn, namespace: NamespaceId) -> Result<()> {
        if !self.sequences.delete(wtxn, &namespace.0)? {
            return Err(Error::internal(format!(
                "namespace {} has no label id sequence",
                namespace.0
            )));
        }
        Ok(())
    }

    /// Emit the next value of the namespace's sequence, wrapping after its bound
    pub fn sequence_next(&self, wtxn: &mut RwTxn, namespace: NamespaceId) -> Result<LabelId> {
        let mut state = self
            .sequences
            .get(wtxn, &namespace.0)?
            .ok_or_else(|| {
                Error::internal(format!(
                    "namespace {} has no label id sequence",
                    namespace.0
                ))
            })?;
        let value = state.advance();
        self.sequences.put(wtxn, &namespace.0, &state)?;
        Ok(value)
    }

    /// Inclusive upper bound (cycle length) of the namespace's sequence
    pub fn sequence_max(&self, rtxn: &RoTxn, namespace: NamespaceId) -> Result<LabelId> {
        let state = self.sequences.get(rtxn, &namespace.0)?.ok_or_else(|| {
            Error::internal(format!(
                "namespace {} has no label id sequence",
                namespace.0
            ))
        })?;
        Ok(state.max)
    }

    /// Register a relation inside a namespace and hand back its handle
    ///
    /// Invoked by the layers that create the physical storage object for
    /// a label, before the label is registered in the catalog.
    pub fn create_relation(
        &self,
        wtxn: &mut RwTxn,
        namespace: NamespaceId,
        name: &str,
    ) -> Result<RelationId> {
        if name.is_empty() {
            return Err(Error::invalid_argument("relation name must not be empty"));
        }
        let key = (namespace.0, name.to_string());
        if self.relations.get(wtxn, &key)?.is_some() {
            return Err(Error::duplicate_name(format!(
                "relation \"{name}\" already exists in namespace {}",
                namespace.0
            )));
        }

        let id = {
            let mut next_id = self.next_relation_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };

        self.relations
            .put(wtxn, &key, &RelationRecord { id: RelationId(id) })?;
        trace!(namespace = namespace.0, relation = name, id, "relation registered");
        Ok(RelationId(id))
    }

    /// Remove a relation from a namespace's registry
    pub fn drop_relation(&self, wtxn: &mut RwTxn, namespace: NamespaceId, name: &str) -> Result<()> {
        let key = (namespace.0, name.to_string());
        if !self.relations.delete(wtxn, &key)? {
            return Err(Error::invalid_argument(format!(
                "relation \"{name}\" does not exist in namespace {}",
                namespace.0
            )));
        }
        Ok(())
    }

    /// Number of relations currently registered in a namespace
    pub fn relation_count(&self, rtxn: &RoTxn, namespace: NamespaceId) -> Result<u64> {
        let mut count = 0;
        for result in self.relations.iter(rtxn)? {
            let ((owner, _), _) = result?;
            if owner == namespace.0 {
                count += 1;
            }
        }
        Ok(count)
    }
}
