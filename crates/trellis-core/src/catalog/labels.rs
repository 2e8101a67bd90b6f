//! Label catalog - (graph, label name) → (id, kind, relation)
//!
//! Keeps two mappings per label: the row itself keyed by name and an id
//! index keyed by the assigned id, so both name lookups and the
//! allocator's in-use checks are point reads. Existence is "the lookup
//! returned a row", never a separate flag.

use heed::types::{SerdeBincode, Str};
use heed::{Database, Env, RoTxn, RwTxn};
use tracing::trace;

use crate::types::{GraphId, LabelId, LabelRecord};
use crate::{Error, Result};

/// Catalog of labels, scoped per owning graph
#[derive(Clone)]
pub struct LabelCatalog {
    /// (graph id, label name) → label row
    by_name: Database<SerdeBincode<(u64, String)>, SerdeBincode<LabelRecord>>,
    /// (graph id, label id) → label name
    by_id: Database<SerdeBincode<(u64, i32)>, Str>,
}

impl LabelCatalog {
    /// Open (or create) the label databases inside `wtxn`
    pub fn open(env: &Env, wtxn: &mut RwTxn) -> Result<Self> {
        let by_name = env.create_database(wtxn, Some("labels_by_name"))?;
        let by_id = env.create_database(wtxn, Some("labels_by_id"))?;
        Ok(Self { by_name, by_id })
    }

    /// Fetch a label row by name within its graph
    pub fn get(&self, rtxn: &RoTxn, graph: GraphId, name: &str) -> Result<Option<LabelRecord>> {
        Ok(self.by_name.get(rtxn, &(graph.0, name.to_string()))?)
    }

    /// Insert a label row, failing if the name is taken within the graph
    ///
    /// The id must come from the graph's allocator; this only records it.
    pub fn insert(
        &self,
        wtxn: &mut RwTxn,
        graph: GraphId,
        name: &str,
        record: LabelRecord,
    ) -> Result<()> {
        let key = (graph.0, name.to_string());
        if self.by_name.get(wtxn, &key)?.is_some() {
            return Err(Error::duplicate_name(format!(
                "label \"{name}\" already exists in graph {}",
                graph.0
            )));
        }
        let id = record.id;
        let kind = record.kind;
        self.by_name.put(wtxn, &key, &record)?;
        self.by_id.put(wtxn, &(graph.0, id), name)?;
        trace!(
            graph = graph.0,
            label = name,
            id,
            kind = %kind.as_char(),
            "label registered"
        );
        Ok(())
    }

    /// Whether the given id is assigned to some label of the graph
    pub fn id_in_use(&self, rtxn: &RoTxn, graph: GraphId, id: LabelId) -> Result<bool> {
        Ok(self.by_id.get(rtxn, &(graph.0, id))?.is_some())
    }

    /// Number of labels currently registered under a graph
    pub fn count_for_graph(&self, rtxn: &RoTxn, graph: GraphId) -> Result<u64> {
        let mut count = 0;
        for result in self.by_name.iter(rtxn)? {
            let ((owner, _), _) = result?;
            if owner == graph.0 {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Delete every label row of a graph (the cascading part of a graph drop)
    ///
    /// Returns the number of labels removed. Any iteration error aborts the
    /// removal; a partial scan must never pass for a complete one, or the
    /// drop would leave orphan rows behind while reporting success.
    pub fn remove_graph(&self, wtxn: &mut RwTxn, graph: GraphId) -> Result<u64> {
        let names: Vec<(u64, String)> = self
            .by_name
            .iter(wtxn)?
            .map(|r| r.map(|(key, _)| key))
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|(owner, _)| *owner == graph.0)
            .collect();
        let ids: Vec<(u64, i32)> = self
            .by_id
            .iter(wtxn)?
            .map(|r| r.map(|(key, _)| key))
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|(owner, _)| *owner == graph.0)
            .collect();

        for key in &names {
            self.by_name.delete(wtxn, key)?;
        }
        for key in &ids {
            self.by_id.delete(wtxn, key)?;
        }
        Ok(names.len() as u64)
    }
}
