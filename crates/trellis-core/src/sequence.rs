//! Label id sequences and the label id allocator
//!
//! Every graph owns exactly one bounded cyclic sequence, created with
//! its namespace and destroyed with it. The sequence hands out
//! candidate ids in `[1, max]` and wraps back to 1 after emitting
//! `max`; it never stops and never reports exhaustion on its own.
//! Uniqueness is the allocator's job: it probes candidates against the
//! label catalog and gives up with [`Error::LabelIdSpaceExhausted`]
//! once a full cycle has been checked, so a fully occupied id space can
//! never turn into an infinite probe loop.

use heed::RwTxn;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::catalog::labels::LabelCatalog;
use crate::namespace::NamespaceManager;
use crate::types::{GraphId, LabelId, NamespaceId};
use crate::{Error, Result};

/// Persistent state of one bounded cyclic sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceState {
    /// Next value the sequence will emit
    pub next: LabelId,
    /// Inclusive upper bound; the value after `max` is 1
    pub max: LabelId,
}

impl SequenceState {
    /// Create a fresh sequence bounded to `[1, max]`
    pub fn new(max: LabelId) -> Self {
        Self { next: 1, max }
    }

    /// Emit the next value and advance, wrapping after `max`
    pub fn advance(&mut self) -> LabelId {
        let value = self.next;
        self.next = if value >= self.max { 1 } else { value + 1 };
        value
    }
}

/// Allocates a collision-free label id for a graph
///
/// Draws candidates from the graph's sequence and checks each against
/// the ids already recorded for the graph. The number of probes is
/// capped at the cycle length.
pub struct LabelIdAllocator<'a> {
    namespaces: &'a NamespaceManager,
    labels: &'a LabelCatalog,
}

impl<'a> LabelIdAllocator<'a> {
    /// Create an allocator over the given namespace manager and label catalog
    pub fn new(namespaces: &'a NamespaceManager, labels: &'a LabelCatalog) -> Self {
        Self { namespaces, labels }
    }

    /// Produce an id not currently in use by any label of `graph`
    ///
    /// `namespace` must be the graph's backing namespace (it owns the
    /// sequence). Fails with [`Error::LabelIdSpaceExhausted`] when every
    /// value of the cycle is taken.
    pub fn allocate(
        &self,
        wtxn: &mut RwTxn,
        graph: GraphId,
        namespace: NamespaceId,
    ) -> Result<LabelId> {
        let cycle_len = self.namespaces.sequence_max(wtxn, namespace)?;
        for probe in 0..cycle_len {
            let candidate = self.namespaces.sequence_next(wtxn, namespace)?;
            if !self.labels.id_in_use(wtxn, graph, candidate)? {
                trace!(graph = graph.0, id = candidate, probes = probe + 1, "label id allocated");
                return Ok(candidate);
            }
        }
        Err(Error::LabelIdSpaceExhausted(format!(
            "all {cycle_len} label ids of graph {} are in use",
            graph.0
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_starts_at_one() {
        let mut seq = SequenceState::new(10);
        assert_eq!(seq.advance(), 1);
        assert_eq!(seq.advance(), 2);
    }

    #[test]
    fn test_sequence_wraps_after_max() {
        let mut seq = SequenceState::new(3);
        assert_eq!(seq.advance(), 1);
        assert_eq!(seq.advance(), 2);
        assert_eq!(seq.advance(), 3);
        assert_eq!(seq.advance(), 1);
        assert_eq!(seq.advance(), 2);
    }

    #[test]
    fn test_sequence_single_value_cycle() {
        let mut seq = SequenceState::new(1);
        assert_eq!(seq.advance(), 1);
        assert_eq!(seq.advance(), 1);
    }
}
