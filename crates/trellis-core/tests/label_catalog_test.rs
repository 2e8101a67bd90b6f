//! Integration tests for label registration and id allocation
//!
//! Exercises per-graph name and id uniqueness, the wrapping behavior of
//! the label id sequence, collision probing, and the exhaustion bound.

use proptest::prelude::*;
use trellis_core::testing::{create_test_catalog, create_test_catalog_with_label_id_max};
use trellis_core::{Error, GraphId, LabelKind, NamespaceId, RelationId};

/// Create a graph plus a backing relation for each requested label name,
/// all inside the given transaction.
fn setup_graph(
    catalog: &trellis_core::Catalog,
    wtxn: &mut heed::RwTxn,
    name: &str,
) -> (GraphId, NamespaceId) {
    let graph = catalog.create_graph(wtxn, name).unwrap();
    let ns = catalog.get_graph_namespace(wtxn, name).unwrap().unwrap();
    (graph, ns)
}

fn add_relation(
    catalog: &trellis_core::Catalog,
    wtxn: &mut heed::RwTxn,
    ns: NamespaceId,
    name: &str,
) -> RelationId {
    catalog.namespaces().create_relation(wtxn, ns, name).unwrap()
}

#[test]
fn test_duplicate_label_name_rejected() {
    let (catalog, _ctx) = create_test_catalog();
    let mut wtxn = catalog.write_txn().unwrap();

    let (graph, ns) = setup_graph(&catalog, &mut wtxn, "g");
    let rel = add_relation(&catalog, &mut wtxn, ns, "person");
    catalog
        .register_label(&mut wtxn, graph, "person", LabelKind::Vertex, rel)
        .unwrap();

    let rel2 = add_relation(&catalog, &mut wtxn, ns, "person_2");
    let err = catalog
        .register_label(&mut wtxn, graph, "person", LabelKind::Edge, rel2)
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateName(_)));
}

#[test]
fn test_sequential_ids_are_distinct_and_in_range() {
    let (catalog, _ctx) = create_test_catalog_with_label_id_max(8);
    let mut wtxn = catalog.write_txn().unwrap();

    let (graph, ns) = setup_graph(&catalog, &mut wtxn, "g");
    let mut seen = Vec::new();
    for i in 0..8 {
        let name = format!("label_{i}");
        let rel = add_relation(&catalog, &mut wtxn, ns, &name);
        let id = catalog
            .register_label(&mut wtxn, graph, &name, LabelKind::Vertex, rel)
            .unwrap();
        assert!((1..=8).contains(&id));
        assert!(!seen.contains(&id), "id {id} handed out twice");
        seen.push(id);
    }
}

#[test]
fn test_exhausted_id_space_reported() {
    let (catalog, _ctx) = create_test_catalog_with_label_id_max(3);
    let mut wtxn = catalog.write_txn().unwrap();

    let (graph, ns) = setup_graph(&catalog, &mut wtxn, "g");
    for name in ["a", "b", "c"] {
        let rel = add_relation(&catalog, &mut wtxn, ns, name);
        catalog
            .register_label(&mut wtxn, graph, name, LabelKind::Vertex, rel)
            .unwrap();
    }

    // Every value of the cycle is taken; the allocator probes one full
    // cycle and then gives up instead of looping forever.
    let rel = add_relation(&catalog, &mut wtxn, ns, "d");
    let err = catalog
        .register_label(&mut wtxn, graph, "d", LabelKind::Vertex, rel)
        .unwrap_err();
    assert!(matches!(err, Error::LabelIdSpaceExhausted(_)));
}

#[test]
fn test_wraparound_reuses_free_ids() {
    let (catalog, _ctx) = create_test_catalog_with_label_id_max(3);
    let mut wtxn = catalog.write_txn().unwrap();

    let (graph, ns) = setup_graph(&catalog, &mut wtxn, "g");

    // Burn the first two sequence values without assigning them, the way
    // aborted registrations would, so the cycle wraps while 1 and 2 are
    // still free.
    catalog.namespaces().sequence_next(&mut wtxn, ns).unwrap();
    catalog.namespaces().sequence_next(&mut wtxn, ns).unwrap();

    let rel = add_relation(&catalog, &mut wtxn, ns, "a");
    let id_a = catalog
        .register_label(&mut wtxn, graph, "a", LabelKind::Vertex, rel)
        .unwrap();
    assert_eq!(id_a, 3);

    // The sequence wrapped back to 1, which is unused, so it is handed out.
    let rel = add_relation(&catalog, &mut wtxn, ns, "b");
    let id_b = catalog
        .register_label(&mut wtxn, graph, "b", LabelKind::Vertex, rel)
        .unwrap();
    assert_eq!(id_b, 1);
}

#[test]
fn test_allocator_skips_ids_in_use() {
    let (catalog, _ctx) = create_test_catalog_with_label_id_max(4);
    let mut wtxn = catalog.write_txn().unwrap();

    let (graph, ns) = setup_graph(&catalog, &mut wtxn, "g");
    for name in ["a", "b", "c"] {
        let rel = add_relation(&catalog, &mut wtxn, ns, name);
        catalog
            .register_label(&mut wtxn, graph, name, LabelKind::Vertex, rel)
            .unwrap();
    }
    // Ids 1..3 are taken and the sequence sits at 4. Burn 4 so the next
    // registration starts its probe run at 1 and has to skip the whole
    // occupied prefix before reaching the one free id.
    catalog.namespaces().sequence_next(&mut wtxn, ns).unwrap();

    let rel = add_relation(&catalog, &mut wtxn, ns, "d");
    let id = catalog
        .register_label(&mut wtxn, graph, "d", LabelKind::Vertex, rel)
        .unwrap();
    // 1, 2, 3 are skipped as in use; 4 is free and assigned.
    assert_eq!(id, 4);
}

#[test]
fn test_label_ids_isolated_per_graph() {
    let (catalog, _ctx) = create_test_catalog();
    let mut wtxn = catalog.write_txn().unwrap();

    let (g1, ns1) = setup_graph(&catalog, &mut wtxn, "g1");
    let (g2, ns2) = setup_graph(&catalog, &mut wtxn, "g2");

    let rel1 = add_relation(&catalog, &mut wtxn, ns1, "person");
    let rel2 = add_relation(&catalog, &mut wtxn, ns2, "person");

    let id1 = catalog
        .register_label(&mut wtxn, g1, "person", LabelKind::Vertex, rel1)
        .unwrap();
    let id2 = catalog
        .register_label(&mut wtxn, g2, "person", LabelKind::Vertex, rel2)
        .unwrap();

    // Uniqueness is per graph, not global: both graphs get id 1.
    assert_eq!(id1, 1);
    assert_eq!(id2, 1);
    assert!(catalog.label_id_in_use(&wtxn, g1, 1).unwrap());
    assert!(catalog.label_id_in_use(&wtxn, g2, 1).unwrap());
}

#[test]
fn test_aborted_registration_commits_nothing() {
    let (catalog, _ctx) = create_test_catalog();

    let graph = {
        let mut wtxn = catalog.write_txn().unwrap();
        let (graph, _ns) = setup_graph(&catalog, &mut wtxn, "g");
        wtxn.commit().unwrap();
        graph
    };

    let mut wtxn = catalog.write_txn().unwrap();
    let ns = catalog.get_graph_namespace(&wtxn, "g").unwrap().unwrap();
    let rel = add_relation(&catalog, &mut wtxn, ns, "person");
    catalog
        .register_label(&mut wtxn, graph, "person", LabelKind::Vertex, rel)
        .unwrap();
    assert!(catalog.label_exists(&wtxn, graph, "person").unwrap());
    drop(wtxn);

    let rtxn = catalog.read_txn().unwrap();
    assert!(!catalog.label_exists(&rtxn, graph, "person").unwrap());
    assert!(!catalog.label_id_in_use(&rtxn, graph, 1).unwrap());
    assert_eq!(catalog.namespaces().relation_count(&rtxn, ns).unwrap(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Registering any number of labels up to the bound always yields
    /// pairwise distinct ids inside [1, max].
    #[test]
    fn prop_allocated_ids_unique_within_bound(max in 2i32..16, extra_draws in 0usize..8) {
        let (catalog, _ctx) = create_test_catalog_with_label_id_max(max);
        let mut wtxn = catalog.write_txn().unwrap();

        let (graph, ns) = setup_graph(&catalog, &mut wtxn, "g");

        // Arbitrary sequence pre-advance; allocation must stay correct
        // regardless of where the cycle currently sits.
        for _ in 0..extra_draws {
            catalog.namespaces().sequence_next(&mut wtxn, ns).unwrap();
        }

        let mut seen = std::collections::HashSet::new();
        for i in 0..max {
            let name = format!("label_{i}");
            let rel = add_relation(&catalog, &mut wtxn, ns, &name);
            let id = catalog
                .register_label(&mut wtxn, graph, &name, LabelKind::Vertex, rel)
                .unwrap();
            prop_assert!((1..=max).contains(&id));
            prop_assert!(seen.insert(id), "id {} handed out twice", id);
        }
    }
}
