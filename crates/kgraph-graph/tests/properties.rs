//! Property-based tests for the graph invariants.

use proptest::prelude::*;

use kgraph_core::{Direction, NodeId, RelationshipType};
use kgraph_graph::KnowledgeGraph;

fn arb_type() -> impl Strategy<Value = RelationshipType> {
    prop::sample::select(RelationshipType::ALL.to_vec())
}

/// Node count plus edges as index pairs into the created nodes.
fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize, RelationshipType)>)> {
    (1usize..8).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n, arb_type()), 0..20),
        )
    })
}

fn build(n: usize, edges: &[(usize, usize, RelationshipType)]) -> (KnowledgeGraph, Vec<NodeId>) {
    let graph = KnowledgeGraph::in_memory().expect("in-memory graph");
    let ids: Vec<NodeId> = (0..n)
        .map(|i| {
            graph
                .mutations()
                .add_node(&format!("node {i}"), None)
                .expect("add node")
                .id
        })
        .collect();
    for (from, to, kind) in edges {
        graph
            .mutations()
            .link_nodes(ids[*from], ids[*to], *kind, None)
            .expect("link");
    }
    (graph, ids)
}

proptest! {
    #[test]
    fn every_link_is_visible_from_both_ends((n, edges) in arb_graph()) {
        let (graph, ids) = build(n, &edges);
        let resolver = graph.resolver();

        for (from, to, kind) in &edges {
            let outgoing = resolver.connections_for(ids[*from]).expect("connections");
            prop_assert!(outgoing.iter().any(|c| c.direction == Direction::Outgoing
                && c.node.id == ids[*to]
                && c.relationship.relationship_type == *kind));

            let incoming = resolver.connections_for(ids[*to]).expect("connections");
            prop_assert!(incoming.iter().any(|c| c.direction == Direction::Incoming
                && c.node.id == ids[*from]
                && c.relationship.relationship_type == *kind));
        }

        let total: usize = ids
            .iter()
            .map(|id| resolver.connections_for(*id).expect("connections").len())
            .sum();
        prop_assert_eq!(total, edges.len() * 2);
    }

    #[test]
    fn delete_node_removes_exactly_its_incident_links(
        (n, edges) in arb_graph(),
        victim in any::<prop::sample::Index>(),
    ) {
        let (graph, ids) = build(n, &edges);
        let victim_idx = victim.index(n);
        let victim = ids[victim_idx];

        let incident = edges
            .iter()
            .filter(|(from, to, _)| *from == victim_idx || *to == victim_idx)
            .count();

        let report = graph.mutations().delete_node(victim).expect("delete");
        prop_assert_eq!(report.removed_relationships.len(), incident);
        prop_assert_eq!(
            graph.relationships().count().expect("count"),
            edges.len() - incident
        );

        for id in ids.iter().filter(|id| **id != victim) {
            for conn in graph.resolver().connections_for(*id).expect("connections") {
                prop_assert_ne!(conn.node.id, victim);
            }
        }
        prop_assert!(graph.relationships().find_by_from(victim).expect("scan").is_empty());
        prop_assert!(graph.relationships().find_by_to(victim).expect("scan").is_empty());
    }

    #[test]
    fn search_matches_case_insensitive_substrings(
        titles in prop::collection::vec("[a-zA-Z ]{1,12}", 1..10),
        query in "[a-zA-Z]{0,3}",
    ) {
        let graph = KnowledgeGraph::in_memory().expect("in-memory graph");
        let mut expected = 0;
        for title in &titles {
            if title.trim().is_empty() {
                continue;
            }
            graph.mutations().add_node(title, None).expect("add node");
            if title.to_lowercase().contains(&query.to_lowercase()) {
                expected += 1;
            }
        }

        let found = graph.mutations().search_nodes(&query).expect("search");
        prop_assert_eq!(found.len(), expected);
        for node in &found {
            prop_assert!(node.title.to_lowercase().contains(&query.to_lowercase()));
        }
        prop_assert!(found.windows(2).all(|w| w[0].id < w[1].id));
    }
}
