use proofviz_model::{
    DependencyEdge, DependencyEmbedding, DependencyItem, Family, Kind, NodeType, Position,
    ProofStepEdge, ProofStepNode, TheoremEntry,
};
use proofviz_validate::{
    check_dependency_embedding, check_theorem_entry, validate_theorem_entry, RootPolicy,
    ValidationError, ValidationOptions,
};
use proptest::prelude::*;

fn graph(count: usize, edges: Vec<(usize, usize)>) -> TheoremEntry {
    TheoremEntry {
        name: "generated".to_string(),
        file: "Proofs/Generated.lean".to_string(),
        description: String::new(),
        statement: String::new(),
        nodes: (0..count)
            .map(|idx| ProofStepNode {
                id: format!("n{idx}"),
                node_type: if idx == 0 { NodeType::Goal } else { NodeType::Tactic },
                label: format!("step {idx}"),
                depth: idx as u32,
            })
            .collect(),
        edges: edges
            .into_iter()
            .map(|(from, to)| ProofStepEdge::new(format!("n{from}"), format!("n{to}")))
            .collect(),
    }
}

/// A DAG rooted at `n0`: every other node gets a parent declared before it.
fn rooted_dag() -> impl Strategy<Value = TheoremEntry> {
    (2usize..16)
        .prop_flat_map(|count| {
            let parents: Vec<_> = (1..count).map(|child| 0..child).collect();
            let extras = proptest::collection::vec((0..count, 0..count), 0..count);
            (Just(count), parents, extras)
        })
        .prop_map(|(count, parents, extras)| {
            let mut edges: Vec<(usize, usize)> = parents
                .into_iter()
                .enumerate()
                .map(|(offset, parent)| (parent, offset + 1))
                .collect();
            edges.extend(
                extras
                    .into_iter()
                    .filter(|(a, b)| a != b)
                    .map(|(a, b)| (a.min(b), a.max(b))),
            );
            graph(count, edges)
        })
}

fn items(count: usize) -> Vec<DependencyItem> {
    (0..count)
        .map(|idx| DependencyItem {
            name: format!("c{idx}"),
            kind: Kind::Def,
            family: Family::from("Core"),
            pos: Position::new(0.5, 0.5, 0.5),
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_valid_graph_is_returned_unchanged(entry in rooted_dag()) {
        let options = ValidationOptions { root_policy: RootPolicy::Single };
        let validated = validate_theorem_entry(entry.clone(), &options).unwrap();
        prop_assert_eq!(&validated, &entry);

        let summary = check_theorem_entry(&entry, &options).unwrap();
        prop_assert_eq!(summary.roots, vec!["n0".to_string()]);
        prop_assert_eq!(summary.topological_order.len(), entry.nodes.len());
    }

    #[test]
    fn prop_topological_order_respects_edges(entry in rooted_dag()) {
        let summary = check_theorem_entry(&entry, &ValidationOptions::default()).unwrap();
        let position = |id: &str| summary.topological_order.iter().position(|other| other == id).unwrap();
        for edge in &entry.edges {
            prop_assert!(position(edge.from.as_str()) < position(edge.to.as_str()));
        }
    }

    #[test]
    fn prop_duplicate_id_is_rejected(entry in rooted_dag(), pick in any::<prop::sample::Index>()) {
        let mut entry = entry;
        let copy = entry.nodes[pick.index(entry.nodes.len())].clone();
        entry.nodes.push(copy);
        let err = check_theorem_entry(&entry, &ValidationOptions::default()).unwrap_err();
        let is_duplicate = matches!(err, ValidationError::DuplicateNodeId { .. });
        prop_assert!(is_duplicate);
    }

    #[test]
    fn prop_back_edge_is_a_cycle(entry in rooted_dag(), pick in any::<prop::sample::Index>()) {
        let mut entry = entry;
        let edge = entry.edges[pick.index(entry.edges.len())].clone();
        entry.edges.push(ProofStepEdge::new(edge.to, edge.from));
        let err = check_theorem_entry(&entry, &ValidationOptions::default()).unwrap_err();
        let is_cycle = matches!(err, ValidationError::CycleDetected { .. });
        prop_assert!(is_cycle);
    }

    #[test]
    fn prop_out_of_range_index_is_rejected(count in 0usize..12, over in 0usize..8, as_source: bool) {
        let bad = (count + over) as i64;
        let edge = if as_source { DependencyEdge::new(bad, 0) } else { DependencyEdge::new(0, bad) };
        let doc = DependencyEmbedding {
            items: items(count),
            edges: vec![edge],
            kind_shapes: None,
            family_colors: None,
        };
        let err = check_dependency_embedding(&doc).unwrap_err();
        let is_out_of_range = matches!(err, ValidationError::IndexOutOfRange { .. });
        prop_assert!(is_out_of_range);
    }

    #[test]
    fn prop_in_range_edges_are_accepted(count in 1usize..12, raw in proptest::collection::vec((0usize..64, 0usize..64), 0..24)) {
        let doc = DependencyEmbedding {
            items: items(count),
            edges: raw.into_iter().map(|(a, b)| DependencyEdge::new((a % count) as i64, (b % count) as i64)).collect(),
            kind_shapes: None,
            family_colors: None,
        };
        prop_assert!(check_dependency_embedding(&doc).is_ok());
    }

    #[test]
    fn prop_negative_index_is_rejected(count in 1usize..12, index in i64::MIN..0, as_source: bool) {
        let edge = if as_source { DependencyEdge::new(index, 0) } else { DependencyEdge::new(0, index) };
        let doc = DependencyEmbedding {
            items: items(count),
            edges: vec![edge],
            kind_shapes: None,
            family_colors: None,
        };
        let err = check_dependency_embedding(&doc).unwrap_err();
        prop_assert_eq!(err, ValidationError::IndexOutOfRange { edge: 0, index, len: count });
    }
}
