// Property-based tests for graph building and reconciliation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use bimgraph_recon::export::NodeStatus;
use bimgraph_recon::{run, FindingKind, LoadConfig, LoadInput, Table};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

const SYSTEMS: [&str; 4] = ["HVAC", "Electrical", "Plumbing", "Mechanical"];

/// A generated model: `entities` ids exist as E0..E{n}; references are drawn
/// from a wider pool so some of them dangle.
#[derive(Debug, Clone)]
struct Model {
    entities: usize,
    attributes: Vec<(usize, usize)>,
    relationships: Vec<(usize, usize, Option<bool>)>,
    assignments: Vec<(usize, Option<usize>, usize)>,
}

fn arb_model() -> impl Strategy<Value = Model> {
    (1usize..8).prop_flat_map(|n| {
        let pool = n + 3;
        (
            Just(n),
            proptest::collection::vec((0..pool, 0usize..3), 0..12),
            proptest::collection::vec((0..pool, 0..pool, proptest::option::of(any::<bool>())), 0..16),
            proptest::collection::vec(
                (0..pool, proptest::option::of(0usize..3), 0..SYSTEMS.len()),
                0..20,
            ),
        )
            .prop_map(|(entities, attributes, relationships, assignments)| Model {
                entities,
                attributes,
                relationships,
                assignments,
            })
    })
}

fn entity_id(i: usize) -> String {
    format!("E{i}")
}

/// Attribute ids are unique per sheet: A{owner}_{slot}.
fn attribute_id(owner: usize, slot: usize) -> String {
    format!("A{owner}_{slot}")
}

fn build_input(model: &Model) -> LoadInput {
    let entity_rows: Vec<Vec<String>> = (0..model.entities)
        .map(|i| vec![entity_id(i), format!("Entity {i}")])
        .collect();

    let mut seen = BTreeSet::new();
    let column_rows: Vec<Vec<String>> = model
        .attributes
        .iter()
        .filter(|key| seen.insert(**key))
        .map(|&(owner, slot)| vec![attribute_id(owner, slot), entity_id(owner), "int".to_string()])
        .collect();

    let fk_rows: Vec<Vec<String>> = model
        .relationships
        .iter()
        .map(|&(s, t, identifying)| {
            let flag = match identifying {
                Some(true) => "Yes",
                Some(false) => "No",
                None => "",
            };
            vec![entity_id(s), entity_id(t), flag.to_string()]
        })
        .collect();

    let linear_rows: Vec<Vec<String>> = model
        .assignments
        .iter()
        .map(|&(object, slot, system)| {
            vec![
                entity_id(object),
                slot.map(|s| attribute_id(object, s)).unwrap_or_default(),
                SYSTEMS[system].to_string(),
            ]
        })
        .collect();

    LoadInput {
        entity: Some(Table::from_rows(["ID", "Name"], entity_rows)),
        column: Some(Table::from_rows(["ID", "Parent Name", "Data Type"], column_rows)),
        foreign_key: Some(Table::from_rows(["Table", "Reference", "Identifying"], fk_rows)),
        linear: Some(Table::from_rows(
            ["BIM Object", "BIM Attribute", "Source System"],
            linear_rows,
        )),
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn edges_never_dangle(model in arb_model()) {
        let loaded = run(&LoadConfig::default(), &build_input(&model)).unwrap();
        let graph = loaded.export();
        let ids: BTreeSet<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &graph.edges {
            prop_assert!(ids.contains(edge.source.as_str()));
            prop_assert!(ids.contains(edge.target.as_str()));
        }
    }

    #[test]
    fn every_relationship_is_an_edge_or_a_finding(model in arb_model()) {
        let loaded = run(&LoadConfig::default(), &build_input(&model)).unwrap();
        let missing = loaded.findings.iter()
            .filter(|f| f.kind == FindingKind::MissingRelationshipTarget)
            .count();
        let dangling = model.relationships.iter()
            .filter(|&&(s, t, _)| s >= model.entities || t >= model.entities)
            .count();
        prop_assert_eq!(missing, dangling);
        prop_assert_eq!(loaded.export().edges.len() + missing, model.relationships.len());
    }

    #[test]
    fn one_mismatch_per_conflicting_node(model in arb_model()) {
        let loaded = run(&LoadConfig::default(), &build_input(&model)).unwrap();
        let graph = loaded.export();
        let conflicting = graph.nodes.iter()
            .map(|n| {
                usize::from(n.status == NodeStatus::Conflicting)
                    + n.attributes.iter().filter(|a| a.status == NodeStatus::Conflicting).count()
            })
            .sum::<usize>();
        prop_assert_eq!(loaded.qa.finding_count(FindingKind::SystemMismatch), conflicting);
    }

    #[test]
    fn export_is_deterministic(model in arb_model()) {
        let input = build_input(&model);
        let first = run(&LoadConfig::default(), &input).unwrap();
        let second = run(&LoadConfig::default(), &input).unwrap();
        prop_assert_eq!(first.export().to_json().unwrap(), second.export().to_json().unwrap());
        prop_assert_eq!(first.findings, second.findings);
    }

    #[test]
    fn qa_partitions_entities_and_attributes(model in arb_model()) {
        let loaded = run(&LoadConfig::default(), &build_input(&model)).unwrap();
        let qa = &loaded.qa;
        prop_assert_eq!(qa.entity_count, model.entities);
        prop_assert_eq!(qa.entities_assigned + qa.entities_unassigned, qa.entity_count);
        prop_assert_eq!(qa.attributes_assigned + qa.attributes_unassigned, qa.attribute_count);
        prop_assert_eq!(qa.unassigned_entities.len(), qa.entities_unassigned);
        prop_assert_eq!(qa.total_findings(), loaded.findings.len());
    }
}
