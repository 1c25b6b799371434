//! System reconciler: Linear ownership facts → annotated graph + findings.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::finding::{FindingKind, Findings};
use crate::graph::ModelGraph;
use crate::model::SystemAssignment;

static NO_SYSTEMS: BTreeSet<String> = BTreeSet::new();

/// The model graph plus the distinct systems claiming each entity and
/// attribute.
#[derive(Debug, Clone, Default)]
pub struct ReconciledGraph {
    graph: ModelGraph,
    entity_systems: BTreeMap<String, BTreeSet<String>>,
    /// Keyed by (entity id, attribute id).
    attribute_systems: BTreeMap<(String, String), BTreeSet<String>>,
}

impl ReconciledGraph {
    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    pub fn entity_systems(&self, entity: &str) -> &BTreeSet<String> {
        self.entity_systems.get(entity).unwrap_or(&NO_SYSTEMS)
    }

    pub fn attribute_systems(&self, entity: &str, attribute: &str) -> &BTreeSet<String> {
        self.attribute_systems
            .get(&(entity.to_string(), attribute.to_string()))
            .unwrap_or(&NO_SYSTEMS)
    }
}

/// Annotate `graph` with `assignments`.
///
/// An assignment without an attribute claims the entity whose id equals its
/// object; with an attribute it claims that attribute of that entity. An
/// assignment that matches nothing is reported once per distinct reference
/// as `UnassignedEntity`. Each entity or attribute ending up with two or
/// more systems gets exactly one `SystemMismatch`.
pub fn reconcile(
    graph: ModelGraph,
    assignments: &[SystemAssignment],
    findings: &mut Findings,
) -> ReconciledGraph {
    let mut entity_systems: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut attribute_systems: BTreeMap<(String, String), BTreeSet<String>> = BTreeMap::new();
    let mut reported: HashSet<(String, Option<String>)> = HashSet::new();
    let by_label = graph.resolves_labels();

    for a in assignments {
        let object = a.object.trim();
        let attribute = a.attribute.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let system = a.system.trim().to_string();

        let Some(entity_id) = graph.resolve(object) else {
            if reported.insert((object.to_string(), attribute.map(str::to_string))) {
                let mut ids = vec![object.to_string()];
                ids.extend(attribute.map(str::to_string));
                findings.push(
                    FindingKind::UnassignedEntity,
                    ids,
                    format!("'{system}' claims unknown object '{object}'"),
                );
            }
            continue;
        };

        match attribute {
            None => {
                entity_systems
                    .entry(entity_id.to_string())
                    .or_default()
                    .insert(system);
            }
            Some(attr) => {
                let resolved = graph
                    .node(entity_id)
                    .and_then(|node| node.resolve_attribute(attr, by_label));
                match resolved {
                    Some(attr_id) => {
                        attribute_systems
                            .entry((entity_id.to_string(), attr_id.to_string()))
                            .or_default()
                            .insert(system);
                    }
                    None => {
                        if reported.insert((object.to_string(), Some(attr.to_string()))) {
                            findings.push(
                                FindingKind::UnassignedEntity,
                                vec![object.to_string(), attr.to_string()],
                                format!(
                                    "'{system}' claims attribute '{attr}' which entity '{entity_id}' does not have"
                                ),
                            );
                        }
                    }
                }
            }
        }
    }

    // Mismatches in node order: each entity, then its attributes.
    for node in graph.nodes() {
        let id = &node.entity.id;
        if let Some(systems) = entity_systems.get(id).filter(|s| s.len() > 1) {
            findings.push(
                FindingKind::SystemMismatch,
                vec![id.clone()],
                format!(
                    "entity '{id}' is claimed by {} systems: {}",
                    systems.len(),
                    join(systems)
                ),
            );
        }
        for attr_id in node.attribute_ids() {
            let key = (id.clone(), attr_id.to_string());
            if let Some(systems) = attribute_systems.get(&key).filter(|s| s.len() > 1) {
                findings.push(
                    FindingKind::SystemMismatch,
                    vec![id.clone(), attr_id.to_string()],
                    format!(
                        "attribute '{attr_id}' of entity '{id}' is claimed by {} systems: {}",
                        systems.len(),
                        join(systems)
                    ),
                );
            }
        }
    }

    log::debug!(
        "reconciled {} assignment(s): {} entity and {} attribute annotation(s)",
        assignments.len(),
        entity_systems.len(),
        attribute_systems.len()
    );

    ReconciledGraph {
        graph,
        entity_systems,
        attribute_systems,
    }
}

fn join(systems: &BTreeSet<String>) -> String {
    systems.iter().cloned().collect::<Vec<_>>().join(", ")
}
