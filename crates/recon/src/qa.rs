use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::QaConfig;
use crate::finding::{Finding, FindingKind};
use crate::reconcile::ReconciledGraph;

/// Bucket used in the system distribution for entities no system claims.
pub const UNASSIGNED: &str = "unassigned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeRef {
    pub entity: String,
    pub attribute: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityAttributeCount {
    pub entity: String,
    pub label: String,
    pub attributes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaReport {
    pub entity_count: usize,
    pub relationship_count: usize,
    pub entities_assigned: usize,
    pub entities_unassigned: usize,
    pub attribute_count: usize,
    pub attributes_assigned: usize,
    pub attributes_unassigned: usize,
    /// Every finding kind is present, zero or not.
    pub findings_by_kind: BTreeMap<String, usize>,
    pub unassigned_entities: Vec<String>,
    pub unassigned_attributes: Vec<AttributeRef>,
    /// Entities per system. A conflicting entity counts toward each of its
    /// systems; unclaimed entities count toward `unassigned`.
    pub system_distribution: BTreeMap<String, usize>,
    pub relationship_kinds: BTreeMap<String, usize>,
    pub top_entities_by_attributes: Vec<EntityAttributeCount>,
}

impl QaReport {
    pub fn finding_count(&self, kind: FindingKind) -> usize {
        self.findings_by_kind.get(&kind.to_string()).copied().unwrap_or(0)
    }

    pub fn total_findings(&self) -> usize {
        self.findings_by_kind.values().sum()
    }
}

/// Compute QA statistics. Reads only; running it twice on the same input
/// gives the same report.
pub fn analyze(graph: &ReconciledGraph, findings: &[Finding], options: &QaConfig) -> QaReport {
    let model = graph.graph();

    let mut entities_assigned = 0;
    let mut unassigned_entities = Vec::new();
    let mut attributes_assigned = 0;
    let mut unassigned_attributes = Vec::new();
    let mut system_distribution: BTreeMap<String, usize> = BTreeMap::new();
    let mut ranking = Vec::new();

    for node in model.nodes() {
        let id = &node.entity.id;
        let systems = graph.entity_systems(id);
        if systems.is_empty() {
            unassigned_entities.push(id.clone());
            *system_distribution.entry(UNASSIGNED.to_string()).or_insert(0) += 1;
        } else {
            entities_assigned += 1;
            for system in systems {
                *system_distribution.entry(system.clone()).or_insert(0) += 1;
            }
        }

        for attr_id in node.attribute_ids() {
            if graph.attribute_systems(id, attr_id).is_empty() {
                unassigned_attributes.push(AttributeRef {
                    entity: id.clone(),
                    attribute: attr_id.to_string(),
                });
            } else {
                attributes_assigned += 1;
            }
        }

        ranking.push(EntityAttributeCount {
            entity: id.clone(),
            label: node.entity.label.clone(),
            attributes: node.attributes.len(),
        });
    }

    // Most attributes first; ties stay in identifier order (stable sort).
    ranking.sort_by(|a, b| b.attributes.cmp(&a.attributes));
    ranking.truncate(options.top_entities);

    let mut findings_by_kind: BTreeMap<String, usize> =
        FindingKind::ALL.iter().map(|k| (k.to_string(), 0)).collect();
    for f in findings {
        *findings_by_kind.entry(f.kind.to_string()).or_insert(0) += 1;
    }

    let mut relationship_kinds: BTreeMap<String, usize> = BTreeMap::new();
    for edge in model.edges() {
        *relationship_kinds.entry(edge.kind.to_string()).or_insert(0) += 1;
    }

    let attribute_count = model.attribute_count();

    QaReport {
        entity_count: model.entity_count(),
        relationship_count: model.edge_count(),
        entities_assigned,
        entities_unassigned: unassigned_entities.len(),
        attribute_count,
        attributes_assigned,
        attributes_unassigned: attribute_count - attributes_assigned,
        findings_by_kind,
        unassigned_entities,
        unassigned_attributes,
        system_distribution,
        relationship_kinds,
        top_entities_by_attributes: ranking,
    }
}
