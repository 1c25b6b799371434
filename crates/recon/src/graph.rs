//! Model graph builder: Entity/Column/Foreign-Key records → directed multigraph.
//!
//! Entities are nodes keyed by identifier; attributes hang off their owning
//! node; every foreign key whose endpoints both resolve becomes an edge,
//! oriented parent -> child. Parallel edges and self-loops are kept as-is.

use std::collections::{BTreeMap, HashMap};

use crate::finding::{FindingKind, Findings};
use crate::model::{Attribute, Entity, Relationship, RelationshipKind};

#[derive(Debug, Clone, PartialEq)]
pub struct EntityNode {
    pub entity: Entity,
    /// Attributes keyed by attribute identifier.
    pub attributes: BTreeMap<String, Attribute>,
}

impl EntityNode {
    pub fn attribute_ids(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Find an attribute of this entity by id, or by its label when
    /// `by_label` is set and exactly one attribute carries it.
    pub fn resolve_attribute(&self, reference: &str, by_label: bool) -> Option<&str> {
        if let Some((id, _)) = self.attributes.get_key_value(reference) {
            return Some(id);
        }
        if !by_label {
            return None;
        }
        let mut hits = self
            .attributes
            .values()
            .filter(|a| a.label.as_deref() == Some(reference));
        match (hits.next(), hits.next()) {
            (Some(a), None) => Some(&a.id),
            _ => None,
        }
    }
}

/// Parent -> child link. The attribute ids travel with their endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub source_attribute: Option<String>,
    pub target_attribute: Option<String>,
    pub kind: RelationshipKind,
}

#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    nodes: BTreeMap<String, EntityNode>,
    /// Edges in foreign-key row order.
    edges: Vec<Edge>,
    /// label → entity id; `None` marks a label shared by several entities.
    labels: HashMap<String, Option<String>>,
    resolve_labels: bool,
}

impl ModelGraph {
    pub fn build(
        entities: Vec<Entity>,
        attributes: Vec<Attribute>,
        relationships: Vec<Relationship>,
        resolve_labels: bool,
        findings: &mut Findings,
    ) -> Self {
        let mut graph = Self {
            resolve_labels,
            ..Self::default()
        };

        // 1) Index entities.
        for entity in entities {
            if graph.nodes.contains_key(&entity.id) {
                continue;
            }
            graph
                .labels
                .entry(entity.label.clone())
                .and_modify(|owner| *owner = None)
                .or_insert_with(|| Some(entity.id.clone()));
            graph.nodes.insert(
                entity.id.clone(),
                EntityNode {
                    entity,
                    attributes: BTreeMap::new(),
                },
            );
        }

        // 2) Attach attributes to their owners.
        for mut attribute in attributes {
            match graph.resolve(&attribute.owner).map(str::to_string) {
                Some(owner) => {
                    attribute.owner = owner.clone();
                    if let Some(node) = graph.nodes.get_mut(&owner) {
                        node.attributes.entry(attribute.id.clone()).or_insert(attribute);
                    }
                }
                None => findings.push(
                    FindingKind::OrphanAttribute,
                    vec![attribute.id.clone(), attribute.owner.clone()],
                    format!(
                        "attribute '{}' belongs to unknown entity '{}'",
                        attribute.id, attribute.owner
                    ),
                ),
            }
        }

        // 3) Foreign keys become edges when both endpoints resolve.
        for rel in relationships {
            let source = graph.resolve(&rel.source).map(str::to_string);
            let target = graph.resolve(&rel.target).map(str::to_string);
            match (source, target) {
                (Some(source), Some(target)) => {
                    let kind = rel.kind();
                    // Edges run parent -> child. An identifying key's parent is
                    // the referenced table; otherwise the referencing table is.
                    let edge = if kind == RelationshipKind::Standard {
                        Edge {
                            source: target,
                            target: source,
                            source_attribute: rel.target_attribute,
                            target_attribute: rel.source_attribute,
                            kind,
                        }
                    } else {
                        Edge {
                            source,
                            target,
                            source_attribute: rel.source_attribute,
                            target_attribute: rel.target_attribute,
                            kind,
                        }
                    };
                    graph.edges.push(edge);
                }
                (source, target) => {
                    let mut missing = Vec::new();
                    if source.is_none() {
                        missing.push(rel.source.clone());
                    }
                    if target.is_none() && (source.is_some() || rel.target != rel.source) {
                        missing.push(rel.target.clone());
                    }
                    findings.push(
                        FindingKind::MissingRelationshipTarget,
                        missing.clone(),
                        format!(
                            "relationship '{}' -> '{}' references unknown entity {}",
                            rel.source,
                            rel.target,
                            quoted(&missing)
                        ),
                    );
                }
            }
        }

        log::debug!(
            "model graph: {} node(s), {} edge(s)",
            graph.nodes.len(),
            graph.edges.len()
        );
        graph
    }

    /// Canonical entity id for a reference: an exact identifier match, or a
    /// unique label when label resolution is enabled.
    pub fn resolve(&self, reference: &str) -> Option<&str> {
        if let Some((id, _)) = self.nodes.get_key_value(reference) {
            return Some(id);
        }
        if !self.resolve_labels {
            return None;
        }
        self.labels.get(reference).and_then(|id| id.as_deref())
    }

    pub fn resolves_labels(&self) -> bool {
        self.resolve_labels
    }

    pub fn node(&self, id: &str) -> Option<&EntityNode> {
        self.nodes.get(id)
    }

    /// Nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &EntityNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn entity_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn attribute_count(&self) -> usize {
        self.nodes.values().map(|n| n.attributes.len()).sum()
    }
}

fn quoted(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("'{id}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, label: &str) -> Entity {
        Entity {
            id: id.into(),
            label: label.into(),
            description: None,
        }
    }

    fn attribute(id: &str, owner: &str) -> Attribute {
        Attribute {
            id: id.into(),
            owner: owner.into(),
            data_type: "varchar".into(),
            label: Some(format!("{id} label")),
            description: None,
            primary_key: false,
        }
    }

    fn rel(source: &str, target: &str) -> Relationship {
        Relationship {
            source: source.into(),
            target: target.into(),
            source_attribute: None,
            target_attribute: None,
            identifying: None,
        }
    }

    #[test]
    fn missing_target_drops_edge_with_one_finding() {
        let mut findings = Findings::new();
        let graph = ModelGraph::build(
            vec![entity("E1", "Pump"), entity("E2", "Valve")],
            vec![],
            vec![rel("E1", "E3")],
            false,
            &mut findings,
        );
        assert_eq!(graph.entity_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        let items = findings.into_vec();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, FindingKind::MissingRelationshipTarget);
        assert_eq!(items[0].ids, vec!["E3".to_string()]);
    }

    #[test]
    fn both_endpoints_missing_is_still_one_finding() {
        let mut findings = Findings::new();
        ModelGraph::build(vec![], vec![], vec![rel("X", "Y"), rel("Z", "Z")], false, &mut findings);
        let items = findings.into_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].ids, vec!["X".to_string(), "Y".to_string()]);
        assert_eq!(items[1].ids, vec!["Z".to_string()]);
    }

    #[test]
    fn multi_edges_and_self_loops_are_kept() {
        let mut findings = Findings::new();
        let graph = ModelGraph::build(
            vec![entity("E1", "Pump"), entity("E2", "Valve")],
            vec![],
            vec![rel("E1", "E2"), rel("E1", "E2"), rel("E2", "E2")],
            false,
            &mut findings,
        );
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edges()[2].source, graph.edges()[2].target);
        assert!(findings.is_empty());
    }

    #[test]
    fn identifying_flag_orients_edges_parent_to_child() {
        let keyed = |identifying: Option<bool>| Relationship {
            source: "2".into(),
            target: "1".into(),
            source_attribute: Some("A2".into()),
            target_attribute: Some("A1".into()),
            identifying,
        };
        let mut findings = Findings::new();
        let graph = ModelGraph::build(
            vec![entity("1", "Pump"), entity("2", "Valve")],
            vec![],
            vec![keyed(Some(true)), keyed(Some(false)), keyed(None)],
            false,
            &mut findings,
        );

        let edges: Vec<_> = graph
            .edges()
            .iter()
            .map(|e| {
                (
                    e.source.as_str(),
                    e.target.as_str(),
                    e.source_attribute.as_deref(),
                    e.target_attribute.as_deref(),
                    e.kind,
                )
            })
            .collect();
        assert_eq!(
            edges,
            vec![
                ("1", "2", Some("A1"), Some("A2"), RelationshipKind::Standard),
                ("2", "1", Some("A2"), Some("A1"), RelationshipKind::ReferenceData),
                ("2", "1", Some("A2"), Some("A1"), RelationshipKind::Unspecified),
            ]
        );
    }

    #[test]
    fn orphan_attribute_is_reported_and_excluded() {
        let mut findings = Findings::new();
        let graph = ModelGraph::build(
            vec![entity("E1", "Pump")],
            vec![attribute("A1", "E1"), attribute("A2", "E9")],
            vec![],
            false,
            &mut findings,
        );
        let node = graph.node("E1").unwrap();
        assert_eq!(node.attribute_ids().collect::<Vec<_>>(), vec!["A1"]);
        assert_eq!(graph.attribute_count(), 1);
        let items = findings.into_vec();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, FindingKind::OrphanAttribute);
        assert_eq!(items[0].ids, vec!["A2".to_string(), "E9".to_string()]);
    }

    #[test]
    fn label_resolution_is_opt_in_and_requires_unique_label() {
        let entities = || vec![entity("1", "Pump"), entity("2", "Valve"), entity("3", "Valve")];
        let attrs = || vec![attribute("A1", "Pump"), attribute("A2", "Valve")];

        let mut findings = Findings::new();
        let graph = ModelGraph::build(entities(), attrs(), vec![], false, &mut findings);
        assert_eq!(graph.attribute_count(), 0);
        assert_eq!(findings.count(FindingKind::OrphanAttribute), 2);

        let mut findings = Findings::new();
        let graph = ModelGraph::build(entities(), attrs(), vec![rel("Pump", "1")], true, &mut findings);
        assert_eq!(graph.node("1").unwrap().attributes["A1"].owner, "1");
        assert_eq!(graph.edges()[0].source, "1");
        // "Valve" is ambiguous.
        assert_eq!(findings.count(FindingKind::OrphanAttribute), 1);
    }

    #[test]
    fn identifier_match_beats_label_match() {
        let mut findings = Findings::new();
        let graph = ModelGraph::build(
            vec![entity("Pump", "Valve"), entity("Valve", "Pump")],
            vec![],
            vec![],
            true,
            &mut findings,
        );
        assert_eq!(graph.resolve("Pump"), Some("Pump"));
        assert_eq!(graph.resolve("Valve"), Some("Valve"));
    }

    #[test]
    fn attribute_label_lookup() {
        let mut node = EntityNode {
            entity: entity("E1", "Pump"),
            attributes: BTreeMap::new(),
        };
        node.attributes.insert("A1".into(), attribute("A1", "E1"));
        assert_eq!(node.resolve_attribute("A1", false), Some("A1"));
        assert_eq!(node.resolve_attribute("A1 label", false), None);
        assert_eq!(node.resolve_attribute("A1 label", true), Some("A1"));
    }
}
