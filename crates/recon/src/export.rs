//! Graph export: the reconciled graph in renderer-neutral form.
//!
//! Nodes are ordered by identifier and attributes by attribute identifier.
//! Edges are ordered by (source, target) and otherwise keep foreign-key row
//! order, so exporting unchanged input twice is byte-identical.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::ReconError;
use crate::graph::EntityNode;
use crate::model::RelationshipKind;
use crate::reconcile::ReconciledGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Entity,
    Attribute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Exactly one system.
    Assigned,
    /// No system.
    Unassigned,
    /// Two or more systems.
    Conflicting,
}

impl NodeStatus {
    fn of(systems: &BTreeSet<String>) -> Self {
        match systems.len() {
            0 => Self::Unassigned,
            1 => Self::Assigned,
            _ => Self::Conflicting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDescriptor {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub data_type: String,
    pub primary_key: bool,
    pub status: NodeStatus,
    pub systems: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDescriptor {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: NodeStatus,
    pub systems: Vec<String>,
    pub attributes: Vec<AttributeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeDescriptor {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_attribute: Option<String>,
    pub kind: RelationshipKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeDescriptor>,
    pub edges: Vec<EdgeDescriptor>,
}

impl GraphExport {
    pub fn to_json(&self) -> Result<String, ReconError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ReconError::Io(format!("JSON serialization error: {e}")))
    }
}

pub fn export(graph: &ReconciledGraph) -> GraphExport {
    let model = graph.graph();

    let nodes = model
        .nodes()
        .map(|node| {
            let id = &node.entity.id;
            let systems = graph.entity_systems(id);
            NodeDescriptor {
                id: id.clone(),
                label: node.entity.label.clone(),
                kind: NodeKind::Entity,
                description: node.entity.description.clone(),
                status: NodeStatus::of(systems),
                systems: systems.iter().cloned().collect(),
                attributes: node
                    .attributes
                    .values()
                    .map(|attr| {
                        let systems = graph.attribute_systems(id, &attr.id);
                        AttributeDescriptor {
                            id: attr.id.clone(),
                            label: attr.display_label().to_string(),
                            kind: NodeKind::Attribute,
                            data_type: attr.data_type.clone(),
                            primary_key: attr.primary_key,
                            status: NodeStatus::of(systems),
                            systems: systems.iter().cloned().collect(),
                        }
                    })
                    .collect(),
            }
        })
        .collect();

    let mut edges: Vec<EdgeDescriptor> = model
        .edges()
        .iter()
        .map(|edge| EdgeDescriptor {
            source: edge.source.clone(),
            target: edge.target.clone(),
            source_attribute: attribute_label(model.node(&edge.source), edge.source_attribute.as_deref()),
            target_attribute: attribute_label(model.node(&edge.target), edge.target_attribute.as_deref()),
            kind: edge.kind,
        })
        .collect();
    edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

    GraphExport { nodes, edges }
}

/// Display label for an edge's attribute reference; unknown references are
/// passed through verbatim.
fn attribute_label(node: Option<&EntityNode>, reference: Option<&str>) -> Option<String> {
    let reference = reference?;
    let label = node
        .and_then(|n| n.attributes.get(reference))
        .map(|a| a.display_label())
        .unwrap_or(reference);
    Some(label.to_string())
}
