use serde::Serialize;

use crate::config::LoadConfig;
use crate::error::ReconError;
use crate::export::{export, GraphExport};
use crate::finding::{Finding, Findings};
use crate::graph::ModelGraph;
use crate::model::{LoadSummary, SheetRole};
use crate::normalize::{
    normalize_assignments, normalize_attributes, normalize_entities, normalize_relationships,
};
use crate::qa::{analyze, QaReport};
use crate::reconcile::{reconcile, ReconciledGraph};
use crate::table::Table;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Pre-loaded sheets for one load. A sheet that was not supplied is `None`
/// and contributes nothing.
#[derive(Debug, Clone, Default)]
pub struct LoadInput {
    pub entity: Option<Table>,
    pub column: Option<Table>,
    pub foreign_key: Option<Table>,
    pub linear: Option<Table>,
}

impl LoadInput {
    pub fn table(&self, role: SheetRole) -> Option<&Table> {
        match role {
            SheetRole::Entity => self.entity.as_ref(),
            SheetRole::Column => self.column.as_ref(),
            SheetRole::ForeignKey => self.foreign_key.as_ref(),
            SheetRole::Linear => self.linear.as_ref(),
        }
    }

    pub fn set(&mut self, role: SheetRole, table: Table) {
        let slot = match role {
            SheetRole::Entity => &mut self.entity,
            SheetRole::Column => &mut self.column,
            SheetRole::ForeignKey => &mut self.foreign_key,
            SheetRole::Linear => &mut self.linear,
        };
        *slot = Some(table);
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadMeta {
    pub name: String,
    pub engine_version: String,
    pub loaded_at: String,
    /// Set when the load is published to a `GraphStore`; 0 otherwise.
    pub generation: u64,
}

/// Everything one load produced. Built whole or not at all.
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub meta: LoadMeta,
    pub summary: LoadSummary,
    pub graph: ReconciledGraph,
    pub findings: Vec<Finding>,
    pub qa: QaReport,
}

impl LoadedGraph {
    pub fn export(&self) -> GraphExport {
        export(&self.graph)
    }

    pub fn report(&self) -> LoadReport {
        LoadReport {
            meta: self.meta.clone(),
            summary: self.summary.clone(),
            qa: self.qa.clone(),
            findings: self.findings.clone(),
            graph: self.export(),
        }
    }
}

/// Serializable form of a load for the QA display and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub meta: LoadMeta,
    pub summary: LoadSummary,
    pub qa: QaReport,
    pub findings: Vec<Finding>,
    pub graph: GraphExport,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run one load: normalize → build → reconcile → analyze.
///
/// All four sheets are normalized before anything is built, so a schema
/// error aborts without producing a graph.
pub fn run(config: &LoadConfig, input: &LoadInput) -> Result<LoadedGraph, ReconError> {
    let empty = Table::default();
    let sheet = |role: SheetRole| input.table(role).unwrap_or(&empty);
    let cols = &config.columns;

    let entities = normalize_entities(sheet(SheetRole::Entity), &cols.entity)?;
    let attributes = normalize_attributes(sheet(SheetRole::Column), &cols.column)?;
    let relationships = normalize_relationships(sheet(SheetRole::ForeignKey), &cols.foreign_key)?;
    let assignments = normalize_assignments(
        sheet(SheetRole::Linear),
        &cols.linear,
        config.matching.skip_prefix(),
    )?;

    let mut summary = LoadSummary::default();
    summary.record(SheetRole::Entity, &entities);
    summary.record(SheetRole::Column, &attributes);
    summary.record(SheetRole::ForeignKey, &relationships);
    summary.record(SheetRole::Linear, &assignments);
    if summary.total_skipped() > 0 {
        log::warn!("{}: skipped {} malformed row(s)", config.name, summary.total_skipped());
    }

    let mut findings = Findings::new();
    let graph = ModelGraph::build(
        entities.records,
        attributes.records,
        relationships.records,
        config.matching.resolve_labels,
        &mut findings,
    );
    let graph = reconcile(graph, &assignments.records, &mut findings);
    let findings = findings.into_vec();
    let qa = analyze(&graph, &findings, &config.qa);

    log::info!(
        "{}: {} entities, {} relationships, {} finding(s)",
        config.name,
        qa.entity_count,
        qa.relationship_count,
        findings.len()
    );

    Ok(LoadedGraph {
        meta: LoadMeta {
            name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            loaded_at: chrono::Utc::now().to_rfc3339(),
            generation: 0,
        },
        summary,
        graph,
        findings,
        qa,
    })
}
