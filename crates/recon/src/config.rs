use serde::Deserialize;

use crate::error::ReconError;
use crate::model::SheetRole;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Describes one load: where the two workbooks live, which sheets and
/// columns carry the data, and how references are matched.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub name: String,
    pub sources: SourcesConfig,
    pub sheets: SheetNames,
    pub columns: ColumnsConfig,
    pub matching: MatchingConfig,
    pub qa: QaConfig,
    pub output: OutputConfig,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            name: "model".into(),
            sources: SourcesConfig::default(),
            sheets: SheetNames::default(),
            columns: ColumnsConfig::default(),
            matching: MatchingConfig::default(),
            qa: QaConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl LoadConfig {
    pub fn from_toml(s: &str) -> Result<Self, ReconError> {
        let config: Self = toml::from_str(s).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for role in SheetRole::ALL {
            if self.sheets.name(role).trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "sheet name for '{role}' must not be blank"
                )));
            }
        }

        let c = &self.columns;
        let required = [
            (SheetRole::Entity, "identifier", &c.entity.identifier),
            (SheetRole::Entity, "label", &c.entity.label),
            (SheetRole::Column, "identifier", &c.column.identifier),
            (SheetRole::Column, "owner", &c.column.owner),
            (SheetRole::Column, "data_type", &c.column.data_type),
            (SheetRole::ForeignKey, "source", &c.foreign_key.source),
            (SheetRole::ForeignKey, "target", &c.foreign_key.target),
            (SheetRole::Linear, "object", &c.linear.object),
            (SheetRole::Linear, "system", &c.linear.system),
        ];
        for (role, field, column) in required {
            if column.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "columns for '{role}': '{field}' must name a column"
                )));
            }
        }

        for (which, source) in [("model", &self.sources.model), ("operational", &self.sources.operational)] {
            if let Some(source) = source {
                if source.file.trim().is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "sources.{which}: file must not be blank"
                    )));
                }
                if source.header_row == 0 {
                    return Err(ReconError::ConfigValidation(format!(
                        "sources.{which}: header_row is 1-based"
                    )));
                }
            }
        }

        if self.qa.top_entities == 0 {
            return Err(ReconError::ConfigValidation(
                "qa.top_entities must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Data-model export: Entity, Column and Foreign Key sheets.
    pub model: Option<SourceConfig>,
    /// Operational document: Linear sheet.
    pub operational: Option<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Workbook (.xlsx/.xls/.xlsb/.ods) or a directory of `<sheet>.csv` files.
    pub file: String,
    /// 1-based row holding the column headers. Model exports carry a title
    /// row above the headers, hence `header_row = 2` there.
    #[serde(default = "default_header_row")]
    pub header_row: usize,
}

fn default_header_row() -> usize {
    1
}

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub entity: String,
    pub column: String,
    pub foreign_key: String,
    pub linear: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            entity: "Entity".into(),
            column: "Column".into(),
            foreign_key: "Foreign Key".into(),
            linear: "Linear".into(),
        }
    }
}

impl SheetNames {
    pub fn name(&self, role: SheetRole) -> &str {
        match role {
            SheetRole::Entity => &self.entity,
            SheetRole::Column => &self.column,
            SheetRole::ForeignKey => &self.foreign_key,
            SheetRole::Linear => &self.linear,
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------
//
// Required columns are plain strings; optional ones are `Option<String>` and
// may be disabled with an empty string. An optional column that is mapped but
// absent from the sheet is simply not read.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub entity: EntityColumns,
    pub column: AttributeColumns,
    pub foreign_key: RelationshipColumns,
    pub linear: AssignmentColumns,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EntityColumns {
    pub identifier: String,
    pub label: String,
    pub description: Option<String>,
}

impl Default for EntityColumns {
    fn default() -> Self {
        Self {
            identifier: "ID".into(),
            label: "Name".into(),
            description: Some("Description".into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AttributeColumns {
    pub identifier: String,
    pub owner: String,
    pub data_type: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub primary_key: Option<String>,
}

impl Default for AttributeColumns {
    fn default() -> Self {
        Self {
            identifier: "ID".into(),
            owner: "Parent Name".into(),
            data_type: "Data Type".into(),
            label: Some("Name".into()),
            description: Some("Description".into()),
            primary_key: Some("PrimaryKey".into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelationshipColumns {
    pub source: String,
    pub target: String,
    pub source_attribute: Option<String>,
    pub target_attribute: Option<String>,
    pub identifying: Option<String>,
}

impl Default for RelationshipColumns {
    fn default() -> Self {
        Self {
            source: "Table".into(),
            target: "Reference".into(),
            source_attribute: Some("Source Column".into()),
            target_attribute: Some("Target Column".into()),
            identifying: Some("Identifying".into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssignmentColumns {
    pub object: String,
    pub attribute: Option<String>,
    pub system: String,
}

impl Default for AssignmentColumns {
    fn default() -> Self {
        Self {
            object: "BIM Object".into(),
            attribute: Some("BIM Attribute".into()),
            system: "Source System".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Matching + QA + Output
// ---------------------------------------------------------------------------

/// How references in the Column and Linear sheets find their entity.
///
/// Matching is by identifier only unless `resolve_labels` is set. The default
/// column mappings (`Parent Name`, `BIM Object`, `BIM Attribute`) carry names
/// in typical exports, so a load reading them needs `resolve_labels = true`;
/// otherwise every attribute is an orphan and no entity gets a system.
/// `demos/plant.toml` is a complete config set up that way.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Let references that match no entity id resolve through a unique
    /// entity (or attribute) label.
    pub resolve_labels: bool,
    /// Linear rows whose object or attribute starts with this prefix are
    /// excluded. Empty disables the filter.
    pub skip_prefix: Option<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            resolve_labels: false,
            skip_prefix: Some("skip".into()),
        }
    }
}

impl MatchingConfig {
    pub fn skip_prefix(&self) -> Option<&str> {
        mapped(&self.skip_prefix)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// How many entities the attribute-count ranking keeps.
    pub top_entities: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self { top_entities: 15 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Full load report (summary, QA, findings, graph).
    pub json: Option<String>,
    /// Graph export only.
    pub graph: Option<String>,
}

/// An optional column mapping, with the empty string meaning "not mapped".
pub fn mapped(column: &Option<String>) -> Option<&str> {
    column.as_deref().map(str::trim).filter(|c| !c.is_empty())
}
