use serde::Serialize;

// ---------------------------------------------------------------------------
// Sheet roles
// ---------------------------------------------------------------------------

/// The four sheets a load consumes. Entity, Column and Foreign Key come from
/// the data-model export; Linear comes from the operational document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetRole {
    Entity,
    Column,
    ForeignKey,
    Linear,
}

impl SheetRole {
    pub const ALL: [SheetRole; 4] = [Self::Entity, Self::Column, Self::ForeignKey, Self::Linear];
}

impl std::fmt::Display for SheetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity => write!(f, "Entity"),
            Self::Column => write!(f, "Column"),
            Self::ForeignKey => write!(f, "Foreign Key"),
            Self::Linear => write!(f, "Linear"),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// A modeled data object type from the Entity sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A property row from the Column sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub id: String,
    /// Owning entity reference. Rewritten to the canonical entity id once the
    /// graph builder has resolved it.
    pub owner: String,
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub primary_key: bool,
}

impl Attribute {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// A foreign key from the Foreign Key sheet. Always entity-to-entity; the
/// attribute ids are descriptive metadata carried on the edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifying: Option<bool>,
}

impl Relationship {
    pub fn kind(&self) -> RelationshipKind {
        match self.identifying {
            Some(true) => RelationshipKind::Standard,
            Some(false) => RelationshipKind::ReferenceData,
            None => RelationshipKind::Unspecified,
        }
    }
}

/// Identifying foreign keys link standard entities; non-identifying ones point
/// at reference data tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Standard,
    ReferenceData,
    Unspecified,
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::ReferenceData => write!(f, "reference_data"),
            Self::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// "System X owns object Y" (or attribute Y of object X) from the Linear sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemAssignment {
    pub object: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    pub system: String,
}

// ---------------------------------------------------------------------------
// Normalization output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// A non-optional cell was blank.
    MissingField { column: String },
    /// Identifier already taken by an earlier row (first occurrence wins).
    DuplicateIdentifier { id: String },
    /// Row excluded by the configured skip prefix.
    Excluded { prefix: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { column } => write!(f, "missing value for '{column}'"),
            Self::DuplicateIdentifier { id } => write!(f, "duplicate identifier '{id}'"),
            Self::Excluded { prefix } => write!(f, "excluded by prefix '{prefix}'"),
        }
    }
}

/// A row the normalizer refused. `row` is the 1-based line or spreadsheet row
/// it was read from, counting the header, title rows and blank rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub sheet: SheetRole,
    pub row: usize,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Valid records plus the rows that were skipped on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRow>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Load summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SheetCounts {
    pub accepted: usize,
    pub skipped: usize,
}

/// Row-level counters for one load. Skipped rows are neither schema errors
/// nor findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub entity: SheetCounts,
    pub column: SheetCounts,
    pub foreign_key: SheetCounts,
    pub linear: SheetCounts,
    pub skipped_rows: Vec<SkippedRow>,
}

impl LoadSummary {
    pub fn record<T>(&mut self, role: SheetRole, normalized: &Normalized<T>) {
        let counts = SheetCounts {
            accepted: normalized.records.len(),
            skipped: normalized.skipped.len(),
        };
        match role {
            SheetRole::Entity => self.entity = counts,
            SheetRole::Column => self.column = counts,
            SheetRole::ForeignKey => self.foreign_key = counts,
            SheetRole::Linear => self.linear = counts,
        }
        self.skipped_rows.extend(normalized.skipped.iter().cloned());
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped_rows.len()
    }
}
