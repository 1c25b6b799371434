//! Record normalizer: loaded tables → typed records.
//!
//! A missing required column is a schema error and aborts the load. A row
//! missing a required value, or repeating an identifier already seen, is
//! skipped and reported; the first occurrence of an identifier wins.

use std::collections::HashSet;

use crate::config::{mapped, AssignmentColumns, AttributeColumns, EntityColumns, RelationshipColumns};
use crate::error::ReconError;
use crate::model::{
    Attribute, Entity, Normalized, Relationship, SheetRole, SkipReason, SkippedRow, SystemAssignment,
};
use crate::table::{cell, Row, Table};

pub fn normalize_entities(table: &Table, cols: &EntityColumns) -> Result<Normalized<Entity>, ReconError> {
    let sheet = SheetRole::Entity;
    if table.is_empty() {
        return Ok(Normalized::default());
    }
    let id_col = require(table, sheet, &cols.identifier)?;
    let label_col = require(table, sheet, &cols.label)?;
    let desc_col = optional(table, &cols.description);

    let mut out = Normalized::default();
    let mut seen = HashSet::new();

    for (line, row) in table.numbered_rows() {
        let Some(id) = cell(row, id_col) else {
            skip(&mut out, sheet, line, missing(id_col));
            continue;
        };
        if !seen.insert(id.to_string()) {
            skip(&mut out, sheet, line, duplicate(id));
            continue;
        }
        out.records.push(Entity {
            id: id.to_string(),
            label: cell(row, label_col).unwrap_or(id).to_string(),
            description: read(row, desc_col),
        });
    }

    log_sheet(sheet, &out);
    Ok(out)
}

pub fn normalize_attributes(
    table: &Table,
    cols: &AttributeColumns,
) -> Result<Normalized<Attribute>, ReconError> {
    let sheet = SheetRole::Column;
    if table.is_empty() {
        return Ok(Normalized::default());
    }
    let id_col = require(table, sheet, &cols.identifier)?;
    let owner_col = require(table, sheet, &cols.owner)?;
    let type_col = require(table, sheet, &cols.data_type)?;
    let label_col = optional(table, &cols.label);
    let desc_col = optional(table, &cols.description);
    let pk_col = optional(table, &cols.primary_key);

    let mut out = Normalized::default();
    let mut seen = HashSet::new();

    for (line, row) in table.numbered_rows() {
        let Some(id) = cell(row, id_col) else {
            skip(&mut out, sheet, line, missing(id_col));
            continue;
        };
        let Some(owner) = cell(row, owner_col) else {
            skip(&mut out, sheet, line, missing(owner_col));
            continue;
        };
        let Some(data_type) = cell(row, type_col) else {
            skip(&mut out, sheet, line, missing(type_col));
            continue;
        };
        if !seen.insert(id.to_string()) {
            skip(&mut out, sheet, line, duplicate(id));
            continue;
        }
        out.records.push(Attribute {
            id: id.to_string(),
            owner: owner.to_string(),
            data_type: data_type.to_string(),
            label: read(row, label_col),
            description: read(row, desc_col),
            primary_key: pk_col
                .and_then(|c| cell(row, c))
                .and_then(parse_flag)
                .unwrap_or(false),
        });
    }

    log_sheet(sheet, &out);
    Ok(out)
}

pub fn normalize_relationships(
    table: &Table,
    cols: &RelationshipColumns,
) -> Result<Normalized<Relationship>, ReconError> {
    let sheet = SheetRole::ForeignKey;
    if table.is_empty() {
        return Ok(Normalized::default());
    }
    let source_col = require(table, sheet, &cols.source)?;
    let target_col = require(table, sheet, &cols.target)?;
    let source_attr_col = optional(table, &cols.source_attribute);
    let target_attr_col = optional(table, &cols.target_attribute);
    let identifying_col = optional(table, &cols.identifying);

    let mut out = Normalized::default();

    for (line, row) in table.numbered_rows() {
        let Some(source) = cell(row, source_col) else {
            skip(&mut out, sheet, line, missing(source_col));
            continue;
        };
        let Some(target) = cell(row, target_col) else {
            skip(&mut out, sheet, line, missing(target_col));
            continue;
        };
        out.records.push(Relationship {
            source: source.to_string(),
            target: target.to_string(),
            source_attribute: read(row, source_attr_col),
            target_attribute: read(row, target_attr_col),
            identifying: identifying_col.and_then(|c| cell(row, c)).and_then(parse_flag),
        });
    }

    log_sheet(sheet, &out);
    Ok(out)
}

pub fn normalize_assignments(
    table: &Table,
    cols: &AssignmentColumns,
    skip_prefix: Option<&str>,
) -> Result<Normalized<SystemAssignment>, ReconError> {
    let sheet = SheetRole::Linear;
    if table.is_empty() {
        return Ok(Normalized::default());
    }
    let object_col = require(table, sheet, &cols.object)?;
    let system_col = require(table, sheet, &cols.system)?;
    let attr_col = optional(table, &cols.attribute);

    let mut out = Normalized::default();

    for (line, row) in table.numbered_rows() {
        let Some(object) = cell(row, object_col) else {
            skip(&mut out, sheet, line, missing(object_col));
            continue;
        };
        let attribute = attr_col.and_then(|c| cell(row, c));

        if let Some(prefix) = skip_prefix {
            if object.starts_with(prefix) || attribute.is_some_and(|a| a.starts_with(prefix)) {
                skip(&mut out, sheet, line, SkipReason::Excluded { prefix: prefix.to_string() });
                continue;
            }
        }

        let Some(system) = cell(row, system_col) else {
            skip(&mut out, sheet, line, missing(system_col));
            continue;
        };
        out.records.push(SystemAssignment {
            object: object.to_string(),
            attribute: attribute.map(str::to_string),
            system: system.to_string(),
        });
    }

    log_sheet(sheet, &out);
    Ok(out)
}

/// Spreadsheet yes/no cell. Anything unrecognised is "not stated".
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn require<'a>(table: &Table, sheet: SheetRole, column: &'a str) -> Result<&'a str, ReconError> {
    let column = column.trim();
    if table.has_column(column) {
        Ok(column)
    } else {
        Err(ReconError::MissingColumn {
            sheet,
            column: column.to_string(),
        })
    }
}

fn optional<'a>(table: &Table, column: &'a Option<String>) -> Option<&'a str> {
    mapped(column).filter(|c| table.has_column(c))
}

fn read(row: &Row, column: Option<&str>) -> Option<String> {
    column.and_then(|c| cell(row, c)).map(str::to_string)
}

fn missing(column: &str) -> SkipReason {
    SkipReason::MissingField {
        column: column.to_string(),
    }
}

fn duplicate(id: &str) -> SkipReason {
    SkipReason::DuplicateIdentifier { id: id.to_string() }
}

fn skip<T>(out: &mut Normalized<T>, sheet: SheetRole, row: usize, reason: SkipReason) {
    log::debug!("{sheet} row {row} skipped: {reason}");
    out.skipped.push(SkippedRow { sheet, row, reason });
}

fn log_sheet<T>(sheet: SheetRole, out: &Normalized<T>) {
    log::debug!(
        "{sheet}: {} record(s), {} skipped row(s)",
        out.records.len(),
        out.skipped.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(csv: &str) -> Result<Normalized<Entity>, ReconError> {
        normalize_entities(&Table::from_csv(csv).unwrap(), &EntityColumns::default())
    }

    #[test]
    fn entities_basic() {
        let out = entities("ID,Name,Description\nE1,Pump,Moves water\nE2,Valve,\n").unwrap();
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].label, "Pump");
        assert_eq!(out.records[0].description.as_deref(), Some("Moves water"));
        assert_eq!(out.records[1].description, None);
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn missing_required_column_is_schema_error() {
        let err = entities("ID,Description\nE1,x\n").unwrap_err();
        assert_eq!(
            err,
            ReconError::MissingColumn {
                sheet: SheetRole::Entity,
                column: "Name".into()
            }
        );
    }

    #[test]
    fn empty_table_yields_nothing() {
        let out = normalize_entities(&Table::default(), &EntityColumns::default()).unwrap();
        assert!(out.records.is_empty());
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn header_only_table_still_checks_schema() {
        assert!(entities("ID,Description\n").is_err());
        assert!(entities("ID,Name\n").unwrap().records.is_empty());
    }

    #[test]
    fn duplicate_identifier_first_wins() {
        let out = entities("ID,Name\nE1,Pump\nE1,Pump Copy\n E1 ,Third\n").unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].label, "Pump");
        assert_eq!(out.skipped.len(), 2);
        assert_eq!(out.skipped[0].row, 3);
        assert_eq!(out.skipped[1].row, 4);
        assert_eq!(
            out.skipped[0].reason,
            SkipReason::DuplicateIdentifier { id: "E1".into() }
        );
    }

    #[test]
    fn row_without_identifier_is_skipped_not_fatal() {
        let out = entities("ID,Name\n,Orphan\nE2,Valve\n").unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.skipped[0].row, 2);
        assert_eq!(out.skipped[0].reason, SkipReason::MissingField { column: "ID".into() });
    }

    #[test]
    fn skipped_rows_report_source_lines_across_blank_rows() {
        let out = entities("ID,Name\nE1,Pump\n,\n,\nE1,Dup\n").unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].row, 5);
        assert_eq!(
            out.skipped[0].reason,
            SkipReason::DuplicateIdentifier { id: "E1".into() }
        );
    }

    #[test]
    fn blank_label_falls_back_to_identifier() {
        let out = entities("ID,Name\nE1,  \n").unwrap();
        assert_eq!(out.records[0].label, "E1");
    }

    #[test]
    fn attributes_read_optional_columns_when_present() {
        let table = Table::from_csv(
            "ID,Name,Parent Name,Data Type,PrimaryKey\nA1,Tag,E1,varchar,Yes\nA2,Size,E1,int,\nA3,,,int,\n",
        )
        .unwrap();
        let out = normalize_attributes(&table, &AttributeColumns::default()).unwrap();
        assert_eq!(out.records.len(), 2);
        assert!(out.records[0].primary_key);
        assert!(!out.records[1].primary_key);
        assert_eq!(out.records[0].label.as_deref(), Some("Tag"));
        assert_eq!(out.records[0].description, None);
        assert_eq!(
            out.skipped[0].reason,
            SkipReason::MissingField { column: "Parent Name".into() }
        );
    }

    #[test]
    fn attributes_require_data_type_column() {
        let table = Table::from_csv("ID,Parent Name\nA1,E1\n").unwrap();
        let err = normalize_attributes(&table, &AttributeColumns::default()).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { ref column, .. } if column == "Data Type"));
    }

    #[test]
    fn attribute_with_blank_data_type_is_skipped() {
        let table = Table::from_csv("ID,Parent Name,Data Type\nA1,E1,\nA2,E1,int\n").unwrap();
        let out = normalize_attributes(&table, &AttributeColumns::default()).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].id, "A2");
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].row, 2);
        assert_eq!(
            out.skipped[0].reason,
            SkipReason::MissingField { column: "Data Type".into() }
        );
    }

    #[test]
    fn relationships_keep_duplicates_and_read_identifying() {
        let table = Table::from_csv(
            "Table,Reference,Identifying\nE1,E2,Yes\nE1,E2,No\nE3,E3,maybe\nE4,,Yes\n",
        )
        .unwrap();
        let out = normalize_relationships(&table, &RelationshipColumns::default()).unwrap();
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.records[0].identifying, Some(true));
        assert_eq!(out.records[1].identifying, Some(false));
        assert_eq!(out.records[2].identifying, None);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].row, 5);
    }

    #[test]
    fn assignments_honor_skip_prefix() {
        let table = Table::from_csv(
            "BIM Object,BIM Attribute,Source System\nE1,,HVAC\nskip-E2,,HVAC\nE1,skip_x,HVAC\nE3,,\n",
        )
        .unwrap();
        let out =
            normalize_assignments(&table, &AssignmentColumns::default(), Some("skip")).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].attribute, None);
        assert_eq!(out.skipped.len(), 3);
        assert_eq!(out.skipped[0].reason, SkipReason::Excluded { prefix: "skip".into() });
        assert_eq!(
            out.skipped[2].reason,
            SkipReason::MissingField { column: "Source System".into() }
        );

        let out = normalize_assignments(&table, &AssignmentColumns::default(), None).unwrap();
        assert_eq!(out.records.len(), 3);
    }

    #[test]
    fn assignment_attribute_column_is_optional() {
        let table = Table::from_csv("BIM Object,Source System\nE1,HVAC\n").unwrap();
        let out = normalize_assignments(&table, &AssignmentColumns::default(), None).unwrap();
        assert_eq!(out.records[0].object, "E1");
        assert_eq!(out.records[0].attribute, None);
    }

    #[test]
    fn flags() {
        assert_eq!(parse_flag(" YES "), Some(true));
        assert_eq!(parse_flag("n"), Some(false));
        assert_eq!(parse_flag("Reference"), None);
    }
}
