use std::fmt;

use crate::model::SheetRole;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (blank sheet name, blank column mapping, etc.).
    ConfigValidation(String),
    /// A required sheet is absent from a workbook.
    MissingSheet { workbook: String, sheet: String },
    /// A required column is absent from a sheet's header row.
    MissingColumn { sheet: SheetRole, column: String },
    /// IO error (file read, workbook open, etc.).
    Io(String),
}

impl ReconError {
    /// Schema errors abort a load; they are reported with the missing name.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::MissingSheet { .. } | Self::MissingColumn { .. })
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingSheet { workbook, sheet } => {
                write!(f, "workbook '{workbook}': missing sheet '{sheet}'")
            }
            Self::MissingColumn { sheet, column } => {
                write!(f, "sheet '{sheet}': missing column '{column}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_name_the_missing_column() {
        let err = ReconError::MissingColumn {
            sheet: SheetRole::ForeignKey,
            column: "Reference".into(),
        };
        assert!(err.is_schema());
        assert_eq!(err.to_string(), "sheet 'Foreign Key': missing column 'Reference'");
        assert!(!ReconError::Io("boom".into()).is_schema());
    }
}
