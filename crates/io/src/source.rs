//! Where a load's sheets come from.
//!
//! A source is either a workbook (any format calamine opens) or a directory
//! holding one `<sheet name>.csv` (or `.tsv`) file per sheet, as produced by
//! saving each sheet of a workbook separately.

use std::path::{Path, PathBuf};

use bimgraph_recon::config::SourceConfig;
use bimgraph_recon::engine::LoadInput;
use bimgraph_recon::{LoadConfig, ReconError, SheetRole, Table};

use crate::{csv, xlsx};

const CSV_EXTENSIONS: &[&str] = &["csv", "tsv"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Workbook(PathBuf),
    Directory(PathBuf),
}

impl Source {
    pub fn open(path: &Path) -> Result<Self, ReconError> {
        if path.is_dir() {
            return Ok(Self::Directory(path.to_path_buf()));
        }
        if !path.exists() {
            return Err(ReconError::Io(format!("source not found: {}", path.display())));
        }
        if xlsx::is_workbook(path) {
            return Ok(Self::Workbook(path.to_path_buf()));
        }
        Err(ReconError::Io(format!(
            "unsupported source {}: expected a workbook ({}) or a directory of CSV files",
            path.display(),
            xlsx::WORKBOOK_EXTENSIONS.join(", ")
        )))
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Workbook(p) | Self::Directory(p) => p,
        }
    }

    /// Sheet names: workbook order, or sorted file stems for a directory.
    pub fn sheet_names(&self) -> Result<Vec<String>, ReconError> {
        match self {
            Self::Workbook(path) => xlsx::sheet_names(path).map_err(ReconError::Io),
            Self::Directory(dir) => {
                let entries = std::fs::read_dir(dir)
                    .map_err(|e| ReconError::Io(format!("{}: {}", dir.display(), e)))?;
                let mut names = Vec::new();
                for entry in entries {
                    let path = entry
                        .map_err(|e| ReconError::Io(format!("{}: {}", dir.display(), e)))?
                        .path();
                    if !path.is_file() || !has_csv_extension(&path) {
                        continue;
                    }
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_string());
                    }
                }
                names.sort();
                names.dedup();
                Ok(names)
            }
        }
    }

    /// Read one sheet. A sheet the source does not have is a schema error.
    pub fn load_sheet(&self, sheet: &str, header_row: usize) -> Result<Table, ReconError> {
        let table = match self {
            Self::Workbook(path) => xlsx::import_sheet(path, sheet, header_row).map_err(ReconError::Io)?,
            Self::Directory(dir) => match sheet_file(dir, sheet) {
                Some(path) => Some(csv::import_table(&path, header_row).map_err(ReconError::Io)?),
                None => None,
            },
        };
        table.ok_or_else(|| ReconError::MissingSheet {
            workbook: self.path().display().to_string(),
            sheet: sheet.to_string(),
        })
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CSV_EXTENSIONS.iter().any(|c| e.eq_ignore_ascii_case(c)))
}

fn sheet_file(dir: &Path, sheet: &str) -> Option<PathBuf> {
    CSV_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{sheet}.{ext}")))
        .find(|p| p.is_file())
}

/// Resolve a configured path against the directory holding the config.
pub fn resolve_path(base_dir: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Read every sheet a config names. The model source supplies Entity, Column
/// and Foreign Key; the operational source supplies Linear. A source that is
/// not configured leaves its sheets absent.
pub fn load_input(config: &LoadConfig, base_dir: &Path) -> Result<LoadInput, ReconError> {
    let mut input = LoadInput::default();

    if let Some(model) = &config.sources.model {
        read_sheets(
            &mut input,
            config,
            model,
            base_dir,
            &[SheetRole::Entity, SheetRole::Column, SheetRole::ForeignKey],
        )?;
    }
    if let Some(operational) = &config.sources.operational {
        read_sheets(&mut input, config, operational, base_dir, &[SheetRole::Linear])?;
    }

    Ok(input)
}

fn read_sheets(
    input: &mut LoadInput,
    config: &LoadConfig,
    source: &SourceConfig,
    base_dir: &Path,
    roles: &[SheetRole],
) -> Result<(), ReconError> {
    let opened = Source::open(&resolve_path(base_dir, &source.file))?;
    for &role in roles {
        let name = config.sheets.name(role);
        let table = opened.load_sheet(name, source.header_row)?;
        log::debug!(
            "{}: '{}' -> {} row(s)",
            opened.path().display(),
            name,
            table.len()
        );
        input.set(role, table);
    }
    Ok(())
}
