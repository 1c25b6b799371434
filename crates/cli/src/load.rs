//! `bimgraph load` / `validate` / `sheets`.

use std::path::{Path, PathBuf};

use bimgraph_io::source::resolve_path;
use bimgraph_io::{load_input, Source};
use bimgraph_recon::{FindingKind, GraphStore, LoadConfig, LoadedGraph};

use crate::exit_codes::EXIT_LOAD_FINDINGS;
use crate::CliError;

/// Findings listed in the human summary before it is cut off.
const MAX_LISTED_FINDINGS: usize = 20;

fn read_config(config_path: &Path) -> Result<LoadConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", config_path.display())))?;
    Ok(LoadConfig::from_toml(&config_str)?)
}

/// Directory that relative paths in a config resolve against.
fn config_dir(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

pub fn cmd_load(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    graph_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let base_dir = config_dir(&config_path);

    if config.sources.model.is_none() && config.sources.operational.is_none() {
        log::warn!("{}: no sources configured, the graph will be empty", config_path.display());
    }

    let store = GraphStore::new();
    let loaded = store.load_with(|| {
        let input = load_input(&config, base_dir)?;
        bimgraph_recon::run(&config, &input)
    })?;

    // Flags win over [output]; config paths resolve like sources do
    let output_file = output_file.or_else(|| config.output.json.as_deref().map(|f| resolve_path(base_dir, f)));
    let graph_file = graph_file.or_else(|| config.output.graph.as_deref().map(|f| resolve_path(base_dir, f)));

    if json_output || output_file.is_some() {
        let json_str = serde_json::to_string_pretty(&loaded.report())
            .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = output_file {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::io(format!("cannot write output {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        if json_output {
            println!("{json_str}");
        }
    }

    if let Some(ref path) = graph_file {
        let graph_json = loaded.export().to_json()?;
        std::fs::write(path, graph_json)
            .map_err(|e| CliError::io(format!("cannot write graph {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if !json_output {
        print_summary(&loaded);
    }

    if strict && !loaded.findings.is_empty() {
        return Err(CliError {
            code: EXIT_LOAD_FINDINGS,
            message: format!("{} finding(s)", loaded.findings.len()),
            hint: None,
        });
    }

    Ok(())
}

/// Human summary to stderr.
fn print_summary(loaded: &LoadedGraph) {
    let qa = &loaded.qa;
    let s = &loaded.summary;

    eprintln!(
        "{}: {} entities, {} attributes, {} relationships",
        loaded.meta.name, qa.entity_count, qa.attribute_count, qa.relationship_count
    );
    eprintln!(
        "systems: {} entities assigned, {} unassigned; {} attributes assigned, {} unassigned",
        qa.entities_assigned, qa.entities_unassigned, qa.attributes_assigned, qa.attributes_unassigned
    );
    if s.total_skipped() > 0 {
        eprintln!(
            "skipped rows: {} entity, {} column, {} foreign key, {} linear",
            s.entity.skipped, s.column.skipped, s.foreign_key.skipped, s.linear.skipped
        );
    }

    let tally: Vec<String> = FindingKind::ALL
        .iter()
        .map(|kind| format!("{} {}", qa.finding_count(*kind), kind))
        .collect();
    eprintln!("findings: {} ({})", qa.total_findings(), tally.join(", "));

    for finding in loaded.findings.iter().take(MAX_LISTED_FINDINGS) {
        eprintln!("  {:<28} {}", finding.kind.to_string(), finding.message);
    }
    if loaded.findings.len() > MAX_LISTED_FINDINGS {
        eprintln!(
            "  ... and {} more (use --json for the full list)",
            loaded.findings.len() - MAX_LISTED_FINDINGS
        );
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;

    let mut sources = Vec::new();
    if let Some(model) = &config.sources.model {
        sources.push(format!("model {}", model.file));
    }
    if let Some(operational) = &config.sources.operational {
        sources.push(format!("operational {}", operational.file));
    }
    let sources = if sources.is_empty() { "no sources".to_string() } else { sources.join(", ") };

    eprintln!("ok: {} ({})", config.name, sources);
    Ok(())
}

pub fn cmd_sheets(source_path: PathBuf, json_output: bool) -> Result<(), CliError> {
    let source = Source::open(&source_path)?;
    let names = source.sheet_names()?;

    if json_output {
        let json_str = serde_json::to_string_pretty(&names)
            .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for name in &names {
            println!("{name}");
        }
    }

    if names.is_empty() {
        return Err(CliError::io(format!("{}: no sheets found", source_path.display()))
            .with_hint("a CSV directory holds one <sheet name>.csv file per sheet"));
    }
    Ok(())
}
