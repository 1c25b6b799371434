// bimgraph CLI - load a data model and its system ownership into one graph

mod exit_codes;
mod load;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use bimgraph_recon::ReconError;
use clap::{Parser, Subcommand};

use exit_codes::{recon_exit_code, EXIT_ERROR, EXIT_LOAD_IO, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "bimgraph")]
#[command(about = "Reconcile a BIM data model with operational system ownership")]
#[command(version)]
struct Cli {
    /// Debug logging for all bimgraph crates (overrides RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a load: normalize, build, reconcile and analyze
    #[command(after_help = "\
Examples:
  bimgraph load plant.toml
  bimgraph load plant.toml --json
  bimgraph load plant.toml --output report.json --graph graph.json
  bimgraph load plant.toml --strict")]
    Load {
        /// Path to the load config (.toml)
        config: PathBuf,

        /// Output the full report as JSON to stdout instead of the human summary
        #[arg(long)]
        json: bool,

        /// Write the full report JSON to file (overrides [output] json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the graph export JSON to file (overrides [output] graph)
        #[arg(long)]
        graph: Option<PathBuf>,

        /// Exit non-zero when the load produced findings
        #[arg(long)]
        strict: bool,
    },

    /// Validate a load config without reading any sheets
    #[command(after_help = "\
Examples:
  bimgraph validate plant.toml")]
    Validate {
        /// Path to the load config (.toml)
        config: PathBuf,
    },

    /// List the sheets of a workbook or CSV directory
    #[command(after_help = "\
Examples:
  bimgraph sheets model.xlsx
  bimgraph sheets exports/operational --json")]
    Sheets {
        /// Workbook (.xlsx/.xls/.xlsb/.ods) or directory of CSV files
        source: PathBuf,

        /// Output sheet names as a JSON array
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_LOAD_IO, message: msg.into(), hint: None }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingSheet { .. } => {
                Some("check [sheets] in the config; `bimgraph sheets <source>` lists what is there".to_string())
            }
            ReconError::MissingColumn { .. } => {
                Some("check [columns] in the config, and header_row if the sheet has a title row".to_string())
            }
            _ => None,
        };
        Self {
            code: recon_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Load { config, json, output, graph, strict } => {
            load::cmd_load(config, json, output, graph, strict)
        }
        Commands::Validate { config } => load::cmd_validate(config),
        Commands::Sheets { source, json } => load::cmd_sheets(source, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
