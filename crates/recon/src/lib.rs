//! `bimgraph-recon`: data-model and system-ownership reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded sheets, returns the reconciled
//! relationship graph, findings and QA statistics. No CLI or file IO.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod finding;
pub mod graph;
pub mod model;
pub mod normalize;
pub mod qa;
pub mod reconcile;
pub mod store;
pub mod table;

pub use config::LoadConfig;
pub use engine::{run, LoadInput, LoadReport, LoadedGraph};
pub use error::ReconError;
pub use export::{export, GraphExport};
pub use finding::{Finding, FindingKind};
pub use model::SheetRole;
pub use qa::QaReport;
pub use store::GraphStore;
pub use table::Table;
