// Sheet import: workbooks and CSV directories into `Table`s

pub mod csv;
pub mod source;
pub mod xlsx;

pub use source::{load_input, Source};
