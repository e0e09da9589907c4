// src/importer/mod.rs
pub mod batch;
pub mod decode;
pub mod dedup;
pub mod parser;
pub mod reconciler;

pub use batch::BatchCoordinator;
pub use parser::{parse_rows, ParsedSheet, RowError};
