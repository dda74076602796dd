//! Solidity source parsing
//!
//! Turns raw source text into the [`crate::model::Contract`] model with
//! classified call sites, one file at a time or in batches.

pub mod batch;
pub mod calls;
pub mod imports;
pub mod source;
pub mod types;

pub use batch::{
    find_solidity_files, parse_solidity_files, read_source_files, FilterOptions, SourceFile,
};
pub use imports::{is_external_path, parse_import_directive, resolve_import_path};
pub use source::{parse_solidity_file, ParsedFile, SolidityParser};
pub use types::{display_selector, format_type, function_signature};
