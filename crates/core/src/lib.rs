//! solgraph core
//!
//! Parses Solidity sources with tree-sitter into a contract model with
//! classified call sites, optionally pulls in imported library contracts, and
//! builds a call/dependency graph with proxy-pattern grouping.
//!
//! ```no_run
//! use solgraph_core::{build_call_graph, parse_solidity_files, FilterOptions, SourceFile};
//!
//! let files = vec![SourceFile::new("src/Token.sol", "contract Token {}")];
//! let contracts = parse_solidity_files(&files, &FilterOptions::default());
//! let graph = build_call_graph("demo", contracts);
//! println!("{}", graph.stats.total_contracts);
//! ```

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod parser;
pub mod resolver;

pub use cache::{build_library_graph, read_library_graph, write_library_graph, LibraryGraph};
pub use classify::{determine_category, CallPolicy, PolicyKind, RichPolicy, SimplePolicy};
pub use config::{GraphConfig, LibraryConfig};
pub use error::{CacheError, ConfigError, ParseError, ResolveError};
pub use graph::{build_call_graph, GRAPH_VERSION};
pub use model::{
    CallGraph, CallType, Contract, ContractKind, Dependency, DependencyType, DirectoryNode,
    FunctionCall, GraphStats, ProxyGroup, ProxyPattern, ProxyRole,
};
pub use parser::{
    parse_solidity_file, parse_solidity_files, FilterOptions, ParsedFile, SolidityParser,
    SourceFile,
};
pub use resolver::{
    resolve_external_dependencies, ChainResolver, FsResolver, ImportResolver, LibraryIndex,
    Resolution, ResolutionReport, DEFAULT_MAX_DEPTH,
};
