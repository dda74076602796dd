//! Persisted library graphs
//!
//! A library graph is the call graph of one third-party library, built once
//! with the rich call policy and stored as `<id>.json`. Stored graphs feed
//! [`crate::resolver::LibraryIndex`].

use crate::classify::RichPolicy;
use crate::config::LibraryConfig;
use crate::error::CacheError;
use crate::graph::build_call_graph;
use crate::model::CallGraph;
use crate::parser::{read_source_files, FilterOptions, SolidityParser};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryGraph {
    pub id: String,
    pub name: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub call_graph: CallGraph,
}

/// Parse every `.sol` file of `library` (rooted at `base_dir`) and build its
/// graph. Contract paths are logical import paths (`prefix` + relative path).
pub fn build_library_graph(
    library: &LibraryConfig,
    base_dir: &Path,
) -> Result<LibraryGraph, CacheError> {
    let root = base_dir.join(&library.root);
    if !root.exists() {
        return Err(CacheError::MissingRoot(root));
    }

    let files = read_source_files(&root, &library.prefix).map_err(|source| CacheError::Io {
        path: root.clone(),
        source,
    })?;

    let parser = SolidityParser::with_policy(Arc::new(RichPolicy));
    let options = FilterOptions {
        exclude_tests: true,
        ..FilterOptions::default()
    };
    let mut contracts = parser.parse_files(&files, &options);
    for contract in contracts.iter_mut() {
        contract.is_external_library = Some(true);
        contract.library_source = Some(library.source.clone());
    }

    let call_graph = build_call_graph(&library.name, contracts);
    info!(
        "Built library graph {} {}: {} contracts from {} files",
        library.id,
        library.version,
        call_graph.contracts.len(),
        files.len()
    );

    Ok(LibraryGraph {
        id: library.id.clone(),
        name: library.name.clone(),
        version: library.version.clone(),
        generated_at: call_graph.generated_at,
        call_graph,
    })
}

/// Write `graph` as `<dir>/<id>.json`, creating `dir` if needed.
pub fn write_library_graph(graph: &LibraryGraph, dir: &Path) -> Result<PathBuf, CacheError> {
    std::fs::create_dir_all(dir).map_err(|source| CacheError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(format!("{}.json", graph.id));
    let content = serde_json::to_string(graph)?;
    std::fs::write(&path, content).map_err(|source| CacheError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub fn read_library_graph(path: &Path) -> Result<LibraryGraph, CacheError> {
    let content = std::fs::read_to_string(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CallType, DependencyType};
    use crate::resolver::{ImportResolver, LibraryIndex, Resolution};
    use std::fs;

    fn library() -> LibraryConfig {
        LibraryConfig {
            id: "mini-oz".to_string(),
            name: "Mini OZ".to_string(),
            version: "1.0.0".to_string(),
            prefix: "@mini/contracts/".to_string(),
            root: PathBuf::from("lib/mini"),
            source: "mini".to_string(),
        }
    }

    fn write_library(base: &Path) {
        let root = base.join("lib/mini");
        fs::create_dir_all(root.join("utils")).unwrap();
        fs::create_dir_all(root.join("token")).unwrap();
        fs::write(
            root.join("utils/Math.sol"),
            "library Math {\n    function max(uint256 a, uint256 b) internal pure returns (uint256) { return a > b ? a : b; }\n}",
        )
        .unwrap();
        fs::write(
            root.join("token/Capped.sol"),
            r#"import "../utils/Math.sol";
error CapExceeded(uint256 cap);
contract Capped {
    uint256 cap;
    function limit(uint256 amount) external view returns (uint256) {
        if (amount > cap) revert CapExceeded(cap);
        return Math.max(amount, cap);
    }
}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_build_write_and_index() {
        let dir = tempfile::tempdir().unwrap();
        write_library(dir.path());

        let graph = build_library_graph(&library(), dir.path()).unwrap();
        assert_eq!(graph.call_graph.contracts.len(), 2);
        assert!(graph
            .call_graph
            .contracts
            .iter()
            .all(|c| c.is_external_library() && c.library_source.as_deref() == Some("mini")));

        let capped = graph.call_graph.contract("Capped").unwrap();
        assert_eq!(capped.file_path, "@mini/contracts/token/Capped.sol");
        let calls = &capped.external_functions[0].calls;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].call_type, CallType::Library);
        assert_eq!(calls[0].target, "Math.max");
        assert!(graph
            .call_graph
            .has_dependency("Capped", "Math", DependencyType::Uses));

        let cache_dir = dir.path().join("cache");
        let path = write_library_graph(&graph, &cache_dir).unwrap();
        assert_eq!(path, cache_dir.join("mini-oz.json"));
        let loaded = read_library_graph(&path).unwrap();
        assert_eq!(loaded.id, "mini-oz");
        assert_eq!(loaded.call_graph.contracts, graph.call_graph.contracts);

        let index = LibraryIndex::new();
        assert_eq!(index.load_dir(&cache_dir).unwrap(), 1);
        let Some(Resolution::Parsed { contracts, .. }) =
            index.resolve("@mini/contracts/utils/Math.sol")
        else {
            panic!("expected Math to resolve from the cache");
        };
        assert_eq!(contracts[0].name, "Math");
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            build_library_graph(&library(), dir.path()),
            Err(CacheError::MissingRoot(_))
        ));
    }
}
