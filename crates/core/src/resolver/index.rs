//! Warm resolution: pre-built library graphs held in memory.
//!
//! The index is an explicit object with a preload phase. Build it once with
//! [`LibraryIndex::preload`], [`LibraryIndex::preload_records`] or
//! [`LibraryIndex::load_dir`], then share it behind an `Arc` between
//! resolutions.

use super::paths::{import_stem, normalize_import_path};
use super::{ImportResolver, Resolution};
use crate::cache::{read_library_graph, LibraryGraph};
use crate::error::CacheError;
use crate::model::Contract;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct IndexState {
    by_path: HashMap<String, Vec<Contract>>,
    by_name: HashMap<String, Contract>,
    sources: Vec<String>,
}

#[derive(Debug, Default)]
pub struct LibraryIndex {
    state: RwLock<IndexState>,
}

impl LibraryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the contracts of one library. Contracts are keyed by their
    /// normalized file path; for the name fallback the first contract
    /// registered under a name wins. Contracts are stored as the parser
    /// would produce them, without proxy or inheritance annotations.
    pub fn preload(&self, library_source: &str, contracts: impl IntoIterator<Item = Contract>) {
        let mut state = self.state.write();
        let mut added = 0;

        for mut contract in contracts {
            contract.clear_graph_annotations();
            contract.is_external_library = Some(true);
            if contract.library_source.is_none() {
                contract.library_source = Some(library_source.to_string());
            }

            state
                .by_name
                .entry(contract.name.clone())
                .or_insert_with(|| contract.clone());
            state
                .by_path
                .entry(normalize_import_path(&contract.file_path))
                .or_default()
                .push(contract);
            added += 1;
        }

        if !state.sources.iter().any(|s| s == library_source) {
            state.sources.push(library_source.to_string());
        }
        debug!("Indexed {} contracts from {}", added, library_source);
    }

    pub fn preload_records(&self, records: impl IntoIterator<Item = LibraryGraph>) {
        for record in records {
            self.preload(&record.id, record.call_graph.contracts);
        }
    }

    /// Load every `*.json` library graph in `dir`. Returns the number of
    /// records loaded.
    pub fn load_dir(&self, dir: &Path) -> Result<usize, CacheError> {
        let entries = std::fs::read_dir(dir).map_err(|source| CacheError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CacheError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut loaded = 0;
        for path in &paths {
            let record = read_library_graph(path)?;
            self.preload_records([record]);
            loaded += 1;
        }

        info!("Loaded {} library graphs from {}", loaded, dir.display());
        Ok(loaded)
    }

    pub fn contract_count(&self) -> usize {
        self.state.read().by_path.values().map(Vec::len).sum()
    }

    pub fn sources(&self) -> Vec<String> {
        self.state.read().sources.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().by_path.is_empty()
    }
}

impl ImportResolver for LibraryIndex {
    fn resolve(&self, import_path: &str) -> Option<Resolution> {
        let normalized = normalize_import_path(import_path);
        let state = self.state.read();

        let contracts = match state.by_path.get(&normalized) {
            Some(contracts) => contracts.clone(),
            None => vec![state.by_name.get(import_stem(&normalized))?.clone()],
        };
        let library_source = contracts
            .first()
            .and_then(|c| c.library_source.clone())
            .unwrap_or_default();

        Some(Resolution::Parsed {
            contracts,
            library_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContractKind;

    fn ownable() -> Contract {
        Contract::new(
            "Ownable",
            ContractKind::Abstract,
            "@openzeppelin/contracts/access/Ownable.sol",
        )
    }

    #[test]
    fn test_resolves_by_path_then_by_name() {
        let index = LibraryIndex::new();
        index.preload("openzeppelin", vec![ownable()]);

        let Some(Resolution::Parsed {
            contracts,
            library_source,
        }) = index.resolve("@openzeppelin/contracts@5.0.2/access/Ownable.sol")
        else {
            panic!("expected a parsed resolution");
        };
        assert_eq!(contracts[0].name, "Ownable");
        assert_eq!(library_source, "openzeppelin");
        assert_eq!(contracts[0].is_external_library, Some(true));

        // Different layout, same contract name.
        assert!(index.resolve("openzeppelin-contracts/Ownable.sol").is_some());
        assert!(index.resolve("@openzeppelin/contracts/access/Missing.sol").is_none());
    }

    #[test]
    fn test_first_name_wins() {
        let index = LibraryIndex::new();
        index.preload("openzeppelin", vec![ownable()]);
        index.preload(
            "other",
            vec![Contract::new("Ownable", ContractKind::Contract, "other/Ownable.sol")],
        );

        let Some(Resolution::Parsed { library_source, .. }) = index.resolve("x/Ownable.sol") else {
            panic!("expected a parsed resolution");
        };
        assert_eq!(library_source, "openzeppelin");
        assert_eq!(index.contract_count(), 2);
        assert_eq!(index.sources(), vec!["openzeppelin", "other"]);
    }
}
