//! Multi-file parsing with contract filters.

use crate::model::{Contract, ContractKind};
use crate::parser::source::SolidityParser;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// One input file: logical path plus full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// All `.sol` files under `dir` (or `dir` itself), sorted by path.
pub fn find_solidity_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "sol") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Read every `.sol` file under `root`. Logical paths are the paths relative
/// to `root`, joined onto `logical_prefix` (which may be empty).
pub fn read_source_files(root: &Path, logical_prefix: &str) -> io::Result<Vec<SourceFile>> {
    let base = if root.is_file() {
        root.parent().unwrap_or(root)
    } else {
        root
    };

    find_solidity_files(root)?
        .into_iter()
        .map(|path| -> io::Result<SourceFile> {
            let content = std::fs::read_to_string(&path)?;
            let relative = path
                .strip_prefix(base)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            Ok(SourceFile::new(format!("{}{}", logical_prefix, relative), content))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub exclude_interfaces: bool,
    pub exclude_libraries: bool,
    pub exclude_mocks: bool,
    pub exclude_storages: bool,
    pub exclude_tests: bool,
    pub parallel: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            exclude_interfaces: false,
            exclude_libraries: false,
            exclude_mocks: true,
            exclude_storages: false,
            exclude_tests: false,
            parallel: true,
        }
    }
}

impl FilterOptions {
    /// Keep everything the parser produces.
    pub fn keep_all() -> Self {
        Self {
            exclude_mocks: false,
            ..Self::default()
        }
    }

    pub fn keeps(&self, contract: &Contract) -> bool {
        if self.exclude_interfaces && contract.kind == ContractKind::Interface {
            return false;
        }
        if self.exclude_libraries && contract.kind == ContractKind::Library {
            return false;
        }
        if self.exclude_mocks && is_mock(contract) {
            return false;
        }
        if self.exclude_storages && is_storage(contract) {
            return false;
        }
        if self.exclude_tests && is_test_file(&contract.file_path) {
            return false;
        }
        true
    }
}

pub fn is_mock(contract: &Contract) -> bool {
    contract.name.to_ascii_lowercase().contains("mock")
}

pub fn is_storage(contract: &Contract) -> bool {
    contract.name.to_ascii_lowercase().contains("storage")
        || directories(&contract.file_path).any(|d| d == "storages" || d == "storage")
}

pub fn is_test_file(path: &str) -> bool {
    path.ends_with(".t.sol") || directories(path).any(|d| d == "test" || d == "tests")
}

fn directories(path: &str) -> impl Iterator<Item = &str> {
    let mut segments = path.split(['/', '\\']).collect::<Vec<_>>();
    segments.pop();
    segments.into_iter()
}

impl SolidityParser {
    /// Parse every file and apply `options`. The result follows input file
    /// order, then declaration order within a file, in both modes.
    pub fn parse_files(&self, files: &[SourceFile], options: &FilterOptions) -> Vec<Contract> {
        let per_file = if options.parallel {
            files
                .par_iter()
                .map(|file| self.parse_file(&file.path, &file.content).contracts)
                .collect::<Vec<_>>()
        } else {
            files
                .iter()
                .map(|file| self.parse_file(&file.path, &file.content).contracts)
                .collect::<Vec<_>>()
        };

        let parsed = per_file.iter().map(Vec::len).sum::<usize>();
        let contracts = per_file
            .into_iter()
            .flatten()
            .filter(|contract| options.keeps(contract))
            .collect::<Vec<_>>();

        info!(
            "Parsed {} files: {} contracts ({} filtered out)",
            files.len(),
            contracts.len(),
            parsed - contracts.len()
        );
        contracts
    }
}

/// Parse a set of files with the default (simple) call policy.
pub fn parse_solidity_files(files: &[SourceFile], options: &FilterOptions) -> Vec<Contract> {
    SolidityParser::new().parse_files(files, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> Vec<SourceFile> {
        vec![
            SourceFile::new("src/IVault.sol", "interface IVault { function f() external; }"),
            SourceFile::new("src/Math.sol", "library Math { function g() internal {} }"),
            SourceFile::new("src/mocks/VaultMock.sol", "contract VaultMock { function h() public {} }"),
            SourceFile::new("src/storages/VaultStorage.sol", "contract VaultStorage {}"),
            SourceFile::new("test/Vault.t.sol", "contract VaultTest { function testA() public {} }"),
            SourceFile::new("src/Vault.sol", "contract Vault { function k() public {} }"),
        ]
    }

    fn names(contracts: &[Contract]) -> Vec<&str> {
        contracts.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_default_filters_drop_mocks_only() {
        let contracts = parse_solidity_files(&files(), &FilterOptions::default());
        assert_eq!(
            names(&contracts),
            vec!["IVault", "Math", "VaultStorage", "VaultTest", "Vault"]
        );
    }

    #[test]
    fn test_every_filter() {
        let options = FilterOptions {
            exclude_interfaces: true,
            exclude_libraries: true,
            exclude_mocks: true,
            exclude_storages: true,
            exclude_tests: true,
            parallel: false,
        };
        let contracts = parse_solidity_files(&files(), &options);
        assert_eq!(names(&contracts), vec!["Vault"]);
    }

    #[test]
    fn test_parallel_preserves_input_order() {
        let sequential = parse_solidity_files(
            &files(),
            &FilterOptions {
                parallel: false,
                ..FilterOptions::keep_all()
            },
        );
        let parallel = parse_solidity_files(&files(), &FilterOptions::keep_all());
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.len(), 6);
    }

    #[test]
    fn test_read_source_files_uses_logical_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("access")).unwrap();
        std::fs::write(dir.path().join("access/Ownable.sol"), "abstract contract Ownable {}").unwrap();
        std::fs::write(dir.path().join("README.md"), "docs").unwrap();

        let files = read_source_files(dir.path(), "@openzeppelin/contracts/").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "@openzeppelin/contracts/access/Ownable.sol");
    }

    #[test]
    fn test_path_predicates() {
        assert!(is_test_file("test/Token.sol"));
        assert!(is_test_file("src/Token.t.sol"));
        assert!(!is_test_file("src/testing/Token.sol"));
        assert!(!is_test_file("src/Attest.sol"));
    }
}
