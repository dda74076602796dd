//! External dependency resolution
//!
//! Expands the external imports of a project breadth-first, bringing the
//! imported library contracts into the contract list so the graph builder can
//! link against them. Where contracts come from is decided by an
//! [`ImportResolver`]: [`FsResolver`] reads library checkouts from disk,
//! [`LibraryIndex`] serves pre-built library graphs.

pub mod filesystem;
pub mod index;
pub mod paths;

pub use filesystem::{FsResolver, LibraryMapping};
pub use index::LibraryIndex;
pub use paths::normalize_import_path;

use crate::error::ResolveError;
use crate::model::Contract;
use crate::parser::imports::resolve_import_path;
use crate::parser::SolidityParser;
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_DEPTH: usize = 5;

#[derive(Debug, Clone)]
pub enum Resolution {
    /// Source text to parse; `logical_path` becomes the contracts' file path.
    Source {
        logical_path: String,
        content: String,
        library_source: String,
    },
    /// Contracts that were parsed ahead of time.
    Parsed {
        contracts: Vec<Contract>,
        library_source: String,
    },
}

pub trait ImportResolver: Send + Sync {
    fn resolve(&self, import_path: &str) -> Option<Resolution>;
}

impl<R: ImportResolver + ?Sized> ImportResolver for std::sync::Arc<R> {
    fn resolve(&self, import_path: &str) -> Option<Resolution> {
        (**self).resolve(import_path)
    }
}

/// Tries each resolver in order; the first hit wins.
pub struct ChainResolver {
    resolvers: Vec<Box<dyn ImportResolver>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    pub fn with(mut self, resolver: impl ImportResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl Default for ChainResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportResolver for ChainResolver {
    fn resolve(&self, import_path: &str) -> Option<Resolution> {
        self.resolvers.iter().find_map(|r| r.resolve(import_path))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    /// Project contracts followed by the library contracts brought in.
    pub contracts: Vec<Contract>,
    pub resolved: Vec<String>,
    pub unresolved: Vec<String>,
    pub rounds: usize,
    /// Import paths still queued when the depth bound was reached.
    pub pending_at_limit: usize,
}

impl ResolutionReport {
    pub fn external_count(&self) -> usize {
        self.contracts
            .iter()
            .filter(|c| c.is_external_library())
            .count()
    }
}

/// Expand external imports breadth-first, at most `max_depth` rounds.
///
/// A contract name is only ever added once: project contracts shadow library
/// contracts, and among libraries the first one resolved wins.
pub fn resolve_external_dependencies(
    contracts: Vec<Contract>,
    resolver: &dyn ImportResolver,
    parser: &SolidityParser,
    max_depth: usize,
) -> Result<ResolutionReport, ResolveError> {
    if max_depth == 0 {
        return Err(ResolveError::ZeroDepth);
    }

    let mut known = contracts
        .iter()
        .map(|c| c.name.clone())
        .collect::<HashSet<_>>();
    let mut processed = HashSet::new();
    let mut frontier = Vec::new();
    for contract in &contracts {
        for path in contract.external_import_paths() {
            enqueue(&mut frontier, &processed, normalize_import_path(path));
        }
    }

    let mut report = ResolutionReport {
        contracts,
        ..ResolutionReport::default()
    };

    while !frontier.is_empty() && report.rounds < max_depth {
        report.rounds += 1;
        debug!(
            "Resolution round {}: {} imports queued",
            report.rounds,
            frontier.len()
        );

        let mut next = Vec::new();
        for path in std::mem::take(&mut frontier) {
            if !processed.insert(path.clone()) {
                continue;
            }

            let Some(resolution) = resolver.resolve(&path) else {
                warn!("Unresolved import: {}", path);
                report.unresolved.push(path);
                continue;
            };

            let (found, library_source) = match resolution {
                Resolution::Source {
                    logical_path,
                    content,
                    library_source,
                } => (
                    parser.parse_file(&logical_path, &content).contracts,
                    library_source,
                ),
                Resolution::Parsed {
                    contracts,
                    library_source,
                } => (contracts, library_source),
            };

            for mut contract in found {
                for import in &contract.imports {
                    let target = if import.is_external {
                        normalize_import_path(&import.path)
                    } else {
                        normalize_import_path(&resolve_import_path(
                            &contract.file_path,
                            &import.path,
                        ))
                    };
                    enqueue(&mut next, &processed, target);
                }

                if known.insert(contract.name.clone()) {
                    contract.is_external_library = Some(true);
                    contract.library_source = Some(library_source.clone());
                    report.contracts.push(contract);
                }
            }
            report.resolved.push(path);
        }

        frontier = next;
    }

    report.pending_at_limit = frontier
        .iter()
        .filter(|path| !processed.contains(*path))
        .count();
    if report.pending_at_limit > 0 {
        warn!(
            "Stopped at depth {} with {} imports still pending",
            max_depth, report.pending_at_limit
        );
    }

    info!(
        "Resolved {} imports ({} unresolved) in {} rounds; {} library contracts added",
        report.resolved.len(),
        report.unresolved.len(),
        report.rounds,
        report.external_count()
    );
    Ok(report)
}

fn enqueue(queue: &mut Vec<String>, processed: &HashSet<String>, path: String) {
    if !processed.contains(&path) && !queue.contains(&path) {
        queue.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContractKind;
    use std::collections::HashMap;

    /// In-memory sources keyed by logical path.
    struct MapResolver(HashMap<String, String>);

    impl ImportResolver for MapResolver {
        fn resolve(&self, import_path: &str) -> Option<Resolution> {
            self.0.get(import_path).map(|content| Resolution::Source {
                logical_path: import_path.to_string(),
                content: content.clone(),
                library_source: "lib".to_string(),
            })
        }
    }

    fn project(import: &str) -> Vec<Contract> {
        let source = format!("import \"{}\";\ncontract App {{}}", import);
        SolidityParser::new()
            .parse_file("src/App.sol", &source)
            .contracts
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let resolver = MapResolver(HashMap::new());
        let result = resolve_external_dependencies(Vec::new(), &resolver, &SolidityParser::new(), 0);
        assert!(matches!(result, Err(ResolveError::ZeroDepth)));
    }

    #[test]
    fn test_follows_relative_imports_inside_libraries() {
        let mut files = HashMap::new();
        files.insert(
            "lib/token/Token.sol".to_string(),
            "import \"../utils/Context.sol\";\ncontract Token is Context {}".to_string(),
        );
        files.insert(
            "lib/utils/Context.sol".to_string(),
            "abstract contract Context {}".to_string(),
        );
        let resolver = MapResolver(files);

        let report = resolve_external_dependencies(
            project("lib/token/Token.sol"),
            &resolver,
            &SolidityParser::new(),
            DEFAULT_MAX_DEPTH,
        )
        .unwrap();

        let names = report
            .contracts
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["App", "Token", "Context"]);
        assert_eq!(report.rounds, 2);
        assert!(report.unresolved.is_empty());
        assert!(report.contracts[1].is_external_library());
        assert_eq!(report.contracts[2].kind, ContractKind::Abstract);
        assert_eq!(report.contracts[2].library_source.as_deref(), Some("lib"));
    }

    #[test]
    fn test_depth_bound_and_unresolved() {
        let mut files = HashMap::new();
        files.insert(
            "lib/A.sol".to_string(),
            "import \"lib/B.sol\";\nimport \"lib/Missing.sol\";\ncontract A {}".to_string(),
        );
        files.insert("lib/B.sol".to_string(), "contract B {}".to_string());
        let resolver = MapResolver(files);

        let report =
            resolve_external_dependencies(project("lib/A.sol"), &resolver, &SolidityParser::new(), 1)
                .unwrap();
        assert_eq!(report.rounds, 1);
        assert_eq!(report.pending_at_limit, 2);
        assert_eq!(report.external_count(), 1);

        let report =
            resolve_external_dependencies(project("lib/A.sol"), &resolver, &SolidityParser::new(), 5)
                .unwrap();
        assert_eq!(report.unresolved, vec!["lib/Missing.sol"]);
        assert_eq!(report.pending_at_limit, 0);
    }
}
