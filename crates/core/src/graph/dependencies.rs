//! Dependency edge detection
//!
//! Names in `inherits`, `implements`, `usesLibraries` and delegatecall
//! targets are resolved to contracts through the declaring contract's
//! imports first, then by plain name. Unresolvable names produce no edge.

use super::inheritance::InheritanceResolved;
use crate::classify::{ENCODED_CALL_TARGET, UNKNOWN_TARGET};
use crate::model::{
    CallType, Contract, ContractKind, Dependency, DependencyType, ProxyGroup, ProxyPattern,
    ProxyRole,
};
use crate::parser::imports::resolve_import_path;
use crate::resolver::normalize_import_path;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Name and import-path lookup over the final contract list.
pub struct ContractLookup<'a> {
    contracts: &'a [Contract],
    by_name: HashMap<&'a str, usize>,
    normalized_paths: Vec<String>,
}

impl<'a> ContractLookup<'a> {
    pub fn new(contracts: &'a [Contract]) -> Self {
        let mut by_name = HashMap::new();
        for (i, contract) in contracts.iter().enumerate() {
            by_name.entry(contract.name.as_str()).or_insert(i);
        }
        Self {
            contracts,
            by_name,
            normalized_paths: contracts
                .iter()
                .map(|c| normalize_import_path(&c.file_path))
                .collect(),
        }
    }

    pub fn by_name(&self, name: &str) -> Option<&'a Contract> {
        self.by_name.get(name).map(|&i| &self.contracts[i])
    }

    /// Resolve `name` as referenced from `from`. An import that names or
    /// aliases `name` selects the file; within it the imported (unaliased)
    /// name is preferred.
    pub fn resolve(&self, from: &Contract, name: &str) -> Option<&'a Contract> {
        if let Some(import) = from.imports.iter().find(|i| i.refers_to(name)) {
            let target_path =
                normalize_import_path(&resolve_import_path(&from.file_path, &import.path));
            let in_file = self
                .contracts
                .iter()
                .zip(&self.normalized_paths)
                .filter(|(_, path)| paths_match(path, &target_path))
                .map(|(c, _)| c)
                .collect::<Vec<_>>();

            let found = in_file
                .iter()
                .find(|c| c.name == import.name)
                .or_else(|| in_file.iter().find(|c| c.name == name))
                .copied();
            if found.is_some() {
                return found;
            }
            if let Some(found) = self.by_name(&import.name) {
                return Some(found);
            }
        }
        self.by_name(name)
    }
}

/// Exact match, or one path is a whole-segment suffix of the other.
fn paths_match(candidate: &str, target: &str) -> bool {
    if candidate.is_empty() || target.is_empty() {
        return false;
    }
    is_path_suffix(candidate, target) || is_path_suffix(target, candidate)
}

fn is_path_suffix(path: &str, suffix: &str) -> bool {
    match path.strip_suffix(suffix) {
        Some("") => true,
        Some(rest) => rest.ends_with('/'),
        None => false,
    }
}

#[derive(Default)]
struct EdgeSet {
    seen: HashSet<(String, String, DependencyType)>,
    edges: Vec<Dependency>,
}

impl EdgeSet {
    fn push(
        &mut self,
        from: &str,
        to: &str,
        dependency_type: DependencyType,
        functions: Option<Vec<String>>,
    ) {
        if from == to {
            return;
        }
        if self
            .seen
            .insert((from.to_string(), to.to_string(), dependency_type))
        {
            self.edges.push(Dependency {
                from: from.to_string(),
                to: to.to_string(),
                dependency_type,
                functions,
            });
        }
    }
}

/// Distinct library functions `from` calls on `library`, in first-call order.
fn called_library_functions(
    lookup: &ContractLookup<'_>,
    from: &Contract,
    library: &Contract,
) -> Vec<String> {
    let mut functions = Vec::new();
    for call in from.own_calls() {
        if call.call_type != CallType::Library {
            continue;
        }
        let Some((qualifier, member)) = call.qualified_parts() else {
            continue;
        };
        let targets_library = qualifier == library.name
            || lookup
                .resolve(from, qualifier)
                .is_some_and(|c| c.name == library.name);
        if targets_library && !functions.iter().any(|f| f == member) {
            functions.push(member.to_string());
        }
    }
    functions
}

fn is_sentinel(target: &str) -> bool {
    target == UNKNOWN_TARGET || target == ENCODED_CALL_TARGET
}

/// Pass 3: all dependency edges, deduplicated by `(from, to, type)`.
pub fn detect_dependencies(resolved: &InheritanceResolved) -> Vec<Dependency> {
    let contracts = &resolved.contracts;
    let lookup = ContractLookup::new(contracts);
    let mut edges = EdgeSet::default();

    for contract in contracts {
        for base in &contract.inherits {
            if let Some(target) = lookup.resolve(contract, base) {
                edges.push(&contract.name, &target.name, DependencyType::Inherits, None);
            }
        }

        for interface in &contract.implements {
            if let Some(target) = lookup.resolve(contract, interface) {
                edges.push(&contract.name, &target.name, DependencyType::Implements, None);
            }
        }

        for library in &contract.uses_libraries {
            if let Some(target) = lookup.resolve(contract, library) {
                let functions = called_library_functions(&lookup, contract, target);
                edges.push(&contract.name, &target.name, DependencyType::Uses, Some(functions));
            }
        }

        // Direct `Lib.fn(...)` calls link libraries that have no `using for`.
        for call in contract.own_calls() {
            if call.call_type != CallType::Library {
                continue;
            }
            let Some((qualifier, _)) = call.qualified_parts() else {
                continue;
            };
            if let Some(target) = lookup.resolve(contract, qualifier) {
                if target.kind == ContractKind::Library {
                    let functions = called_library_functions(&lookup, contract, target);
                    edges.push(
                        &contract.name,
                        &target.name,
                        DependencyType::Uses,
                        Some(functions),
                    );
                }
            }
        }

        for call in contract.own_calls() {
            if call.call_type != CallType::Delegatecall || is_sentinel(&call.target) {
                continue;
            }
            if let Some(target) = lookup.resolve(contract, &call.target) {
                edges.push(&contract.name, &target.name, DependencyType::Delegatecall, None);
            }
        }
    }

    proxy_edges(contracts, &resolved.proxy_groups, &mut edges);

    debug!("Detected {} dependency edges", edges.edges.len());
    edges.edges
}

fn proxy_edges(contracts: &[Contract], groups: &[ProxyGroup], edges: &mut EdgeSet) {
    for contract in contracts {
        let dependency_type = match contract.proxy_role {
            Some(ProxyRole::Proxy) => DependencyType::Delegatecall,
            Some(ProxyRole::Dictionary) => DependencyType::Registers,
            _ => continue,
        };
        let Some(group_id) = contract.proxy_group_id.as_deref() else {
            continue;
        };

        let mut targets = contracts
            .iter()
            .filter(|c| {
                c.proxy_group_id.as_deref() == Some(group_id)
                    && c.proxy_role == Some(ProxyRole::Implementation)
            })
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>();
        if let Some(group) = groups.iter().find(|g| g.id == group_id) {
            for name in &group.implementations {
                if !targets.contains(&name.as_str()) {
                    targets.push(name);
                }
            }
        }

        for target in targets {
            edges.push(&contract.name, target, dependency_type, None);
        }
    }

    let dictionaries = contracts
        .iter()
        .filter(|c| {
            c.proxy_pattern == Some(ProxyPattern::Eip7546)
                && c.proxy_role == Some(ProxyRole::Dictionary)
        })
        .collect::<Vec<_>>();
    for proxy in contracts.iter().filter(|c| {
        c.proxy_pattern == Some(ProxyPattern::Eip7546) && c.proxy_role == Some(ProxyRole::Proxy)
    }) {
        for dictionary in &dictionaries {
            edges.push(&proxy.name, &dictionary.name, DependencyType::Uses, None);
        }
    }
}
