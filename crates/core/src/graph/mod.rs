//! Call graph construction
//!
//! Four passes in a fixed order. Each pass consumes the previous pass's
//! output type, so a later pass cannot run on contracts that are missing the
//! annotations it depends on:
//!
//! 1. [`detect_proxy_groups`]: `Vec<Contract>` -> [`ProxyAnnotated`]
//! 2. [`resolve_inherited_functions`]: [`ProxyAnnotated`] -> [`InheritanceResolved`]
//! 3. [`detect_dependencies`]: edges from [`InheritanceResolved`]
//! 4. [`build_directory_tree`] and [`compute_stats`]

pub mod dependencies;
pub mod inheritance;
pub mod proxy;
pub mod structure;

pub use dependencies::{detect_dependencies, ContractLookup};
pub use inheritance::{resolve_inherited_functions, InheritanceResolved};
pub use proxy::{detect_proxy_groups, detect_proxy_pattern, module_location, ProxyAnnotated};
pub use structure::{build_directory_tree, compute_stats};

use crate::model::{CallGraph, Contract};
use chrono::Utc;
use tracing::info;

pub const GRAPH_VERSION: &str = "1.0.0";

pub fn build_call_graph(project_name: &str, contracts: Vec<Contract>) -> CallGraph {
    let annotated = detect_proxy_groups(contracts);
    let resolved = resolve_inherited_functions(annotated);
    let dependencies = detect_dependencies(&resolved);

    let InheritanceResolved {
        contracts,
        proxy_groups,
    } = resolved;
    let structure = build_directory_tree(&contracts);
    let stats = compute_stats(&contracts);

    info!(
        "Built call graph for {}: {} contracts, {} dependencies, {} proxy groups",
        project_name,
        contracts.len(),
        dependencies.len(),
        proxy_groups.len()
    );

    CallGraph {
        version: GRAPH_VERSION.to_string(),
        generated_at: Utc::now(),
        project_name: project_name.to_string(),
        structure,
        contracts,
        dependencies,
        proxy_groups,
        stats,
        user_edges: None,
        deleted_edge_ids: None,
    }
}
