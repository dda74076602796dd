//! Directory tree and aggregate statistics.

use crate::model::{Contract, ContractKind, DirectoryNode, GraphStats, NodeType};

fn segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Longest common directory prefix. Never includes a file name, so a single
/// file's prefix is its containing directory.
fn common_prefix<'a>(paths: &[Vec<&'a str>]) -> Vec<&'a str> {
    let Some(first) = paths.first() else {
        return Vec::new();
    };
    let max = paths.iter().map(|p| p.len()).min().unwrap_or(0).saturating_sub(1);

    let mut prefix = Vec::new();
    for (i, segment) in first.iter().take(max).enumerate() {
        if paths.iter().all(|p| p[i] == *segment) {
            prefix.push(*segment);
        } else {
            break;
        }
    }
    prefix
}

/// Tree of the contracts' file paths with the common prefix removed. File
/// nodes name the first contract in the file and list all of them.
pub fn build_directory_tree(contracts: &[Contract]) -> DirectoryNode {
    let paths = contracts
        .iter()
        .map(|c| segments(&c.file_path))
        .collect::<Vec<_>>();
    let prefix = common_prefix(&paths);

    let root_name = prefix.last().copied().unwrap_or("root");
    let mut root = DirectoryNode::directory(root_name, prefix.join("/"));

    for (contract, path) in contracts.iter().zip(&paths) {
        let relative = &path[prefix.len()..];
        let Some((file, directories)) = relative.split_last() else {
            continue;
        };

        let mut node = &mut root;
        let mut current = prefix.join("/");
        for directory in directories {
            current = join(&current, directory);
            let index = match node
                .children
                .iter()
                .position(|c| c.node_type == NodeType::Directory && c.name == *directory)
            {
                Some(index) => index,
                None => {
                    node.children
                        .push(DirectoryNode::directory(*directory, current.clone()));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }

        let file_path = join(&current, file);
        match node
            .children
            .iter_mut()
            .find(|c| c.node_type == NodeType::File && c.name == *file)
        {
            Some(existing) => {
                if !existing.contracts.contains(&contract.name) {
                    existing.contracts.push(contract.name.clone());
                }
            }
            None => node.children.push(DirectoryNode {
                name: file.to_string(),
                path: file_path,
                node_type: NodeType::File,
                children: Vec::new(),
                contract_name: Some(contract.name.clone()),
                contracts: vec![contract.name.clone()],
            }),
        }
    }

    root
}

fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", base, segment)
    }
}

/// Counts after inheritance resolution, so inherited functions count
/// toward `total_functions`.
pub fn compute_stats(contracts: &[Contract]) -> GraphStats {
    let mut stats = GraphStats::default();
    for contract in contracts {
        match contract.kind {
            ContractKind::Contract | ContractKind::Abstract => stats.total_contracts += 1,
            ContractKind::Library => stats.total_libraries += 1,
            ContractKind::Interface => stats.total_interfaces += 1,
        }
        stats.total_functions += contract.function_count();
    }
    stats
}
