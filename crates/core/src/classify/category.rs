//! Display grouping for contracts. Never consulted by call classification or
//! dependency resolution.

use crate::model::ContractKind;

/// (path marker, category prefix), checked in order so the upgradeable
/// variants win over the plain ones.
const LIBRARY_PREFIXES: &[(&str, &str)] = &[
    ("@openzeppelin/contracts-upgradeable/", "OpenZeppelin-Upgradeable"),
    ("openzeppelin-contracts-upgradeable/contracts/", "OpenZeppelin-Upgradeable"),
    ("@openzeppelin/contracts/", "OpenZeppelin"),
    ("openzeppelin-contracts/contracts/", "OpenZeppelin"),
    ("solady/src/", "Solady"),
    ("solady/", "Solady"),
];

const STRUCTURAL_DIRS: &[&str] = &[
    "contracts",
    "contract",
    "src",
    "lib",
    "libs",
    "test",
    "tests",
    "mocks",
    "mock",
    "interfaces",
    "interface",
    "node_modules",
    "script",
    "scripts",
    "abstract",
    "abstracts",
    ".",
    "..",
];

pub fn determine_category(
    name: &str,
    inherits: &[String],
    kind: ContractKind,
    file_path: &str,
) -> String {
    match kind {
        ContractKind::Interface => return "interface".to_string(),
        ContractKind::Library => return "library".to_string(),
        _ => {}
    }

    let path = file_path.replace('\\', "/");

    for (marker, prefix) in LIBRARY_PREFIXES {
        if let Some(idx) = path.find(marker) {
            let rest = &path[idx + marker.len()..];
            let mut segments = rest.split('/').collect::<Vec<_>>();
            segments.pop();
            return match segments.first() {
                Some(subdir) if !subdir.is_empty() => format!("{}/{}", prefix, subdir),
                _ => prefix.to_string(),
            };
        }
    }

    let mut segments = path.split('/').collect::<Vec<_>>();
    segments.pop();
    let meaningful = segments.into_iter().find(|segment| {
        !segment.is_empty()
            && !segment.starts_with('@')
            && !STRUCTURAL_DIRS.contains(&segment.to_ascii_lowercase().as_str())
    });
    if let Some(segment) = meaningful {
        return segment.to_string();
    }

    name_hint(name, inherits).unwrap_or("other").to_string()
}

fn name_hint(name: &str, inherits: &[String]) -> Option<&'static str> {
    let names = std::iter::once(name)
        .chain(inherits.iter().map(|s| s.as_str()))
        .map(|n| n.to_ascii_lowercase())
        .collect::<Vec<_>>();

    if names.iter().any(|n| n.contains("proxy")) {
        Some("proxy")
    } else if names
        .iter()
        .any(|n| n.contains("erc20") || n.contains("erc721") || n.contains("erc1155") || n.contains("token"))
    {
        Some("token")
    } else if names
        .iter()
        .any(|n| n.contains("ownable") || n.contains("accesscontrol"))
    {
        Some("access")
    } else {
        None
    }
}
