//! Proxy architecture detection
//!
//! Assigns a `(pattern, role)` to each contract from its function names,
//! events, bases, name and path, then groups related contracts. The checks
//! run in a fixed priority order; several of them only exclude each other
//! because of that order.

use crate::model::{Contract, ContractKind, ProxyGroup, ProxyPattern, ProxyRole};
use std::collections::HashSet;
use tracing::debug;

/// Structural directories that identify a module, in check order.
const MODULE_DIRS: &[&str] = &["functions", "libs", "interfaces", "storages"];

pub const CORE_GROUP_ID: &str = "eip7546-core";

/// Output of the proxy pass: every contract carries its final proxy
/// annotations and group membership.
#[derive(Debug, Clone)]
pub struct ProxyAnnotated {
    pub contracts: Vec<Contract>,
    pub proxy_groups: Vec<ProxyGroup>,
}

struct Signals {
    functions: HashSet<String>,
    events: HashSet<String>,
    bases: Vec<String>,
    name: String,
    path: String,
}

impl Signals {
    fn of(contract: &Contract) -> Self {
        Self {
            functions: contract.function_names().map(str::to_string).collect(),
            events: contract.event_names().map(str::to_string).collect(),
            bases: contract
                .inherits
                .iter()
                .map(|b| b.to_ascii_lowercase())
                .collect(),
            name: contract.name.to_ascii_lowercase(),
            path: format!("/{}", contract.file_path.replace('\\', "/").to_ascii_lowercase()),
        }
    }

    fn exposes(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.functions.contains(*n))
    }

    fn emits(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.events.contains(*n))
    }

    fn base_contains(&self, needle: &str) -> bool {
        self.bases.iter().any(|b| b.contains(needle))
    }
}

pub fn detect_proxy_pattern(contract: &Contract) -> Option<(ProxyPattern, ProxyRole)> {
    let s = Signals::of(contract);

    if s.name.contains("dictionary")
        || s.path.contains("/dictionary/")
        || s.emits(&["DictionaryUpgraded", "ImplementationSet"])
        || s.exposes(&["setImplementation", "bulkSetImplementation"])
    {
        return Some((ProxyPattern::Eip7546, ProxyRole::Dictionary));
    }

    if s.exposes(&["getDictionary"])
        || s.name.contains("borderlessproxy")
        || s.bases.iter().any(|b| b.contains("borderlessproxy") || b == "proxy")
        || (s.path.contains("/proxy/") && s.path.contains("/functions/"))
    {
        return Some((ProxyPattern::Eip7546, ProxyRole::Proxy));
    }

    if s.path.contains("/functions/") && !s.name.contains("lib") {
        return Some((ProxyPattern::Eip7546, ProxyRole::Implementation));
    }

    if s.exposes(&["upgradeTo", "upgradeToAndCall"]) || s.base_contains("uups") {
        let role = if s.exposes(&["proxiableUUID", "_authorizeUpgrade"]) {
            ProxyRole::Implementation
        } else {
            ProxyRole::Proxy
        };
        return Some((ProxyPattern::Uups, role));
    }

    if s.exposes(&["diamondCut", "facets", "facetAddress"]) || s.emits(&["DiamondCut"]) {
        let role = if s.path.contains("facets/") || s.name.contains("facet") {
            ProxyRole::Facet
        } else {
            ProxyRole::Proxy
        };
        return Some((ProxyPattern::Diamond, role));
    }

    if s.exposes(&["implementation"]) && (s.name.contains("beacon") || s.base_contains("beacon")) {
        return Some((ProxyPattern::Beacon, ProxyRole::Beacon));
    }
    if s.base_contains("beaconproxy") {
        return Some((ProxyPattern::Beacon, ProxyRole::Proxy));
    }

    if s.base_contains("transparentupgradeableproxy")
        || (s.name.contains("proxy") && s.exposes(&["admin"]))
    {
        return Some((ProxyPattern::Transparent, ProxyRole::Proxy));
    }

    None
}

/// Module a contract belongs to, from the directory preceding the first
/// structural segment. `base_dir` runs up to and including the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    pub module: String,
    pub base_dir: String,
    pub structural: &'static str,
}

pub fn module_location(file_path: &str) -> Option<ModuleLocation> {
    let normalized = file_path.replace('\\', "/");
    let segments = normalized
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
    let directories = &segments[..segments.len().saturating_sub(1)];

    MODULE_DIRS.iter().find_map(|structural| {
        let idx = directories
            .iter()
            .position(|s| s.eq_ignore_ascii_case(structural))?;
        let module = match idx {
            0 => "root".to_string(),
            _ => directories[idx - 1].to_string(),
        };
        Some(ModuleLocation {
            module,
            base_dir: directories[..idx].join("/"),
            structural,
        })
    })
}

fn is_role(contract: &Contract, pattern: ProxyPattern, role: ProxyRole) -> bool {
    contract.proxy_pattern == Some(pattern) && contract.proxy_role == Some(role)
}

/// Pass 1: annotate every contract and form proxy groups. Annotations from
/// an earlier build (cached library contracts) are discarded first.
pub fn detect_proxy_groups(mut contracts: Vec<Contract>) -> ProxyAnnotated {
    for contract in contracts.iter_mut() {
        contract.clear_graph_annotations();
        if let Some((pattern, role)) = detect_proxy_pattern(contract) {
            contract.proxy_pattern = Some(pattern);
            contract.proxy_role = Some(role);
        }
    }

    let locations = contracts
        .iter()
        .map(|c| module_location(&c.file_path))
        .collect::<Vec<_>>();

    let mut groups = Vec::new();
    group_eip7546_modules(&mut contracts, &locations, &mut groups);
    group_eip7546_core(&mut contracts, &mut groups);
    group_other_patterns(&mut contracts, &mut groups);

    debug!(
        "Proxy detection: {} annotated contracts, {} groups",
        contracts.iter().filter(|c| c.proxy_pattern.is_some()).count(),
        groups.len()
    );

    ProxyAnnotated {
        contracts,
        proxy_groups: groups,
    }
}

fn group_eip7546_modules(
    contracts: &mut [Contract],
    locations: &[Option<ModuleLocation>],
    groups: &mut Vec<ProxyGroup>,
) {
    // (base_dir, module) in first-seen order.
    let mut modules: Vec<(String, String)> = Vec::new();
    for (contract, location) in contracts.iter().zip(locations) {
        if !is_role(contract, ProxyPattern::Eip7546, ProxyRole::Implementation) {
            continue;
        }
        if let Some(location) = location {
            if !modules.iter().any(|(base, _)| *base == location.base_dir) {
                modules.push((location.base_dir.clone(), location.module.clone()));
            }
        }
    }

    for (base_dir, module) in modules {
        let mut id = format!("eip7546-{}", module);
        if groups.iter().any(|g: &ProxyGroup| g.id == id) {
            id = format!("{}-{}", id, groups.len() + 1);
        }

        let mut implementations = Vec::new();
        for (contract, location) in contracts.iter_mut().zip(locations) {
            let Some(location) = location else { continue };
            if location.base_dir != base_dir || contract.proxy_group_id.is_some() {
                continue;
            }

            if is_role(contract, ProxyPattern::Eip7546, ProxyRole::Implementation) {
                contract.proxy_group_id = Some(id.clone());
                implementations.push(contract.name.clone());
            } else if contract.kind == ContractKind::Library && contract.proxy_pattern.is_none() {
                contract.proxy_pattern = Some(ProxyPattern::Eip7546);
                contract.proxy_role = Some(ProxyRole::Implementation);
                contract.proxy_group_id = Some(id.clone());
                implementations.push(contract.name.clone());
            } else if location.structural == "storages" && contract.proxy_pattern.is_none() {
                contract.proxy_group_id = Some(id.clone());
            }
        }

        groups.push(ProxyGroup {
            id,
            name: module,
            pattern_type: ProxyPattern::Eip7546,
            proxy: None,
            dictionary: None,
            beacon: None,
            implementations,
        });
    }
}

fn group_eip7546_core(contracts: &mut [Contract], groups: &mut Vec<ProxyGroup>) {
    let members = contracts
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            c.proxy_group_id.is_none()
                && (is_role(c, ProxyPattern::Eip7546, ProxyRole::Dictionary)
                    || is_role(c, ProxyPattern::Eip7546, ProxyRole::Proxy))
        })
        .map(|(i, _)| i)
        .collect::<Vec<_>>();
    if members.is_empty() {
        return;
    }

    let first_with_role = |role: ProxyRole| {
        members
            .iter()
            .map(|&i| &contracts[i])
            .find(|c| c.proxy_role == Some(role))
            .map(|c| c.name.clone())
    };
    let group = ProxyGroup {
        id: CORE_GROUP_ID.to_string(),
        name: "core".to_string(),
        pattern_type: ProxyPattern::Eip7546,
        proxy: first_with_role(ProxyRole::Proxy),
        dictionary: first_with_role(ProxyRole::Dictionary),
        beacon: None,
        implementations: contracts
            .iter()
            .filter(|c| is_role(c, ProxyPattern::Eip7546, ProxyRole::Implementation))
            .map(|c| c.name.clone())
            .collect(),
    };

    for i in members {
        contracts[i].proxy_group_id = Some(group.id.clone());
    }
    groups.push(group);
}

fn group_other_patterns(contracts: &mut [Contract], groups: &mut Vec<ProxyGroup>) {
    for i in 0..contracts.len() {
        let proxy = &contracts[i];
        let Some(pattern) = proxy.proxy_pattern else {
            continue;
        };
        if pattern == ProxyPattern::Eip7546
            || proxy.proxy_role != Some(ProxyRole::Proxy)
            || proxy.proxy_group_id.is_some()
        {
            continue;
        }

        let id = format!("{}-{}", pattern.as_str(), proxy.name);
        let proxy_name = proxy.name.clone();

        let member_roles: &[ProxyRole] = match pattern {
            ProxyPattern::Diamond => &[ProxyRole::Implementation, ProxyRole::Facet],
            _ => &[ProxyRole::Implementation],
        };
        let mut implementations = Vec::new();
        let mut beacon = None;

        for (j, other) in contracts.iter_mut().enumerate() {
            if j == i || other.proxy_pattern != Some(pattern) {
                continue;
            }
            let Some(role) = other.proxy_role else { continue };

            if member_roles.contains(&role) {
                implementations.push(other.name.clone());
            } else if role == ProxyRole::Beacon && beacon.is_none() {
                beacon = Some(other.name.clone());
            } else {
                continue;
            }
            if other.proxy_group_id.is_none() {
                other.proxy_group_id = Some(id.clone());
            }
        }

        contracts[i].proxy_group_id = Some(id.clone());
        groups.push(ProxyGroup {
            id,
            name: proxy_name.clone(),
            pattern_type: pattern,
            proxy: Some(proxy_name),
            dictionary: None,
            beacon,
            implementations,
        });
    }
}
