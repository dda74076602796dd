//! Inherited member resolution.

use super::proxy::ProxyAnnotated;
use crate::model::{Contract, ExternalFunction, FunctionLike, InternalFunction, ProxyGroup};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Output of the inheritance pass: contracts and abstracts also list the
/// functions they inherit.
#[derive(Debug, Clone)]
pub struct InheritanceResolved {
    pub contracts: Vec<Contract>,
    pub proxy_groups: Vec<ProxyGroup>,
}

#[derive(Default)]
struct Inherited {
    external: Vec<ExternalFunction>,
    internal: Vec<InternalFunction>,
}

struct Walker<'a> {
    contracts: &'a [Contract],
    by_name: &'a HashMap<String, usize>,
    visited: HashSet<&'a str>,
    declared: HashSet<String>,
    found: Inherited,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, bases: &'a [String], recursive: bool) {
        for base in bases {
            if !self.visited.insert(base.as_str()) {
                continue;
            }
            let Some(&index) = self.by_name.get(base.as_str()) else {
                continue;
            };
            let ancestor = &self.contracts[index];

            copy_new(
                &mut self.found.external,
                &ancestor.external_functions,
                &mut self.declared,
                &ancestor.name,
            );
            copy_new(
                &mut self.found.internal,
                &ancestor.internal_functions,
                &mut self.declared,
                &ancestor.name,
            );

            if recursive {
                self.walk(&ancestor.inherits, true);
                self.walk(&ancestor.implements, false);
            }
        }
    }
}

fn copy_new<F: FunctionLike + Clone>(
    out: &mut Vec<F>,
    functions: &[F],
    declared: &mut HashSet<String>,
    ancestor: &str,
) {
    for function in functions {
        if !declared.insert(function.name().to_string()) {
            continue;
        }
        let mut copy = function.clone();
        if copy.inherited_from().is_none() {
            copy.set_inherited_from(ancestor);
        }
        out.push(copy);
    }
}

fn collect_inherited(
    contracts: &[Contract],
    by_name: &HashMap<String, usize>,
    index: usize,
) -> Inherited {
    let contract = &contracts[index];
    let mut walker = Walker {
        contracts,
        by_name,
        visited: HashSet::from([contract.name.as_str()]),
        declared: contract.function_names().map(str::to_string).collect(),
        found: Inherited::default(),
    };
    walker.walk(&contract.inherits, true);
    walker.walk(&contract.implements, false);
    walker.found
}

/// Pass 2: copy ancestor functions into contracts and abstracts. A declared
/// function always wins over an inherited one of the same name, and each
/// contract walks its ancestors with its own visited set, so inheritance
/// cycles terminate.
pub fn resolve_inherited_functions(annotated: ProxyAnnotated) -> InheritanceResolved {
    let ProxyAnnotated {
        mut contracts,
        proxy_groups,
    } = annotated;

    let mut by_name = HashMap::new();
    for (i, contract) in contracts.iter().enumerate() {
        by_name.entry(contract.name.clone()).or_insert(i);
    }

    // Contracts earlier in the list may already carry their inherited
    // functions when a later descendant copies from them.
    let mut added = 0;
    for index in 0..contracts.len() {
        if !contracts[index].kind.accumulates_inherited() {
            continue;
        }

        let inherited = collect_inherited(&contracts, &by_name, index);

        added += inherited.external.len() + inherited.internal.len();
        let contract = &mut contracts[index];
        contract.external_functions.extend(inherited.external);
        contract.internal_functions.extend(inherited.internal);
    }

    debug!("Inheritance resolution added {} functions", added);
    InheritanceResolved {
        contracts,
        proxy_groups,
    }
}
