//! Contract model and call graph types
//!
//! Everything here serializes to the camelCase JSON shape consumed by the
//! visualization layer and by persisted library caches, so field names are
//! part of the external interface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    Contract,
    Library,
    Interface,
    Abstract,
}

impl ContractKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractKind::Contract => "contract",
            ContractKind::Library => "library",
            ContractKind::Interface => "interface",
            ContractKind::Abstract => "abstract",
        }
    }

    /// Interfaces and libraries are sources, never targets, of inherited members.
    pub fn accumulates_inherited(&self) -> bool {
        matches!(self, ContractKind::Contract | ContractKind::Abstract)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyPattern {
    Eip7546,
    Uups,
    Transparent,
    Diamond,
    Beacon,
}

impl ProxyPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyPattern::Eip7546 => "eip7546",
            ProxyPattern::Uups => "uups",
            ProxyPattern::Transparent => "transparent",
            ProxyPattern::Diamond => "diamond",
            ProxyPattern::Beacon => "beacon",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyRole {
    Proxy,
    Implementation,
    Dictionary,
    Beacon,
    Facet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Internal,
    Library,
    External,
    Super,
    Delegatecall,
    Modifier,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Internal => "internal",
            CallType::Library => "library",
            CallType::External => "external",
            CallType::Super => "super",
            CallType::Delegatecall => "delegatecall",
            CallType::Modifier => "modifier",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    pub target: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg_count: Option<usize>,
}

impl FunctionCall {
    pub fn new(call_type: CallType, target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            call_type,
            target_type: None,
            arg_count: None,
        }
    }

    pub fn with_arg_count(mut self, count: usize) -> Self {
        self.arg_count = Some(count);
        self
    }

    pub fn with_target_type(mut self, target_type: Option<String>) -> Self {
        self.target_type = target_type;
        self
    }

    /// Deduplication key within one function body.
    pub fn dedup_key(&self) -> (CallType, String, Option<usize>) {
        (self.call_type, self.target.clone(), self.arg_count)
    }

    /// `SafeMath.add` -> `Some(("SafeMath", "add"))`
    pub fn qualified_parts(&self) -> Option<(&str, &str)> {
        self.target.split_once('.')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

pub type ReturnValue = Parameter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub indexed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub name: String,
    pub parameters: Vec<EventParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDefinition {
    pub name: String,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDefinition {
    pub name: String,
    pub members: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub visibility: String,
    pub is_constant: bool,
    pub is_immutable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub path: String,
    pub is_external: bool,
}

impl ImportInfo {
    pub fn refers_to(&self, symbol: &str) -> bool {
        self.name == symbol || self.alias.as_deref() == Some(symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalFunction {
    pub name: String,
    pub visibility: String,
    pub state_mutability: String,
    pub parameters: Vec<Parameter>,
    pub return_values: Vec<ReturnValue>,
    pub calls: Vec<FunctionCall>,
    pub emits: Vec<String>,
    pub is_virtual: bool,
    pub source_code: String,
    pub start_line: usize,
    pub signature: String,
    pub selector: String,
    pub modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalFunction {
    pub name: String,
    pub visibility: String,
    pub state_mutability: String,
    pub parameters: Vec<Parameter>,
    pub return_values: Vec<ReturnValue>,
    pub calls: Vec<FunctionCall>,
    pub emits: Vec<String>,
    pub is_virtual: bool,
    pub source_code: String,
    pub start_line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<String>,
}

/// Shared view over both function variants.
pub trait FunctionLike {
    fn name(&self) -> &str;
    fn calls(&self) -> &[FunctionCall];
    fn inherited_from(&self) -> Option<&str>;
    fn set_inherited_from(&mut self, ancestor: &str);
}

macro_rules! impl_function_like {
    ($ty:ty) => {
        impl FunctionLike for $ty {
            fn name(&self) -> &str {
                &self.name
            }

            fn calls(&self) -> &[FunctionCall] {
                &self.calls
            }

            fn inherited_from(&self) -> Option<&str> {
                self.inherited_from.as_deref()
            }

            fn set_inherited_from(&mut self, ancestor: &str) {
                self.inherited_from = Some(ancestor.to_string());
            }
        }
    };
}

impl_function_like!(ExternalFunction);
impl_function_like!(InternalFunction);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub name: String,
    pub kind: ContractKind,
    pub category: String,
    pub file_path: String,
    pub inherits: Vec<String>,
    pub implements: Vec<String>,
    pub uses_libraries: Vec<String>,
    pub imports: Vec<ImportInfo>,
    pub external_functions: Vec<ExternalFunction>,
    pub internal_functions: Vec<InternalFunction>,
    pub events: Vec<EventDefinition>,
    pub errors: Vec<ErrorDefinition>,
    pub structs: Vec<StructDefinition>,
    pub state_variables: Vec<StateVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_pattern: Option<ProxyPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_role: Option<ProxyRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_external_library: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_source: Option<String>,
}

impl Contract {
    pub fn new(name: impl Into<String>, kind: ContractKind, file_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            category: "other".to_string(),
            file_path: file_path.into(),
            inherits: Vec::new(),
            implements: Vec::new(),
            uses_libraries: Vec::new(),
            imports: Vec::new(),
            external_functions: Vec::new(),
            internal_functions: Vec::new(),
            events: Vec::new(),
            errors: Vec::new(),
            structs: Vec::new(),
            state_variables: Vec::new(),
            proxy_pattern: None,
            proxy_role: None,
            proxy_group_id: None,
            is_external_library: None,
            library_source: None,
        }
    }

    pub fn function_count(&self) -> usize {
        self.external_functions.len() + self.internal_functions.len()
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.external_functions
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.internal_functions.iter().map(|f| f.name.as_str()))
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.function_names().any(|n| n == name)
    }

    /// Calls made by functions this contract declares itself.
    pub fn own_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.external_functions
            .iter()
            .filter(|f| f.inherited_from.is_none())
            .flat_map(|f| f.calls.iter())
            .chain(
                self.internal_functions
                    .iter()
                    .filter(|f| f.inherited_from.is_none())
                    .flat_map(|f| f.calls.iter()),
            )
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.external_functions
            .iter()
            .flat_map(|f| f.emits.iter())
            .chain(self.internal_functions.iter().flat_map(|f| f.emits.iter()))
            .chain(self.events.iter().map(|e| &e.name))
            .map(|s| s.as_str())
    }

    pub fn is_external_library(&self) -> bool {
        self.is_external_library.unwrap_or(false)
    }

    /// Back to parser output: drop proxy annotations and inherited copies
    /// left by an earlier graph build.
    pub fn clear_graph_annotations(&mut self) {
        self.proxy_pattern = None;
        self.proxy_role = None;
        self.proxy_group_id = None;
        self.external_functions.retain(|f| f.inherited_from.is_none());
        self.internal_functions.retain(|f| f.inherited_from.is_none());
    }

    /// All external imports of this contract, as written.
    pub fn external_import_paths(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .filter(|i| i.is_external)
            .map(|i| i.path.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Inherits,
    Implements,
    Uses,
    Delegatecall,
    Registers,
    Imports,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub dependency_type: DependencyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyGroup {
    pub id: String,
    pub name: String,
    pub pattern_type: ProxyPattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beacon: Option<String>,
    pub implementations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Directory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DirectoryNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contracts: Vec<String>,
}

impl DirectoryNode {
    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            node_type: NodeType::Directory,
            children: Vec::new(),
            contract_name: None,
            contracts: Vec::new(),
        }
    }

    pub fn child(&self, name: &str) -> Option<&DirectoryNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub total_contracts: usize,
    pub total_libraries: usize,
    pub total_interfaces: usize,
    pub total_functions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallGraph {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub project_name: String,
    pub structure: DirectoryNode,
    pub contracts: Vec<Contract>,
    pub dependencies: Vec<Dependency>,
    pub proxy_groups: Vec<ProxyGroup>,
    pub stats: GraphStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_edges: Option<Vec<Dependency>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_edge_ids: Option<Vec<String>>,
}

impl CallGraph {
    pub fn contract(&self, name: &str) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.name == name)
    }

    pub fn dependencies_from<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Dependency> {
        self.dependencies.iter().filter(move |d| d.from == name)
    }

    pub fn has_dependency(&self, from: &str, to: &str, dependency_type: DependencyType) -> bool {
        self.dependencies
            .iter()
            .any(|d| d.from == from && d.to == to && d.dependency_type == dependency_type)
    }
}
