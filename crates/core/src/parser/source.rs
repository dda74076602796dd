//! Contract model extraction from the tree-sitter AST
//!
//! Each top-level `contract`, `abstract contract`, `interface` and `library`
//! declaration becomes one [`Contract`]. Contract declarations are located with
//! an S-expression query; members are read with field lookups and node-kind
//! dispatch.

use crate::classify::{
    determine_category, is_builtin, is_interface_name, CallPolicy, SimplePolicy,
};
use crate::error::ParseError;
use crate::model::{
    CallType, Contract, ContractKind, ErrorDefinition, EventDefinition, EventParameter,
    ExternalFunction, FunctionCall, ImportInfo, InternalFunction, Parameter, StateVariable,
    StructDefinition,
};
use crate::parser::calls::{call_arguments, CallExtractor};
use crate::parser::imports::parse_import_directive;
use crate::parser::types::{display_selector, format_type, function_signature};
use std::collections::HashMap;
use std::sync::Arc;
use streaming_iterator::StreamingIterator;
use tracing::{debug, error, warn};
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

const CONTRACT_QUERY: &str = r#"
[
  (contract_declaration) @contract
  (interface_declaration) @contract
  (library_declaration) @contract
]
"#;

#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub contracts: Vec<Contract>,
    pub source_code: String,
}

#[derive(Debug, Clone)]
pub struct SolidityParser {
    policy: Arc<dyn CallPolicy>,
}

impl Default for SolidityParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SolidityParser {
    pub fn new() -> Self {
        Self::with_policy(Arc::new(SimplePolicy))
    }

    pub fn with_policy(policy: Arc<dyn CallPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &dyn CallPolicy {
        self.policy.as_ref()
    }

    /// Parse one file. Never fails: an unusable file yields no contracts.
    pub fn parse_file(&self, file_path: &str, content: &str) -> ParsedFile {
        let contracts = match self.try_parse(file_path, content) {
            Ok(contracts) => contracts,
            Err(e) => {
                error!("Failed to parse {}: {}", file_path, e);
                Vec::new()
            }
        };

        ParsedFile {
            contracts,
            source_code: content.to_string(),
        }
    }

    pub fn try_parse(&self, file_path: &str, content: &str) -> Result<Vec<Contract>, ParseError> {
        let language: Language = tree_sitter_solidity::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ParseError::Grammar(e.to_string()))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ParseError::NoTree(file_path.to_string()))?;
        let root = tree.root_node();

        let extractor = ContractExtractor {
            source: content,
            file_path,
            policy: self.policy.as_ref(),
        };

        let imports = extractor.extract_imports(root);
        let contracts = extractor.extract_contracts(&language, root, &imports)?;

        debug!(
            "Parsed {}: {} contracts, {} imports",
            file_path,
            contracts.len(),
            imports.len()
        );
        Ok(contracts)
    }
}

/// Parse one file with the default (simple) call policy.
pub fn parse_solidity_file(file_path: &str, content: &str) -> ParsedFile {
    SolidityParser::new().parse_file(file_path, content)
}

struct ContractExtractor<'a> {
    source: &'a str,
    file_path: &'a str,
    policy: &'a dyn CallPolicy,
}

impl<'a> ContractExtractor<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn extract_imports(&self, root: Node<'_>) -> Vec<ImportInfo> {
        let mut cursor = root.walk();
        root.children(&mut cursor)
            .filter(|child| child.kind() == "import_directive")
            .flat_map(|child| parse_import_directive(self.text(child)))
            .collect()
    }

    fn extract_contracts(
        &self,
        language: &Language,
        root: Node<'_>,
        imports: &[ImportInfo],
    ) -> Result<Vec<Contract>, ParseError> {
        let query =
            Query::new(language, CONTRACT_QUERY).map_err(|e| ParseError::Query(e.to_string()))?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, root, self.source.as_bytes());

        let mut contracts = Vec::new();
        matches.advance();
        while let Some(match_) = matches.get() {
            for capture in match_.captures {
                let node = capture.node;
                if node.parent() != Some(root) {
                    continue;
                }
                if node.has_error() {
                    let name = node
                        .child_by_field_name("name")
                        .map(|n| self.text(n))
                        .unwrap_or("<unnamed>");
                    warn!(
                        "Skipping contract {} in {}: syntax errors in declaration",
                        name, self.file_path
                    );
                    continue;
                }
                if let Some(contract) = self.extract_contract(node, imports) {
                    contracts.push(contract);
                }
            }
            matches.advance();
        }

        Ok(contracts)
    }

    fn extract_contract(&self, node: Node<'_>, imports: &[ImportInfo]) -> Option<Contract> {
        let name = node.child_by_field_name("name").map(|n| self.text(n))?;
        let kind = match node.kind() {
            "interface_declaration" => ContractKind::Interface,
            "library_declaration" => ContractKind::Library,
            _ if self.text(node).trim_start().starts_with("abstract") => ContractKind::Abstract,
            _ => ContractKind::Contract,
        };

        let mut contract = Contract::new(name, kind, self.file_path);
        contract.imports = imports.to_vec();

        for base in self.base_names(node) {
            if is_interface_name(&base) {
                contract.implements.push(base);
            } else {
                contract.inherits.push(base);
            }
        }

        let Some(body) = node
            .child_by_field_name("body")
            .or_else(|| find_child(node, "contract_body"))
        else {
            contract.category =
                determine_category(name, &contract.inherits, kind, self.file_path);
            return Some(contract);
        };

        let mut cursor = body.walk();
        let members = body.named_children(&mut cursor).collect::<Vec<_>>();

        // State variables and using-for first: every function body sees them.
        let mut type_map = HashMap::new();
        for member in &members {
            match member.kind() {
                "state_variable_declaration" => {
                    if let Some(variable) = self.state_variable(*member) {
                        type_map.insert(variable.name.clone(), variable.type_name.clone());
                        contract.state_variables.push(variable);
                    }
                }
                "using_directive" => {
                    if let Some(library) = using_library(self.text(*member)) {
                        if !contract.uses_libraries.contains(&library) {
                            contract.uses_libraries.push(library);
                        }
                    }
                }
                _ => {}
            }
        }

        for member in &members {
            match member.kind() {
                "function_definition" => {
                    self.function(*member, &type_map, &mut contract);
                }
                "event_definition" => {
                    if let Some(event) = self.event(*member) {
                        contract.events.push(event);
                    }
                }
                "error_declaration" => {
                    if let Some(name) = member.child_by_field_name("name") {
                        contract.errors.push(ErrorDefinition {
                            name: self.text(name).to_string(),
                            parameters: self.parameters_of_kind(*member, "error_parameter"),
                        });
                    }
                }
                "struct_declaration" => {
                    if let Some(name) = member.child_by_field_name("name") {
                        contract.structs.push(StructDefinition {
                            name: self.text(name).to_string(),
                            members: self.parameters_of_kind(*member, "struct_member"),
                        });
                    }
                }
                _ => {}
            }
        }

        contract.category = determine_category(name, &contract.inherits, kind, self.file_path);
        Some(contract)
    }

    fn base_names(&self, node: Node<'_>) -> Vec<String> {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .filter(|child| child.kind() == "inheritance_specifier")
            .filter_map(|child| {
                let text = self.text(child);
                let base = text.split('(').next().unwrap_or(text);
                let base = format_type(base);
                (!base.is_empty()).then_some(base)
            })
            .collect()
    }

    fn state_variable(&self, node: Node<'_>) -> Option<StateVariable> {
        let name = node.child_by_field_name("name").map(|n| self.text(n))?;
        let type_name = node
            .child_by_field_name("type")
            .or_else(|| find_child(node, "type_name"))
            .map(|n| format_type(self.text(n)))?;

        let mut visibility = "internal".to_string();
        let mut is_constant = false;
        let mut is_immutable = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match (child.kind(), self.text(child)) {
                ("visibility", text) => visibility = text.to_string(),
                (_, text @ ("public" | "private" | "internal")) => visibility = text.to_string(),
                ("constant", _) | (_, "constant") => is_constant = true,
                ("immutable", _) | (_, "immutable") => is_immutable = true,
                _ => {}
            }
        }

        Some(StateVariable {
            name: name.to_string(),
            type_name,
            visibility,
            is_constant,
            is_immutable,
        })
    }

    fn event(&self, node: Node<'_>) -> Option<EventDefinition> {
        let name = node.child_by_field_name("name").map(|n| self.text(n))?;
        let parameters = children_of_kind(node, "event_parameter")
            .into_iter()
            .map(|child| {
                let parameter = self.parameter(child);
                let mut inner = child.walk();
                let indexed = child
                    .children(&mut inner)
                    .any(|c| c.kind() == "indexed" || self.text(c) == "indexed");
                EventParameter {
                    name: parameter.name,
                    type_name: parameter.type_name,
                    indexed,
                }
            })
            .collect();

        Some(EventDefinition {
            name: name.to_string(),
            parameters,
        })
    }

    fn function(
        &self,
        node: Node<'_>,
        contract_types: &HashMap<String, String>,
        contract: &mut Contract,
    ) {
        let Some(name) = node.child_by_field_name("name").map(|n| self.text(n)) else {
            return;
        };
        if is_builtin(name) {
            return;
        }

        let parameters = self.function_parameters(node);
        let return_values = find_child(node, "return_type_definition")
            .map(|returns| self.function_parameters(returns))
            .unwrap_or_default();

        let mut visibility = "public".to_string();
        let mut state_mutability = "nonpayable".to_string();
        let mut is_virtual = false;
        let mut modifiers = Vec::new();

        let mut cursor = node.walk();
        let header = node.children(&mut cursor).collect::<Vec<_>>();
        for child in &header {
            match child.kind() {
                "visibility" | "public" | "private" | "internal" | "external" => {
                    visibility = self.text(*child).trim().to_string();
                }
                "state_mutability" | "pure" | "view" | "payable" => {
                    state_mutability = match self.text(*child).trim() {
                        "constant" => "view".to_string(),
                        other => other.to_string(),
                    };
                }
                "virtual" => is_virtual = true,
                "modifier_invocation" => {
                    if let Some(modifier) = self.modifier_invocation(*child) {
                        modifiers.push(modifier);
                    }
                }
                _ => {}
            }
        }

        let mut extractor = CallExtractor::new(
            self.source,
            self.policy,
            contract_types,
            &contract.uses_libraries,
        );
        for parameter in parameters.iter().chain(return_values.iter()) {
            extractor.declare(&parameter.name, &parameter.type_name);
        }
        for (modifier, arg_count) in &modifiers {
            extractor.push_call(
                FunctionCall::new(CallType::Modifier, modifier.clone()).with_arg_count(*arg_count),
            );
        }
        if let Some(body) = node
            .child_by_field_name("body")
            .or_else(|| find_child(node, "function_body"))
        {
            extractor.walk(body);
        }
        let found = extractor.finish();

        let source_code = self.text(node).to_string();
        let start_line = node.start_position().row + 1;

        if matches!(visibility.as_str(), "external" | "public") {
            let signature = function_signature(name, &parameters);
            let selector = display_selector(&signature);
            contract.external_functions.push(ExternalFunction {
                name: name.to_string(),
                visibility,
                state_mutability,
                parameters,
                return_values,
                calls: found.calls,
                emits: found.emits,
                is_virtual,
                source_code,
                start_line,
                signature,
                selector,
                modifiers: modifiers.into_iter().map(|(name, _)| name).collect(),
                inherited_from: None,
            });
        } else {
            contract.internal_functions.push(InternalFunction {
                name: name.to_string(),
                visibility,
                state_mutability,
                parameters,
                return_values,
                calls: found.calls,
                emits: found.emits,
                is_virtual,
                source_code,
                start_line,
                inherited_from: None,
            });
        }
    }

    /// Modifier name and argument count. Base-constructor invocations in a
    /// constructor header never reach here.
    fn modifier_invocation(&self, node: Node<'_>) -> Option<(String, usize)> {
        let mut cursor = node.walk();
        let name = node
            .children(&mut cursor)
            .find(|c| c.kind() == "identifier" && c.is_named())
            .or_else(|| node.named_child(0))?;
        let arg_count = call_arguments(node, name).len();
        Some((self.text(name).to_string(), arg_count))
    }

    /// `parameter` nodes directly under `node` or under a parameter-list
    /// wrapper, depending on grammar version.
    fn function_parameters(&self, node: Node<'_>) -> Vec<Parameter> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "parameter" => out.push(self.parameter(child)),
                kind if kind.ends_with("parameter_list") || kind == "parameters" => {
                    out.extend(self.function_parameters(child));
                }
                _ => {}
            }
        }
        out
    }

    fn parameters_of_kind(&self, node: Node<'_>, kind: &str) -> Vec<Parameter> {
        children_of_kind(node, kind)
            .into_iter()
            .map(|child| self.parameter(child))
            .collect()
    }

    fn parameter(&self, node: Node<'_>) -> Parameter {
        let type_name = node
            .child_by_field_name("type")
            .or_else(|| node.named_child(0))
            .map(|n| format_type(self.text(n)))
            .unwrap_or_default();
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        Parameter { name, type_name }
    }
}

/// Named children of `kind`, looking through `*_body` and `*_list` wrappers.
fn children_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == kind {
            out.push(child);
        } else if child.kind().ends_with("_body") || child.kind().ends_with("_list") {
            out.extend(children_of_kind(child, kind));
        }
    }
    out
}

fn find_child<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

/// `using SafeMath for uint256;` -> `SafeMath`. The braced list form
/// (`using {f, g} for T`) binds free functions, not a library.
fn using_library(text: &str) -> Option<String> {
    let rest = text.trim().strip_prefix("using")?.trim_start();
    if rest.starts_with('{') {
        return None;
    }
    let library = rest
        .split(" for ")
        .next()
        .unwrap_or(rest)
        .trim()
        .trim_end_matches(';')
        .trim();
    (!library.is_empty()).then(|| library.to_string())
}
