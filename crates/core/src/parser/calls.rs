//! Function-body walk collecting classified calls and emitted events.
//!
//! The walk visits every nested node of the body in source order. Only four
//! node kinds are handled explicitly; everything else just has its children
//! visited. Emit and revert statements are not descended into, so an event or
//! custom error is never mistaken for a call.

use crate::classify::{
    classify_call, CallContext, CallPolicy, CallSite, Callee, FirstArgument, Receiver,
};
use crate::model::{CallType, FunctionCall};
use crate::parser::types::format_type;
use std::collections::{HashMap, HashSet};
use tree_sitter::Node;

#[derive(Debug, Default)]
pub struct CallsAndEmits {
    pub calls: Vec<FunctionCall>,
    pub emits: Vec<String>,
}

pub struct CallExtractor<'a> {
    source: &'a str,
    policy: &'a dyn CallPolicy,
    uses_libraries: &'a [String],
    type_map: HashMap<String, String>,
    seen_calls: HashSet<(CallType, String, Option<usize>)>,
    seen_emits: HashSet<String>,
    result: CallsAndEmits,
}

impl<'a> CallExtractor<'a> {
    /// `type_map` is the contract-level name -> type map; locals declared in
    /// the body are merged into a private copy as they are encountered.
    pub fn new(
        source: &'a str,
        policy: &'a dyn CallPolicy,
        type_map: &HashMap<String, String>,
        uses_libraries: &'a [String],
    ) -> Self {
        Self {
            source,
            policy,
            uses_libraries,
            type_map: type_map.clone(),
            seen_calls: HashSet::new(),
            seen_emits: HashSet::new(),
            result: CallsAndEmits::default(),
        }
    }

    pub fn declare(&mut self, name: &str, type_name: &str) {
        if !name.is_empty() && !type_name.is_empty() {
            self.type_map.insert(name.to_string(), type_name.to_string());
        }
    }

    /// Record a call that does not come from the body, such as a modifier
    /// invocation in the function header.
    pub fn push_call(&mut self, call: FunctionCall) {
        if self.seen_calls.insert(call.dedup_key()) {
            self.result.calls.push(call);
        }
    }

    pub fn walk(&mut self, body: Node<'_>) {
        let mut stack = vec![body];

        while let Some(node) = stack.pop() {
            match node.kind() {
                "emit_statement" => {
                    self.record_emit(node);
                    continue;
                }
                "revert_statement" => continue,
                "variable_declaration" => self.record_declaration(node),
                "call_expression" => self.record_call(node),
                _ => {}
            }

            let mut cursor = node.walk();
            let children = node.named_children(&mut cursor).collect::<Vec<_>>();
            stack.extend(children.into_iter().rev());
        }
    }

    pub fn finish(self) -> CallsAndEmits {
        self.result
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn record_declaration(&mut self, node: Node<'_>) {
        let name = node.child_by_field_name("name").map(|n| self.text(n));
        let type_name = node
            .child_by_field_name("type")
            .map(|n| format_type(self.text(n)));
        if let (Some(name), Some(type_name)) = (name, type_name) {
            self.declare(name, &type_name);
        }
    }

    fn record_emit(&mut self, node: Node<'_>) {
        let Some(target) = node
            .child_by_field_name("name")
            .or_else(|| node.named_child(0))
            .map(unwrap_expression)
        else {
            return;
        };

        let name = match target.kind() {
            "member_expression" => target
                .child_by_field_name("property")
                .map(|p| self.text(p))
                .unwrap_or_else(|| self.text(target)),
            _ => self.text(target),
        };
        let name = name.split('(').next().unwrap_or(name).trim();

        if !name.is_empty() && self.seen_emits.insert(name.to_string()) {
            self.result.emits.push(name.to_string());
        }
    }

    fn record_call(&mut self, node: Node<'_>) {
        let Some(site) = self.call_site(node) else {
            return;
        };
        let context = CallContext {
            type_map: &self.type_map,
            uses_libraries: self.uses_libraries,
        };
        if let Some(call) = classify_call(&site, &context, self.policy) {
            self.push_call(call);
        }
    }

    fn call_site(&self, node: Node<'_>) -> Option<CallSite<'a>> {
        let function = node
            .child_by_field_name("function")
            .or_else(|| node.named_child(0))
            .map(unwrap_expression)?;

        let callee = match function.kind() {
            "identifier" => Callee::Bare(self.text(function)),
            "member_expression" => {
                let member = function
                    .child_by_field_name("property")
                    .or_else(|| last_named_child(function))
                    .map(|p| self.text(p))?;
                let object = function
                    .child_by_field_name("object")
                    .or_else(|| function.named_child(0))
                    .map(unwrap_expression)?;
                let receiver = match object.kind() {
                    "identifier" | "primitive_type" | "type_name" => {
                        Receiver::Identifier(self.text(object))
                    }
                    _ if self.text(object) == "super" => Receiver::Identifier("super"),
                    _ => Receiver::Expression,
                };
                Callee::Member { receiver, member }
            }
            _ => return None,
        };

        let arguments = call_arguments(node, function);
        let first_argument = match arguments.first() {
            None => FirstArgument::Missing,
            Some(arg) => {
                let inner = if arg.kind() == "call_argument" {
                    arg.named_child(0).map(unwrap_expression)
                } else {
                    Some(unwrap_expression(*arg))
                };
                match inner.map(|n| (n.kind(), n)) {
                    Some(("call_expression", _)) => FirstArgument::Call,
                    Some(("identifier", n)) => FirstArgument::Identifier(self.text(n)),
                    _ => FirstArgument::Other,
                }
            }
        };

        Some(CallSite {
            callee,
            arg_count: arguments.len(),
            first_argument,
        })
    }
}

/// Strip grammar wrappers (`expression`, call options `{value: v}`,
/// parentheses) down to the node that carries meaning.
pub fn unwrap_expression(mut node: Node<'_>) -> Node<'_> {
    loop {
        let inner = match node.kind() {
            "expression" | "parenthesized_expression" => node.named_child(0),
            "struct_expression" => node
                .child_by_field_name("type")
                .or_else(|| node.named_child(0)),
            _ => None,
        };
        match inner {
            Some(inner) if inner != node => node = inner,
            _ => return node,
        }
    }
}

fn last_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let count = node.named_child_count();
    if count == 0 {
        None
    } else {
        node.named_child(count - 1)
    }
}

/// Argument nodes of a call, excluding the callee itself and comments.
pub fn call_arguments<'t>(call: Node<'t>, function: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = call.walk();
    let named = call.named_children(&mut cursor).collect::<Vec<_>>();

    let explicit = named
        .iter()
        .copied()
        .filter(|c| c.kind() == "call_argument")
        .collect::<Vec<_>>();
    if !explicit.is_empty() {
        return explicit;
    }

    named
        .into_iter()
        .filter(|c| {
            c.kind() != "comment"
                && c.start_byte() >= function.end_byte()
                && c.byte_range() != function.byte_range()
        })
        .collect()
}
