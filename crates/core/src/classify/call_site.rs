//! Call-site classification skeleton shared by every policy.
//!
//! The AST walk reduces each call expression to a [`CallSite`]; this module
//! applies the fixed priority order and defers the ambiguous cases to a
//! [`CallPolicy`].

use super::policy::CallPolicy;
use super::types::{is_builtin, starts_lowercase_or_underscore, starts_uppercase};
use crate::model::{CallType, FunctionCall};
use std::collections::HashMap;

pub const UNKNOWN_TARGET: &str = "unknown";
pub const ENCODED_CALL_TARGET: &str = "encoded_call";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver<'a> {
    Identifier(&'a str),
    /// Index access, nested member access, call result, ...
    Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee<'a> {
    Bare(&'a str),
    Member {
        receiver: Receiver<'a>,
        member: &'a str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstArgument<'a> {
    Missing,
    Identifier(&'a str),
    Call,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite<'a> {
    pub callee: Callee<'a>,
    pub arg_count: usize,
    pub first_argument: FirstArgument<'a>,
}

/// What the enclosing contract and function know about names in scope.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub type_map: &'a HashMap<String, String>,
    pub uses_libraries: &'a [String],
}

impl<'a> CallContext<'a> {
    pub fn declared_type(&self, name: &str) -> Option<&'a str> {
        self.type_map.get(name).map(|t| t.as_str())
    }

    pub fn first_library(&self) -> Option<&'a str> {
        self.uses_libraries.first().map(|l| l.as_str())
    }
}

pub fn classify_call(
    site: &CallSite<'_>,
    context: &CallContext<'_>,
    policy: &dyn CallPolicy,
) -> Option<FunctionCall> {
    let arg_count = site.arg_count;

    match site.callee {
        Callee::Member { receiver, member } => {
            if member == "delegatecall" {
                let target = match site.first_argument {
                    FirstArgument::Call => ENCODED_CALL_TARGET,
                    _ => UNKNOWN_TARGET,
                };
                return Some(
                    FunctionCall::new(CallType::Delegatecall, target).with_arg_count(arg_count),
                );
            }

            match receiver {
                Receiver::Identifier(object) => {
                    if object == "Address" && member == "functionDelegateCall" {
                        let target = match site.first_argument {
                            FirstArgument::Identifier(name) => name,
                            _ => UNKNOWN_TARGET,
                        };
                        return Some(
                            FunctionCall::new(CallType::Delegatecall, target)
                                .with_arg_count(arg_count),
                        );
                    }

                    if policy.is_builtin_global(object) {
                        return None;
                    }

                    if starts_uppercase(object) {
                        return policy.classify_pascal_receiver(object, member, arg_count);
                    }

                    if object == "super" {
                        return Some(
                            FunctionCall::new(CallType::Super, member).with_arg_count(arg_count),
                        );
                    }

                    policy.classify_identifier_receiver(
                        object,
                        member,
                        arg_count,
                        context.declared_type(object),
                        context,
                    )
                }
                Receiver::Expression => {
                    policy.classify_expression_receiver(member, arg_count, context)
                }
            }
        }
        Callee::Bare(name) => {
            if is_builtin(name) {
                return None;
            }
            if starts_lowercase_or_underscore(name) {
                return Some(FunctionCall::new(CallType::Internal, name).with_arg_count(arg_count));
            }
            policy.classify_pascal_call(name, arg_count)
        }
    }
}
