//! Call classification policies.
//!
//! Two rule sets coexist on top of the skeleton in [`super::call_site`]:
//!
//! - [`SimplePolicy`] is used for user projects and favors recall: any
//!   PascalCase bare call is an external call.
//! - [`RichPolicy`] is used when building the offline library cache, where
//!   third-party code (OpenZeppelin, Solady) is diverse enough that false
//!   positives cost more than misses. It suppresses casts, custom errors and
//!   events, and attributes calls on elementary values to `using for`
//!   libraries.
//!
//! They trade recall for precision differently and are kept apart on purpose.

use super::call_site::CallContext;
use super::types::{
    is_elementary_type, is_interface_name, is_likely_custom_error, is_likely_event, BASE_GLOBALS,
};
use crate::model::{CallType, FunctionCall};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub trait CallPolicy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Receivers whose members are language builtins (`abi.encode`, `msg.sender`).
    fn is_builtin_global(&self, name: &str) -> bool;

    /// `Foo.bar(...)` where `Foo` starts with a capital letter.
    fn classify_pascal_receiver(
        &self,
        receiver: &str,
        member: &str,
        arg_count: usize,
    ) -> Option<FunctionCall>;

    /// `foo.bar(...)` where `foo` is a lowercase identifier.
    fn classify_identifier_receiver(
        &self,
        receiver: &str,
        member: &str,
        arg_count: usize,
        declared_type: Option<&str>,
        context: &CallContext<'_>,
    ) -> Option<FunctionCall>;

    /// `a[i].bar(...)`, `f().bar(...)`, `a.b.bar(...)`.
    fn classify_expression_receiver(
        &self,
        member: &str,
        arg_count: usize,
        context: &CallContext<'_>,
    ) -> Option<FunctionCall>;

    /// `Foo(...)` that is not a builtin.
    fn classify_pascal_call(&self, name: &str, arg_count: usize) -> Option<FunctionCall>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePolicy;

impl CallPolicy for SimplePolicy {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn is_builtin_global(&self, name: &str) -> bool {
        BASE_GLOBALS.contains(&name)
    }

    fn classify_pascal_receiver(
        &self,
        receiver: &str,
        member: &str,
        arg_count: usize,
    ) -> Option<FunctionCall> {
        Some(
            FunctionCall::new(CallType::Library, format!("{}.{}", receiver, member))
                .with_arg_count(arg_count),
        )
    }

    fn classify_identifier_receiver(
        &self,
        _receiver: &str,
        member: &str,
        arg_count: usize,
        declared_type: Option<&str>,
        _context: &CallContext<'_>,
    ) -> Option<FunctionCall> {
        Some(
            FunctionCall::new(CallType::External, member)
                .with_arg_count(arg_count)
                .with_target_type(declared_type.map(str::to_string)),
        )
    }

    fn classify_expression_receiver(
        &self,
        _member: &str,
        _arg_count: usize,
        _context: &CallContext<'_>,
    ) -> Option<FunctionCall> {
        None
    }

    fn classify_pascal_call(&self, name: &str, arg_count: usize) -> Option<FunctionCall> {
        Some(FunctionCall::new(CallType::External, name).with_arg_count(arg_count))
    }
}

const RICH_EXTRA_GLOBALS: &[&str] = &["bytes", "string"];

/// Members on arrays and `bytes` that are never user functions.
const COLLECTION_BUILTINS: &[&str] = &["push", "pop"];

#[derive(Debug, Clone, Copy, Default)]
pub struct RichPolicy;

impl RichPolicy {
    fn using_for_call(
        &self,
        member: &str,
        arg_count: usize,
        context: &CallContext<'_>,
    ) -> Option<FunctionCall> {
        // First declared library wins regardless of the `for` type.
        context.first_library().map(|library| {
            FunctionCall::new(CallType::Library, format!("{}.{}", library, member))
                .with_arg_count(arg_count)
        })
    }
}

impl CallPolicy for RichPolicy {
    fn name(&self) -> &'static str {
        "rich"
    }

    fn is_builtin_global(&self, name: &str) -> bool {
        BASE_GLOBALS.contains(&name) || RICH_EXTRA_GLOBALS.contains(&name)
    }

    fn classify_pascal_receiver(
        &self,
        receiver: &str,
        member: &str,
        arg_count: usize,
    ) -> Option<FunctionCall> {
        if is_interface_name(receiver) {
            return Some(
                FunctionCall::new(CallType::External, member)
                    .with_arg_count(arg_count)
                    .with_target_type(Some(receiver.to_string())),
            );
        }
        SimplePolicy.classify_pascal_receiver(receiver, member, arg_count)
    }

    fn classify_identifier_receiver(
        &self,
        receiver: &str,
        member: &str,
        arg_count: usize,
        declared_type: Option<&str>,
        context: &CallContext<'_>,
    ) -> Option<FunctionCall> {
        if COLLECTION_BUILTINS.contains(&member) {
            return None;
        }
        if let Some(type_name) = declared_type {
            if is_elementary_type(type_name) {
                if let Some(call) = self.using_for_call(member, arg_count, context) {
                    return Some(call);
                }
            }
        }
        SimplePolicy.classify_identifier_receiver(
            receiver,
            member,
            arg_count,
            declared_type,
            context,
        )
    }

    fn classify_expression_receiver(
        &self,
        member: &str,
        arg_count: usize,
        context: &CallContext<'_>,
    ) -> Option<FunctionCall> {
        if COLLECTION_BUILTINS.contains(&member) {
            return None;
        }
        self.using_for_call(member, arg_count, context)
    }

    fn classify_pascal_call(&self, name: &str, arg_count: usize) -> Option<FunctionCall> {
        if is_likely_custom_error(name) || is_likely_event(name) || is_interface_name(name) {
            return None;
        }
        // `Token(addr)` is a cast far more often than a call.
        if arg_count == 1 {
            return None;
        }
        SimplePolicy.classify_pascal_call(name, arg_count)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Simple,
    Rich,
}

impl PolicyKind {
    pub fn build(self) -> Arc<dyn CallPolicy> {
        match self {
            PolicyKind::Simple => Arc::new(SimplePolicy),
            PolicyKind::Rich => Arc::new(RichPolicy),
        }
    }
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(PolicyKind::Simple),
            "rich" => Ok(PolicyKind::Rich),
            other => Err(format!("unknown call policy: {}", other)),
        }
    }
}
