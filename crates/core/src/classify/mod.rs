//! Heuristic classification
//!
//! Naming-convention predicates, the call-site classification skeleton and
//! the pluggable policies built on top of it, plus display categories.

pub mod call_site;
pub mod category;
pub mod policy;
pub mod types;

pub use call_site::{
    classify_call, CallContext, CallSite, Callee, FirstArgument, Receiver, ENCODED_CALL_TARGET,
    UNKNOWN_TARGET,
};
pub use category::determine_category;
pub use policy::{CallPolicy, PolicyKind, RichPolicy, SimplePolicy};
pub use types::{
    is_builtin, is_elementary_type, is_interface_name, is_likely_custom_error, is_likely_event,
};
