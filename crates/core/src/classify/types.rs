//! Naming-convention predicates used by call classification.
//!
//! Solidity only distinguishes interfaces, libraries, errors and events at
//! their declaration site. At a call site the same syntax `Foo(x)` may be a
//! cast, an error, an event or a call, so these predicates are deliberately
//! approximate.

/// Functions and type keywords that can appear in call position but never
/// name a user-declared function.
const BUILTIN_FUNCTIONS: &[&str] = &[
    "require",
    "assert",
    "revert",
    "keccak256",
    "sha256",
    "sha3",
    "ripemd160",
    "ecrecover",
    "addmod",
    "mulmod",
    "selfdestruct",
    "suicide",
    "blockhash",
    "gasleft",
    "type",
    "address",
    "payable",
    "bool",
    "string",
    "bytes",
    "byte",
    "int",
    "uint",
    "fixed",
    "ufixed",
    "abi",
    "this",
    "super",
    "new",
    "delete",
];

/// Globals whose members are builtin helpers in every policy.
pub const BASE_GLOBALS: &[&str] = &["abi", "block", "msg", "tx", "type"];

const ERROR_PREFIXES: &[&str] = &[
    "Invalid",
    "Insufficient",
    "Unauthorized",
    "NotFound",
    "Already",
    "Exceeded",
    "Failed",
    "Denied",
    "Overflow",
    "Underflow",
    "Only",
    "No",
    "Cannot",
    "Missing",
    "Zero",
    "Empty",
];

const ERROR_SUFFIXES: &[&str] = &["Error", "Overflow", "Underflow", "Denied", "Failed"];

const WELL_KNOWN_EVENTS: &[&str] = &["Transfer", "Approval", "Deposit", "Withdrawal"];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_FUNCTIONS.contains(&name) || is_elementary_type(name)
}

/// `uint256`, `int8`, `bytes32`, `address`, `bool`, `string` and friends.
pub fn is_elementary_type(type_name: &str) -> bool {
    let base = type_name
        .trim()
        .trim_end_matches("[]")
        .trim_end_matches(" payable");
    match base {
        "address" | "bool" | "string" | "bytes" | "byte" | "int" | "uint" | "fixed"
        | "ufixed" => true,
        _ => {
            sized_suffix(base, "uint")
                || sized_suffix(base, "int")
                || sized_suffix(base, "bytes")
                || fixed_point_suffix(base, "fixed")
                || fixed_point_suffix(base, "ufixed")
        }
    }
}

/// `fixed128x18`: digits, `x`, digits.
fn fixed_point_suffix(name: &str, prefix: &str) -> bool {
    let is_number = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    match name.strip_prefix(prefix).and_then(|rest| rest.split_once('x')) {
        Some((bits, decimals)) => is_number(bits) && is_number(decimals),
        None => false,
    }
}

fn sized_suffix(name: &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// `IERC20`, `IOwnable`: an `I` followed by another capital letter.
pub fn is_interface_name(name: &str) -> bool {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some('I'), Some(second)) => second.is_ascii_uppercase(),
        _ => false,
    }
}

pub fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

pub fn starts_lowercase_or_underscore(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_lowercase())
}

/// Prefix match that requires a word boundary: `NoOwner` matches `No`,
/// `Node` does not.
fn has_camel_prefix(name: &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_uppercase()),
        None => false,
    }
}

pub fn is_likely_custom_error(name: &str) -> bool {
    if !starts_uppercase(name) {
        return false;
    }
    ERROR_SUFFIXES.iter().any(|s| name.ends_with(s) && name.len() > s.len())
        || ERROR_PREFIXES.iter().any(|p| has_camel_prefix(name, p))
}

pub fn is_likely_event(name: &str) -> bool {
    if !starts_uppercase(name) {
        return false;
    }
    WELL_KNOWN_EVENTS.contains(&name) || name.ends_with("ed") || has_camel_prefix(name, "Log")
}
