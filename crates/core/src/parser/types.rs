//! Type-name formatting and display signatures.

use crate::model::Parameter;

/// Normalize a type as written in source: `mapping (address=>uint256)` and
/// `mapping(address => uint256)` both become `mapping(address => uint256)`,
/// nested mappings, arrays and function types included.
pub fn format_type(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let prev_is_word = out.chars().last().is_some_and(is_word_char);
            if prev_is_word && is_word_char(c) {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(c);
    }

    out.replace("=>", " => ")
        .replace("  ", " ")
        .replace("( ", "(")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

pub fn function_signature(name: &str, parameters: &[Parameter]) -> String {
    let types = parameters
        .iter()
        .map(|p| p.type_name.as_str())
        .collect::<Vec<_>>()
        .join(",");
    format!("{}({})", name, types)
}

/// Display-only selector. This is a 32-bit string hash rendered like a
/// selector; it is NOT keccak256 and never matches on-chain selectors.
pub fn display_selector(signature: &str) -> String {
    let mut hash: i32 = 0;
    for unit in signature.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    format!("0x{:08x}", hash as u32)
}
