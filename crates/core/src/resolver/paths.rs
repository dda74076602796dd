use crate::parser::imports::file_stem;

/// Strip version pins from package segments so that
/// `@openzeppelin/contracts@5.0.2/token/ERC20/ERC20.sol` and
/// `@openzeppelin/contracts/token/ERC20/ERC20.sol` are the same key.
/// Scope segments (`@openzeppelin`) are kept. Idempotent.
pub fn normalize_import_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .map(strip_version)
        .collect::<Vec<_>>()
        .join("/")
}

fn strip_version(segment: &str) -> &str {
    match segment.find('@') {
        Some(idx) if idx > 0 => {
            let version = &segment[idx + 1..];
            let version = version.strip_prefix('v').unwrap_or(version);
            if version.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                &segment[..idx]
            } else {
                segment
            }
        }
        _ => segment,
    }
}

/// Contract name an import path most likely declares.
pub fn import_stem(path: &str) -> &str {
    file_stem(path)
}
