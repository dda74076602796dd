//! Import directive normalization.
//!
//! Works on the directive text so that every import form, including ones the
//! grammar splits differently across versions, yields the same records.

use crate::model::ImportInfo;

pub fn is_external_path(path: &str) -> bool {
    !(path.starts_with("./") || path.starts_with("../") || path == "." || path == "..")
}

/// `../token/ERC20.sol` -> `ERC20`
pub fn file_stem(path: &str) -> &str {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.strip_suffix(".sol").unwrap_or(file)
}

/// Parse one `import ...;` directive into one or more records.
pub fn parse_import_directive(text: &str) -> Vec<ImportInfo> {
    let Some(path) = quoted_path(text) else {
        return Vec::new();
    };
    let is_external = is_external_path(&path);
    let record = |name: &str, alias: Option<&str>| ImportInfo {
        name: name.to_string(),
        alias: alias.map(str::to_string),
        path: path.clone(),
        is_external,
    };

    let body = text
        .trim()
        .trim_start_matches("import")
        .trim_end_matches(';')
        .trim();

    if let (Some(open), Some(close)) = (body.find('{'), body.find('}')) {
        if open < close {
            return body[open + 1..close]
                .split(',')
                .filter_map(|item| {
                    let mut words = item.split_whitespace();
                    let name = words.next()?;
                    let alias = match (words.next(), words.next()) {
                        (Some("as"), Some(alias)) => Some(alias),
                        _ => None,
                    };
                    Some(record(name, alias))
                })
                .collect();
        }
    }

    if body.starts_with('*') {
        if let Some(alias) = alias_after_as(body) {
            return vec![record(alias, Some(alias))];
        }
    }

    let after_path = body.rsplit(|c| c == '"' || c == '\'').next().unwrap_or("");
    if let Some(alias) = alias_after_as(after_path) {
        return vec![record(alias, Some(alias))];
    }

    // `import Foo from "./Foo.sol";`
    if let Some(from_idx) = body.find(" from ") {
        let default_name = body[..from_idx].trim();
        if !default_name.is_empty() && !default_name.starts_with(['"', '\'', '*']) {
            return vec![record(default_name, None)];
        }
    }

    let stem = file_stem(&path);
    if stem.is_empty() {
        return Vec::new();
    }
    vec![record(stem, None)]
}

fn quoted_path(text: &str) -> Option<String> {
    let start = text.find(['"', '\''])?;
    let quote = text[start..].chars().next()?;
    let rest = &text[start + 1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

fn alias_after_as(text: &str) -> Option<&str> {
    let mut words = text.split_whitespace();
    while let Some(word) = words.next() {
        if word == "as" {
            return words
                .next()
                .map(|w| w.trim_end_matches(';'))
                .filter(|w| !w.is_empty());
        }
    }
    None
}

/// Resolve an import path as seen from `from_file`. Relative paths are joined
/// to the importing file's directory; external paths are returned unchanged.
pub fn resolve_import_path(from_file: &str, import_path: &str) -> String {
    if is_external_path(import_path) {
        return import_path.to_string();
    }

    let mut segments = from_file
        .replace('\\', "/")
        .split('/')
        .map(str::to_string)
        .collect::<Vec<_>>();
    segments.pop();

    for segment in import_path.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                if segments.last().is_some_and(|s| s != "..") && !segments.is_empty() {
                    segments.pop();
                } else {
                    segments.push("..".to_string());
                }
            }
            other => segments.push(other.to_string()),
        }
    }

    segments.join("/")
}
