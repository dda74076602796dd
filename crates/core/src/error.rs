use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to load Solidity grammar: {0}")]
    Grammar(String),

    #[error("invalid tree-sitter query: {0}")]
    Query(String),

    #[error("parser produced no syntax tree for {0}")]
    NoTree(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config extension: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("max_depth must be at least 1")]
    ZeroDepth,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid library graph record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("library root does not exist: {0}")]
    MissingRoot(PathBuf),
}
