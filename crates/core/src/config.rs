use crate::classify::PolicyKind;
use crate::error::ConfigError;
use crate::parser::FilterOptions;
use crate::resolver::{FsResolver, LibraryMapping, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_project_name")]
    pub project_name: String,

    #[serde(default)]
    pub call_policy: PolicyKind,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default)]
    pub filter: FilterOptions,

    #[serde(default = "default_libraries")]
    pub libraries: Vec<LibraryConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

/// One third-party library: where its imports point and where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub id: String,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Import prefix, e.g. `@openzeppelin/contracts/`.
    pub prefix: String,
    /// Directory the prefix maps to, relative to the project root.
    pub root: PathBuf,
    /// Value written to `librarySource` on contracts from this library.
    pub source: String,
}

impl LibraryConfig {
    pub fn mapping(&self, base_dir: &Path) -> LibraryMapping {
        LibraryMapping::new(&self.prefix, base_dir.join(&self.root), &self.source)
    }
}

fn default_project_name() -> String {
    "project".to_string()
}
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
fn default_version() -> String {
    "unknown".to_string()
}

fn default_libraries() -> Vec<LibraryConfig> {
    vec![
        LibraryConfig {
            id: "openzeppelin-contracts".to_string(),
            name: "OpenZeppelin Contracts".to_string(),
            version: default_version(),
            prefix: "@openzeppelin/contracts/".to_string(),
            root: PathBuf::from("lib/openzeppelin-contracts/contracts"),
            source: "openzeppelin".to_string(),
        },
        LibraryConfig {
            id: "openzeppelin-contracts-upgradeable".to_string(),
            name: "OpenZeppelin Contracts Upgradeable".to_string(),
            version: default_version(),
            prefix: "@openzeppelin/contracts-upgradeable/".to_string(),
            root: PathBuf::from("lib/openzeppelin-contracts-upgradeable/contracts"),
            source: "openzeppelin-upgradeable".to_string(),
        },
        LibraryConfig {
            id: "solady".to_string(),
            name: "Solady".to_string(),
            version: default_version(),
            prefix: "solady/".to_string(),
            root: PathBuf::from("lib/solady"),
            source: "solady".to_string(),
        },
    ]
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            call_policy: PolicyKind::default(),
            max_depth: default_max_depth(),
            filter: FilterOptions::default(),
            libraries: default_libraries(),
            cache_dir: None,
        }
    }
}

impl GraphConfig {
    /// Load by extension: `.yaml`/`.yml` or `.json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Defaults overridden by `SOLGRAPH_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("SOLGRAPH_PROJECT_NAME") {
            config.project_name = name;
        }

        if let Ok(policy) = std::env::var("SOLGRAPH_CALL_POLICY") {
            if let Ok(policy) = policy.parse() {
                config.call_policy = policy;
            }
        }

        if let Ok(depth) = std::env::var("SOLGRAPH_MAX_DEPTH") {
            if let Ok(depth) = depth.parse::<usize>() {
                config.max_depth = depth;
            }
        }

        if let Ok(dir) = std::env::var("SOLGRAPH_CACHE_DIR") {
            config.cache_dir = Some(PathBuf::from(dir));
        }

        config
    }

    pub fn save_yaml(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Filesystem resolver over the configured libraries, rooted at `base_dir`.
    pub fn fs_resolver(&self, base_dir: &Path) -> FsResolver {
        FsResolver::new(
            self.libraries
                .iter()
                .map(|library| library.mapping(base_dir))
                .collect(),
        )
    }
}

pub const EXAMPLE_CONFIG: &str = r#"
# solgraph configuration

project_name: my-protocol

# simple: user projects (favors recall)
# rich: library caches (suppresses casts, errors and events)
call_policy: simple

# Rounds of external import expansion
max_depth: 5

filter:
  exclude_interfaces: false
  exclude_libraries: false
  exclude_mocks: true
  exclude_storages: false
  exclude_tests: true
  parallel: true

libraries:
  - id: openzeppelin-contracts
    name: OpenZeppelin Contracts
    version: 5.0.2
    prefix: "@openzeppelin/contracts/"
    root: lib/openzeppelin-contracts/contracts
    source: openzeppelin
  - id: solady
    name: Solady
    version: 0.0.200
    prefix: "solady/"
    root: lib/solady
    source: solady

# Pre-built library graphs (see `solgraph build-cache`)
cache_dir: .solgraph/cache
"#;
