//! Cold resolution: map import prefixes to library checkouts on disk.

use super::paths::normalize_import_path;
use super::{ImportResolver, Resolution};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_CACHE_SIZE: usize = 512;

/// `@openzeppelin/contracts/` -> `lib/openzeppelin-contracts/contracts`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryMapping {
    pub prefix: String,
    pub root: PathBuf,
    pub source: String,
}

impl LibraryMapping {
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            root: root.into(),
            source: source.into(),
        }
    }
}

pub struct FsResolver {
    mappings: Vec<LibraryMapping>,
    contents: Mutex<LruCache<PathBuf, Arc<str>>>,
}

impl FsResolver {
    pub fn new(mappings: Vec<LibraryMapping>) -> Self {
        Self::with_cache_size(mappings, DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(mut mappings: Vec<LibraryMapping>, cache_size: usize) -> Self {
        // Longest prefix first, so `contracts-upgradeable/` beats `contracts/`
        // style overlaps regardless of configuration order.
        mappings.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            mappings,
            contents: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn mappings(&self) -> &[LibraryMapping] {
        &self.mappings
    }

    /// Physical file and owning mapping for an import path.
    pub fn locate(&self, import_path: &str) -> Option<(PathBuf, &LibraryMapping)> {
        let normalized = normalize_import_path(import_path);
        self.mappings.iter().find_map(|mapping| {
            let prefix = normalize_import_path(&mapping.prefix);
            normalized
                .strip_prefix(prefix.as_str())
                .map(|rest| (mapping.root.join(rest.trim_start_matches('/')), mapping))
        })
    }

    fn read(&self, path: &Path) -> Option<Arc<str>> {
        if let Some(content) = self.contents.lock().get(path) {
            return Some(Arc::clone(content));
        }

        let content: Arc<str> = match std::fs::read_to_string(path) {
            Ok(content) => content.into(),
            Err(e) => {
                debug!("Cannot read {}: {}", path.display(), e);
                return None;
            }
        };
        self.contents
            .lock()
            .put(path.to_path_buf(), Arc::clone(&content));
        Some(content)
    }
}

impl ImportResolver for FsResolver {
    fn resolve(&self, import_path: &str) -> Option<Resolution> {
        let (file, mapping) = self.locate(import_path)?;
        let content = self.read(&file)?;
        Some(Resolution::Source {
            logical_path: normalize_import_path(import_path),
            content: content.to_string(),
            library_source: mapping.source.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_longest_prefix_wins() {
        let resolver = FsResolver::new(vec![
            LibraryMapping::new("@openzeppelin/contracts/", "lib/oz", "openzeppelin"),
            LibraryMapping::new(
                "@openzeppelin/contracts-upgradeable/",
                "lib/oz-up",
                "openzeppelin-upgradeable",
            ),
        ]);

        let (path, mapping) = resolver
            .locate("@openzeppelin/contracts-upgradeable/proxy/utils/UUPSUpgradeable.sol")
            .unwrap();
        assert_eq!(mapping.source, "openzeppelin-upgradeable");
        assert_eq!(path, PathBuf::from("lib/oz-up/proxy/utils/UUPSUpgradeable.sol"));

        let (path, _) = resolver
            .locate("@openzeppelin/contracts@5.0.2/access/Ownable.sol")
            .unwrap();
        assert_eq!(path, PathBuf::from("lib/oz/access/Ownable.sol"));

        assert!(resolver.locate("solady/src/Foo.sol").is_none());
    }

    #[test]
    fn test_resolves_source_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("access")).unwrap();
        fs::write(dir.path().join("access/Ownable.sol"), "abstract contract Ownable {}").unwrap();

        let resolver = FsResolver::new(vec![LibraryMapping::new(
            "@openzeppelin/contracts/",
            dir.path(),
            "openzeppelin",
        )]);

        match resolver.resolve("@openzeppelin/contracts/access/Ownable.sol") {
            Some(Resolution::Source {
                logical_path,
                content,
                library_source,
            }) => {
                assert_eq!(logical_path, "@openzeppelin/contracts/access/Ownable.sol");
                assert!(content.contains("Ownable"));
                assert_eq!(library_source, "openzeppelin");
            }
            other => panic!("unexpected resolution: {:?}", other),
        }
        assert!(resolver
            .resolve("@openzeppelin/contracts/access/Missing.sol")
            .is_none());
    }
}
