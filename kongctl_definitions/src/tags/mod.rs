//! Tag resolvers (§4.A): `!file` and `!ref`, dispatched from
//! `serde_yaml::Value::Tagged` nodes produced while parsing a source
//! document, ahead of strict typed deserialization.

mod file_tag;
mod ref_tag;
pub use ref_tag::parse_placeholder;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::configuration;
use crate::Result;

/// Key for the per-load memoization cache: a resolved path plus the
/// optional `extract` dot path applied to it.
type CacheKey = (PathBuf, Option<String>);

/// Resolves `!file`/`!ref` tags found while walking a parsed YAML
/// document. One resolver is constructed per `Loader` invocation and
/// shared (read-mostly) across every source file it processes, the same
/// lifetime as the teacher's `Vault` client is shared across a manifest
/// resolution pass.
pub struct TagResolver {
    root: PathBuf,
    cache: RwLock<HashMap<CacheKey, serde_yaml::Value>>,
}

impl TagResolver {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        TagResolver {
            root: root.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_get(&self, key: &CacheKey) -> Option<serde_yaml::Value> {
        self.cache.read().expect("tag cache poisoned").get(key).cloned()
    }

    fn cache_put(&self, key: CacheKey, value: serde_yaml::Value) {
        self.cache.write().expect("tag cache poisoned").insert(key, value);
    }

    /// Walks `node` (the freshly-parsed document of one source file) and
    /// resolves every custom tag it contains, returning an equivalent
    /// document with only plain (untagged) nodes.
    pub fn resolve_document(&self, node: serde_yaml::Value, file_dir: &Path) -> Result<serde_yaml::Value> {
        self.resolve_node(node, file_dir)
    }

    fn resolve_node(&self, node: serde_yaml::Value, file_dir: &Path) -> Result<serde_yaml::Value> {
        match node {
            serde_yaml::Value::Tagged(tagged) => self.dispatch_tag(*tagged, file_dir),
            serde_yaml::Value::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.resolve_node(item, file_dir)?);
                }
                Ok(serde_yaml::Value::Sequence(out))
            }
            serde_yaml::Value::Mapping(map) => {
                let mut out = serde_yaml::Mapping::new();
                for (k, v) in map {
                    let k = self.resolve_node(k, file_dir)?;
                    let v = self.resolve_node(v, file_dir)?;
                    out.insert(k, v);
                }
                Ok(serde_yaml::Value::Mapping(out))
            }
            other => Ok(other),
        }
    }

    fn dispatch_tag(&self, tagged: serde_yaml::value::TaggedValue, file_dir: &Path) -> Result<serde_yaml::Value> {
        // serde_yaml renders custom tag names with a leading '!'; built-in
        // forms (`!!str`, `!!int`, ...) are double-banged and untouched.
        let tag_name = tagged.tag.to_string();
        let stripped = tag_name.trim_start_matches('!');
        if tag_name.starts_with("!!") {
            // Built-in scalar tag: resolve the inner value and re-tag it.
            let inner = self.resolve_node(tagged.value, file_dir)?;
            return Ok(serde_yaml::Value::Tagged(Box::new(serde_yaml::value::TaggedValue {
                tag: tagged.tag,
                value: inner,
            })));
        }
        match stripped {
            "file" => file_tag::resolve(self, &tagged.value, file_dir),
            "ref" => ref_tag::resolve(&tagged.value),
            other => Err(crate::error::DefError::from(crate::error::DefErrKind::UnsupportedTag(other.to_string())).into()),
        }
    }
}

/// Resolves `candidate` (possibly relative) against `base`, then verifies
/// the canonical result does not escape `root`. Used by both `!file` and
/// the loader's deck-config path resolution (§4.C.6), since both need the
/// same sandboxing rule.
pub fn resolve_within_root(root: &Path, base: &Path, candidate: &str) -> Result<PathBuf> {
    if Path::new(candidate).is_absolute() {
        return Err(configuration(format!("absolute paths are not allowed: {}", candidate)));
    }
    let joined = base.join(candidate);
    let canonical_root = root
        .canonicalize()
        .map_err(|e| configuration(format!("cannot resolve tag root {}: {}", root.display(), e)))?;
    let canonical = joined
        .canonicalize()
        .map_err(|e| configuration(format!("cannot resolve path {}: {}", joined.display(), e)))?;
    if !canonical.starts_with(&canonical_root) {
        return Err(crate::error::DefError::from(crate::error::DefErrKind::PathEscapesBaseDir(candidate.to_string())).into());
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn rejects_absolute_paths() {
        let root = tempdir().unwrap();
        let err = resolve_within_root(root.path(), root.path(), "/etc/passwd").unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn rejects_escaping_paths() {
        let root = tempdir().unwrap();
        let sub = root.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(root.path().join("outside.txt"), b"hi").unwrap();
        let err = resolve_within_root(&sub, &sub, "../outside.txt").unwrap_err();
        assert!(err.to_string().contains("resolves outside"));
    }

    #[test]
    fn accepts_paths_within_root() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("inside.txt"), b"hi").unwrap();
        let resolved = resolve_within_root(root.path(), root.path(), "inside.txt").unwrap();
        assert!(resolved.starts_with(root.path().canonicalize().unwrap()));
    }
}
