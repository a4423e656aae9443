//! `!file` tag resolution (§4.A).

use std::path::Path;

use base64::Engine;

use super::TagResolver;
use crate::error::{configuration, Result};

const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

struct FileTagArgs {
    path: String,
    extract: Option<String>,
}

fn parse_args(node: &serde_yaml::Value) -> Result<FileTagArgs> {
    match node {
        serde_yaml::Value::String(s) => {
            let mut parts = s.splitn(2, '#');
            let path = parts.next().unwrap_or_default().to_string();
            let extract = parts.next().map(|s| s.to_string());
            Ok(FileTagArgs { path, extract })
        }
        serde_yaml::Value::Mapping(map) => {
            let path = map
                .get(&serde_yaml::Value::String("path".into()))
                .and_then(|v| v.as_str())
                .ok_or_else(|| configuration("!file mapping form requires a 'path' key"))?
                .to_string();
            let extract = map
                .get(&serde_yaml::Value::String("extract".into()))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            Ok(FileTagArgs { path, extract })
        }
        _ => Err(configuration("!file must be a scalar 'path[#extract]' or a {path, extract} mapping")),
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "svg" => Some("image/svg+xml"),
        "ico" => Some("image/x-icon"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn is_structured_extension(ext: &str) -> bool {
    matches!(ext, "yaml" | "yml" | "json")
}

fn parse_structured(bytes: &[u8], ext: &str, path: &Path) -> Result<serde_yaml::Value> {
    let text = String::from_utf8_lossy(bytes);
    if ext == "json" {
        let json: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| configuration(format!("invalid JSON in {}: {}", path.display(), e)))?;
        serde_yaml::to_value(json).map_err(|e| configuration(format!("cannot convert {}: {}", path.display(), e)))
    } else {
        serde_yaml::from_str(&text).map_err(|e| configuration(format!("invalid YAML in {}: {}", path.display(), e)))
    }
}

/// Walks a dot path over maps/sequences and scalar leaves, case-insensitive
/// on map keys (§4.A). On a miss, lists sibling keys up to depth 2 as a hint.
fn extract_dot_path(value: &serde_yaml::Value, dotpath: &str) -> Result<serde_yaml::Value> {
    let mut current = value.clone();
    let mut walked = Vec::new();
    for segment in dotpath.split('.') {
        walked.push(segment.to_string());
        current = match &current {
            serde_yaml::Value::Mapping(map) => {
                let hit = map.iter().find(|(k, _)| {
                    k.as_str().map(|ks| ks.eq_ignore_ascii_case(segment)).unwrap_or(false)
                });
                match hit {
                    Some((_, v)) => v.clone(),
                    None => {
                        let siblings = sibling_paths(&current, 2);
                        return Err(configuration(format!(
                            "extract path '{}' not found (failed at '{}'); available paths: {}",
                            dotpath,
                            walked.join("."),
                            siblings.join(", ")
                        )));
                    }
                }
            }
            serde_yaml::Value::Sequence(seq) => {
                let idx: usize = segment
                    .parse()
                    .map_err(|_| configuration(format!("extract path '{}' expects a numeric index at '{}'", dotpath, segment)))?;
                seq.get(idx)
                    .cloned()
                    .ok_or_else(|| configuration(format!("extract path '{}' index {} out of range", dotpath, idx)))?
            }
            _ => {
                return Err(configuration(format!(
                    "extract path '{}' descends into a scalar at '{}'",
                    dotpath,
                    walked.join(".")
                )))
            }
        };
    }
    Ok(current)
}

fn sibling_paths(value: &serde_yaml::Value, depth: usize) -> Vec<String> {
    fn walk(value: &serde_yaml::Value, prefix: &str, depth: usize, out: &mut Vec<String>) {
        if depth == 0 {
            return;
        }
        if let serde_yaml::Value::Mapping(map) = value {
            for (k, v) in map {
                if let Some(ks) = k.as_str() {
                    let path = if prefix.is_empty() { ks.to_string() } else { format!("{}.{}", prefix, ks) };
                    out.push(path.clone());
                    walk(v, &path, depth - 1, out);
                }
            }
        }
    }
    let mut out = Vec::new();
    walk(value, "", depth, &mut out);
    out
}

pub fn resolve(resolver: &TagResolver, node: &serde_yaml::Value, file_dir: &Path) -> Result<serde_yaml::Value> {
    let args = parse_args(node)?;
    let resolved_path = super::resolve_within_root(resolver.root(), file_dir, &args.path)?;

    let key = (resolved_path.clone(), args.extract.clone());
    if let Some(cached) = resolver.cache_get(&key) {
        return Ok(cached);
    }

    let meta = std::fs::metadata(&resolved_path)
        .map_err(|e| configuration(format!("cannot stat {}: {}", resolved_path.display(), e)))?;
    if meta.len() > MAX_FILE_BYTES {
        return Err(configuration(format!(
            "{} is {} bytes, exceeding the {} byte limit",
            resolved_path.display(),
            meta.len(),
            MAX_FILE_BYTES
        )));
    }

    let ext = resolved_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let bytes = std::fs::read(&resolved_path)
        .map_err(|e| configuration(format!("cannot read {}: {}", resolved_path.display(), e)))?;

    let resolved = if let Some(mime) = mime_for_extension(&ext) {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        serde_yaml::Value::String(format!("data:{};base64,{}", mime, encoded))
    } else if is_structured_extension(&ext) {
        let parsed = parse_structured(&bytes, &ext, &resolved_path)?;
        match &args.extract {
            Some(dotpath) => extract_dot_path(&parsed, dotpath)?,
            None => parsed,
        }
    } else {
        serde_yaml::Value::String(String::from_utf8_lossy(&bytes).into_owned())
    };

    resolver.cache_put(key, resolved.clone());
    Ok(resolved)
}
