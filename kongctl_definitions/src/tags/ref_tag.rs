//! `!ref` tag resolution (§4.A, §9): emits the placeholder string the
//! reference resolver (component D) later substitutes.

use crate::error::{configuration, Result};

pub const PLACEHOLDER_PREFIX: &str = "__REF__:";
const DEFAULT_FIELD: &str = "id";

pub fn resolve(node: &serde_yaml::Value) -> Result<serde_yaml::Value> {
    let raw = node
        .as_str()
        .ok_or_else(|| configuration("!ref must be a scalar '<resource-ref>[#<field>]'"))?;
    let mut parts = raw.splitn(2, '#');
    let resource_ref = parts.next().unwrap_or_default();
    if resource_ref.is_empty() {
        return Err(configuration("!ref requires a non-empty resource ref"));
    }
    let field = parts.next().filter(|f| !f.is_empty()).unwrap_or(DEFAULT_FIELD);
    Ok(serde_yaml::Value::String(format!("{}{}#{}", PLACEHOLDER_PREFIX, resource_ref, field)))
}

/// Parses a placeholder string previously emitted by [`resolve`].
pub fn parse_placeholder(value: &str) -> Option<(&str, &str)> {
    let rest = value.strip_prefix(PLACEHOLDER_PREFIX)?;
    let mut parts = rest.splitn(2, '#');
    let resource_ref = parts.next()?;
    let field = parts.next()?;
    Some((resource_ref, field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_field_to_id() {
        let node = serde_yaml::Value::String("my-portal".into());
        let out = resolve(&node).unwrap();
        assert_eq!(out, serde_yaml::Value::String("__REF__:my-portal#id".into()));
    }

    #[test]
    fn honours_explicit_field() {
        let node = serde_yaml::Value::String("my-portal#name".into());
        let out = resolve(&node).unwrap();
        assert_eq!(out, serde_yaml::Value::String("__REF__:my-portal#name".into()));
    }

    #[test]
    fn round_trips_through_parse_placeholder() {
        let node = serde_yaml::Value::String("my-service#url".into());
        let out = resolve(&node).unwrap();
        let s = out.as_str().unwrap();
        assert_eq!(parse_placeholder(s), Some(("my-service", "url")));
    }

    #[test]
    fn rejects_non_scalar() {
        let node = serde_yaml::Value::Sequence(vec![]);
        assert!(resolve(&node).is_err());
    }
}
