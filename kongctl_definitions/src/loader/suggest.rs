//! Unknown-field suggestion (§4.C.3): when strict deserialization rejects a
//! field serde doesn't recognize, turn its raw error message into a
//! friendlier one pointing at the most likely intended field name.

use regex::Regex;
use std::collections::HashMap;
use strsim::levenshtein;

/// A few typos seen often enough in the wild to special-case ahead of the
/// distance heuristic.
fn misspelling_map() -> HashMap<&'static str, &'static str> {
    let mut m = HashMap::new();
    m.insert("nam", "name");
    m.insert("lables", "labels");
    m.insert("discription", "description");
    m.insert("desciption", "description");
    m.insert("namespce", "namespace");
    m.insert("prtected", "protected");
    m.insert("protcted", "protected");
    m.insert("refrence", "ref");
    m
}

fn positional_match_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let len = a.len().max(b.len());
    if len == 0 {
        return 1.0;
    }
    let matches = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matches as f64 / len as f64
}

/// Picks the best candidate for `unknown` out of `known_fields`, using (in
/// order of preference): the hard-coded misspelling map, edit distance
/// <= 2, substring containment, or >= 70% positional character overlap.
pub fn suggest_field(unknown: &str, known_fields: &[String]) -> Option<String> {
    if let Some(mapped) = misspelling_map().get(unknown) {
        if known_fields.iter().any(|f| f == mapped) {
            return Some(mapped.to_string());
        }
    }

    let mut best: Option<(String, usize)> = None;
    for field in known_fields {
        let dist = levenshtein(unknown, field);
        if dist <= 2 && best.as_ref().map(|(_, d)| dist < *d).unwrap_or(true) {
            best = Some((field.clone(), dist));
        }
    }
    if let Some((field, _)) = best {
        return Some(field);
    }

    if let Some(field) = known_fields.iter().find(|f| f.contains(unknown) || unknown.contains(f.as_str())) {
        return Some(field.clone());
    }

    known_fields
        .iter()
        .map(|f| (f, positional_match_ratio(unknown, f)))
        .filter(|(_, ratio)| *ratio >= 0.7)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(f, _)| f.clone())
}

/// Parses serde_yaml's `unknown field \`x\`, expected one of \`a\`, \`b\``
/// message shape and, if it matches, appends a suggestion.
pub fn enrich_unknown_field_message(raw: &str) -> String {
    let re = Regex::new(r"unknown field `([^`]+)`(?:, expected (?:one of )?(.+))?").unwrap();
    let Some(caps) = re.captures(raw) else {
        return raw.to_string();
    };
    let unknown = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let expected_blob = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    let field_re = Regex::new(r"`([^`]+)`").unwrap();
    let known_fields: Vec<String> = field_re.captures_iter(expected_blob).map(|c| c[1].to_string()).collect();

    match suggest_field(unknown, &known_fields) {
        Some(suggestion) => format!("{} (did you mean '{}'?)", raw, suggestion),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catches_misspelling_map_hit() {
        let known = vec!["name".to_string(), "ref".to_string()];
        assert_eq!(suggest_field("nam", &known), Some("name".to_string()));
    }

    #[test]
    fn catches_close_edit_distance() {
        let known = vec!["description".to_string()];
        assert_eq!(suggest_field("descriptoin", &known), Some("description".to_string()));
    }

    #[test]
    fn enriches_serde_style_message() {
        let raw = "unknown field `nam`, expected one of `ref`, `name`, `description`";
        let enriched = enrich_unknown_field_message(raw);
        assert!(enriched.contains("did you mean 'name'?"));
    }
}
