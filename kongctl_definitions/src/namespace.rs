//! Namespace syntax rules (§3.1, §4.E): lowercase alphanumerics, `-`, `_`,
//! `.`; non-empty; at most 63 characters — the same constraint the
//! teacher applies to Kubernetes-style names in `structs::Metadata`.

use crate::error::{validation, Result};

pub const MAX_LEN: usize = 63;

pub fn validate_namespace(ns: &str) -> Result<()> {
    if ns.is_empty() {
        return Err(validation("namespace must not be empty"));
    }
    if ns.len() > MAX_LEN {
        return Err(validation(format!(
            "namespace '{}' exceeds {} characters",
            ns, MAX_LEN
        )));
    }
    let valid = ns
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '.');
    if !valid {
        return Err(validation(format!(
            "namespace '{}' must contain only lowercase alphanumerics, '-', '_', '.'",
            ns
        )));
    }
    Ok(())
}
