//! Label conventions applied to every managed remote object (§6, §4.G.6):
//! `managed-by`, `namespace`, `protected`. The planner reads these back off
//! live objects to decide sync-mode deletions and protection checks.

pub const MANAGED_BY: &str = "managed-by";
pub const NAMESPACE: &str = "namespace";
pub const PROTECTED: &str = "protected";

/// Builds the label set kongctl stamps onto a resource it creates or updates.
pub fn managed_labels(generator: &str, namespace: &str, protected: bool) -> std::collections::BTreeMap<String, String> {
    let mut labels = std::collections::BTreeMap::new();
    labels.insert(MANAGED_BY.to_string(), generator.to_string());
    labels.insert(NAMESPACE.to_string(), namespace.to_string());
    labels.insert(PROTECTED.to_string(), protected.to_string());
    labels
}

/// True when `labels` mark the object as managed by `generator`.
pub fn is_managed_by(labels: &std::collections::BTreeMap<String, String>, generator: &str) -> bool {
    labels.get(MANAGED_BY).map(|v| v == generator).unwrap_or(false)
}

/// True when `labels` carry `protected=true`.
pub fn is_protected(labels: &std::collections::BTreeMap<String, String>) -> bool {
    labels.get(PROTECTED).map(|v| v == "true").unwrap_or(false)
}

pub fn namespace_of(labels: &std::collections::BTreeMap<String, String>) -> Option<&str> {
    labels.get(NAMESPACE).map(|s| s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_reads_back_labels() {
        let labels = managed_labels("kongctl", "team-alpha", true);
        assert!(is_managed_by(&labels, "kongctl"));
        assert!(!is_managed_by(&labels, "other-tool"));
        assert!(is_protected(&labels));
        assert_eq!(namespace_of(&labels), Some("team-alpha"));
    }
}
