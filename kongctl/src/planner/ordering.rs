//! Dependency linking and ordering (§4.G.3/4/7/8): parent/child and
//! reference-placeholder edges, a stable tie-break sort, and a
//! `petgraph::algo::toposort` acyclicity check — the same dependency-graph
//! role the teacher's `graph` module plays for manifest ordering.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use super::{internal_bug, PlannedChange};
use crate::Result;

/// Derives `depends_on` edges from parent/child relationships and any
/// `__REF__:` placeholder still sitting in a change's fields.
pub fn link_dependencies(changes: &mut [PlannedChange]) {
    let mut ref_to_id: HashMap<String, String> = changes.iter().map(|c| (c.resource_ref.clone(), c.id.clone())).collect();
    // An `external` resource has no change of its own; whatever `__REF__:`
    // placeholder names it must instead depend on the change that owns its
    // post-resolution target (a `deck` step), so the executor has actually
    // created the object by the time the placeholder needs resolving.
    for c in changes.iter() {
        for target in &c.post_resolution_targets {
            ref_to_id.entry(target.resource_ref.clone()).or_insert_with(|| c.id.clone());
        }
    }

    for i in 0..changes.len() {
        let mut deps: HashSet<String> = changes[i].depends_on.iter().cloned().collect();
        let own_id = changes[i].id.clone();

        if let Some(parent_ref) = changes[i].parent_ref.clone() {
            if let Some(parent_id) = ref_to_id.get(&parent_ref) {
                if *parent_id != own_id {
                    deps.insert(parent_id.clone());
                }
            }
        }

        for value in changes[i].fields.values() {
            if let Some(target_id) = placeholder_target_id(value, &ref_to_id) {
                if target_id != own_id {
                    deps.insert(target_id);
                }
            }
        }

        let mut deps: Vec<String> = deps.into_iter().collect();
        deps.sort();
        changes[i].depends_on = deps;
    }
}

fn placeholder_target_id(value: &serde_json::Value, ref_to_id: &HashMap<String, String>) -> Option<String> {
    let s = value.as_str()?;
    let target_ref = s.strip_prefix("__REF__:")?.split('#').next()?;
    ref_to_id.get(target_ref).cloned()
}

/// Stable `(kind_priority, ref)` ordering so repeated runs over the same
/// input produce byte-identical plans (§4.G.7).
pub fn tie_break_sort(changes: &mut [PlannedChange]) {
    changes.sort_by(|a, b| {
        a.resource_type
            .kind_priority()
            .cmp(&b.resource_type.kind_priority())
            .then_with(|| a.resource_ref.cmp(&b.resource_ref))
    });
}

/// A cycle here is a planner bug, not a user error: the planner is the
/// only producer of `depends_on` edges (§9).
pub fn validate_acyclic(changes: &[PlannedChange]) -> Result<()> {
    let mut graph = DiGraph::<&str, ()>::new();
    let mut index = HashMap::new();
    for c in changes {
        index.insert(c.id.as_str(), graph.add_node(c.id.as_str()));
    }
    for c in changes {
        for dep in &c.depends_on {
            if let (Some(&dep_idx), Some(&this_idx)) = (index.get(dep.as_str()), index.get(c.id.as_str())) {
                graph.add_edge(dep_idx, this_idx, ());
            }
        }
    }
    if toposort(&graph, None).is_err() {
        debug_assert!(false, "planner produced a cyclic depends_on graph");
        return Err(internal_bug("cyclic depends_on graph"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Action;
    use kongctl_definitions::ResourceType;

    fn change(id: &str, kind: ResourceType, r: &str, parent_ref: Option<&str>) -> PlannedChange {
        PlannedChange {
            id: id.to_string(),
            action: Action::Create,
            resource_type: kind,
            resource_ref: r.to_string(),
            resource_id: None,
            parent_ref: parent_ref.map(|s| s.to_string()),
            fields: serde_json::Map::new(),
            depends_on: Vec::new(),
            protection: None,
            post_resolution_targets: Vec::new(),
            tool: None,
        }
    }

    #[test]
    fn links_parent_child_dependency() {
        let mut changes = vec![
            change("control_plane:cp1", ResourceType::ControlPlane, "cp1", None),
            change("gateway_service:svc1", ResourceType::GatewayService, "svc1", Some("cp1")),
        ];
        link_dependencies(&mut changes);
        assert_eq!(changes[1].depends_on, vec!["control_plane:cp1".to_string()]);
    }

    #[test]
    fn tie_break_sort_is_stable_across_runs() {
        let mut a = vec![
            change("api:b", ResourceType::Api, "b", None),
            change("api:a", ResourceType::Api, "a", None),
            change("control_plane:cp1", ResourceType::ControlPlane, "cp1", None),
        ];
        tie_break_sort(&mut a);
        let refs: Vec<&str> = a.iter().map(|c| c.resource_ref.as_str()).collect();
        assert_eq!(refs, vec!["cp1", "a", "b"]);
    }

    #[test]
    fn detects_cycle() {
        let mut c1 = change("a:1", ResourceType::Api, "1", None);
        c1.depends_on = vec!["a:2".to_string()];
        let mut c2 = change("a:2", ResourceType::Api, "2", None);
        c2.depends_on = vec!["a:1".to_string()];
        assert!(validate_acyclic(&[c1, c2]).is_err());
    }
}
