//! Deck step composition (§4.G.5): turns each `control_plane.deck` block
//! into an external-tool `PlannedChange`, plus the post-resolution targets
//! that downstream `gateway_service` changes depend on.

use kongctl_definitions::{ResourceSet, ResourceType};

use super::{Action, PlanOptions, PlannedChange};

#[derive(Debug, Clone)]
pub struct DeckToolInvocation {
    pub control_plane_ref: String,
    pub binary: String,
    pub steps: Vec<Vec<String>>,
}

/// A gateway service the `deck` command is expected to create, discovered
/// by matching `external: {selector}` blocks against this control plane's
/// deck step rather than a direct kongctl-managed resource.
#[derive(Debug, Clone)]
pub struct PostResolutionTarget {
    pub resource_ref: String,
    pub control_plane_ref: String,
    pub selector: std::collections::BTreeMap<String, String>,
}

pub fn build_deck_changes(set: &ResourceSet, options: &PlanOptions) -> Vec<PlannedChange> {
    let mut changes = Vec::new();
    for cp in &set.control_planes {
        let Some(deck) = &cp.deck else { continue };
        let steps = deck.steps();
        if steps.is_empty() {
            continue;
        }

        let targets: Vec<PostResolutionTarget> = set
            .gateway_services
            .iter()
            .filter(|svc| svc.parent_ref == cp.ref_)
            .filter_map(|svc| {
                svc.external.as_ref().map(|ext| PostResolutionTarget {
                    resource_ref: svc.ref_.clone(),
                    control_plane_ref: cp.ref_.clone(),
                    selector: ext.selector.match_fields.clone(),
                })
            })
            .collect();

        changes.push(PlannedChange {
            id: format!("deck:{}", cp.ref_),
            action: Action::ExternalTool,
            resource_type: ResourceType::Deck,
            resource_ref: format!("{}::deck", cp.ref_),
            resource_id: None,
            parent_ref: Some(cp.ref_.clone()),
            fields: serde_json::Map::new(),
            depends_on: vec![format!("{}:{}", ResourceType::ControlPlane, cp.ref_)],
            protection: None,
            post_resolution_targets: targets,
            tool: Some(DeckToolInvocation {
                control_plane_ref: cp.ref_.clone(),
                binary: options.deck_binary.clone(),
                steps,
            }),
        });
    }
    changes
}
