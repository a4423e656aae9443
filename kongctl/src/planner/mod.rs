//! Planner (§4.G): turns a fully resolved `ResourceSet` plus live state
//! into an ordered `Plan` of `PlannedChange`s.

mod deck_step;
mod diff;
mod ordering;

use std::collections::HashMap;

use kongctl_definitions::{Resource, ResourceSet, ResourceType};

use crate::error::{execution, validation};
use crate::labels::{is_protected, managed_labels};
use crate::state::{List, RemoteObject};
use crate::Result;

pub use deck_step::{DeckToolInvocation, PostResolutionTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    Apply,
    Sync,
}

impl PlanMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanMode::Apply => "apply",
            PlanMode::Sync => "sync",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub mode: PlanMode,
    pub generator: String,
    pub deck_binary: String,
}

impl Default for PlanOptions {
    fn default() -> Self {
        PlanOptions {
            mode: PlanMode::Apply,
            generator: "kongctl".to_string(),
            deck_binary: "deck".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
    Noop,
    ExternalTool,
}

#[derive(Debug, Clone)]
pub struct ProtectionViolation {
    pub action: String,
    pub resource_ref: String,
}

#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub id: String,
    pub action: Action,
    pub resource_type: ResourceType,
    pub resource_ref: String,
    pub resource_id: Option<String>,
    pub parent_ref: Option<String>,
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub depends_on: Vec<String>,
    pub protection: Option<ProtectionViolation>,
    pub post_resolution_targets: Vec<PostResolutionTarget>,
    pub tool: Option<deck_step::DeckToolInvocation>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub noop: usize,
    pub external_tool: usize,
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub mode: PlanMode,
    pub generator: String,
    pub changes: Vec<PlannedChange>,
    pub summary: PlanSummary,
}

/// One resource read off the desired `ResourceSet`, with its fields
/// flattened to JSON so the diff logic (§4.G.2) can stay generic over
/// every resource kind without runtime reflection.
struct DesiredItem {
    ref_: String,
    kind: ResourceType,
    parent_ref: Option<String>,
    protected: bool,
    namespace: Option<String>,
    fields: serde_json::Map<String, serde_json::Value>,
}

/// Collects `items` into `out`, skipping any resource modeled `external`
/// (§3.2, glossary "Managed/external"): an external resource is only ever
/// referenced by selector against whatever `deck` creates, and must never
/// be planned as a `Create`/`Update`/`Delete` of its own.
fn collect_one<T: Resource + serde::Serialize>(out: &mut Vec<DesiredItem>, items: &[T]) {
    for r in items {
        if r.external().is_some() {
            continue;
        }
        let fields = serde_json::to_value(r).ok().and_then(|v| v.as_object().cloned()).unwrap_or_default();
        out.push(DesiredItem {
            ref_: r.get_ref().to_string(),
            kind: r.kind(),
            parent_ref: r.parent_ref().map(|s| s.to_string()),
            protected: r.kongctl().map(|m| m.protected).unwrap_or(false),
            namespace: r.kongctl().map(|m| m.namespace.clone()),
            fields,
        });
    }
}

fn desired_items(set: &ResourceSet) -> Vec<DesiredItem> {
    let mut out = Vec::new();
    collect_one(&mut out, &set.portals);
    collect_one(&mut out, &set.portal_customizations);
    collect_one(&mut out, &set.portal_auth_settings);
    collect_one(&mut out, &set.portal_custom_domains);
    collect_one(&mut out, &set.portal_pages);
    collect_one(&mut out, &set.portal_snippets);
    collect_one(&mut out, &set.portal_teams);
    collect_one(&mut out, &set.portal_team_roles);
    collect_one(&mut out, &set.portal_email_configs);
    collect_one(&mut out, &set.portal_email_templates);
    collect_one(&mut out, &set.apis);
    collect_one(&mut out, &set.api_versions);
    collect_one(&mut out, &set.api_publications);
    collect_one(&mut out, &set.api_implementations);
    collect_one(&mut out, &set.api_documents);
    collect_one(&mut out, &set.control_planes);
    collect_one(&mut out, &set.gateway_services);
    collect_one(&mut out, &set.application_auth_strategies);
    collect_one(&mut out, &set.organization_teams);
    out
}

pub struct Planner<'a> {
    state: &'a dyn crate::state::StateClient,
}

impl<'a> Planner<'a> {
    pub fn new(state: &'a dyn crate::state::StateClient) -> Self {
        Planner { state }
    }

    pub fn plan(&self, set: &ResourceSet, options: &PlanOptions) -> Result<Plan> {
        let desired = desired_items(set);

        let mut kinds: Vec<ResourceType> = desired.iter().map(|d| d.kind).collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds.dedup();

        let mut remote_index: HashMap<(ResourceType, String), RemoteObject> = HashMap::new();
        for kind in kinds {
            for obj in self.state.list(kind, None)? {
                if let Some(r) = &obj.ref_ {
                    remote_index.insert((kind, r.clone()), obj.clone());
                }
            }
        }

        let mut changes = Vec::new();
        let mut protection_violations = Vec::new();
        let mut claimed_refs = std::collections::HashSet::new();

        for item in &desired {
            claimed_refs.insert(item.ref_.clone());
            let remote = remote_index.get(&(item.kind, item.ref_.clone()));
            let (action, mut fields) = diff::classify(&item.fields, remote);

            if action == Action::Update {
                if let Some(obj) = remote {
                    if is_protected(&obj.labels) {
                        protection_violations.push(ProtectionViolation {
                            action: "update".to_string(),
                            resource_ref: item.ref_.clone(),
                        });
                    }
                }
            }

            // `ref`/`managed-by`/`namespace`/`protected` round-trip through
            // the remote object's own `labels`, not its data fields, so the
            // next plan can find it again by ref and scope sync deletions.
            if matches!(action, Action::Create | Action::Update) {
                let namespace = item.namespace.clone().unwrap_or_default();
                let mut labels = managed_labels(&options.generator, &namespace, item.protected);
                labels.insert("ref".to_string(), item.ref_.clone());
                fields.insert("labels".to_string(), serde_json::to_value(&labels).unwrap());
            }

            let change = PlannedChange {
                id: format!("{}:{}", item.kind, item.ref_),
                action,
                resource_type: item.kind,
                resource_ref: item.ref_.clone(),
                resource_id: remote.map(|o| o.id.clone()),
                parent_ref: item.parent_ref.clone(),
                fields,
                depends_on: Vec::new(),
                protection: None,
                post_resolution_targets: Vec::new(),
                tool: None,
            };
            changes.push(change);
        }

        let deck_changes = deck_step::build_deck_changes(set, options);
        changes.extend(deck_changes);

        ordering::link_dependencies(&mut changes);

        if options.mode == PlanMode::Sync {
            let desired_namespaces: std::collections::HashSet<String> = desired.iter().filter_map(|d| d.namespace.clone()).collect();
            self.add_sync_deletions(&mut changes, &remote_index, &claimed_refs, &desired_namespaces, options, &mut protection_violations)?;
        }

        if !protection_violations.is_empty() {
            let msg = protection_violations
                .iter()
                .map(|v| format!("cannot {} \"{}\": resource is protected", v.action, v.resource_ref))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(validation(msg));
        }

        ordering::tie_break_sort(&mut changes);
        ordering::validate_acyclic(&changes)?;

        let summary = summarize(&changes);
        Ok(Plan {
            mode: options.mode,
            generator: options.generator.clone(),
            changes,
            summary,
        })
    }

    fn add_sync_deletions(
        &self,
        changes: &mut Vec<PlannedChange>,
        remote_index: &HashMap<(ResourceType, String), RemoteObject>,
        claimed_refs: &std::collections::HashSet<String>,
        desired_namespaces: &std::collections::HashSet<String>,
        options: &PlanOptions,
        protection_violations: &mut Vec<ProtectionViolation>,
    ) -> Result<()> {
        for ((kind, r), obj) in remote_index {
            if claimed_refs.contains(r) {
                continue;
            }
            if !crate::labels::is_managed_by(&obj.labels, &options.generator) {
                continue;
            }
            let ns_in_scope = obj
                .labels
                .get(crate::labels::NAMESPACE)
                .map(|ns| desired_namespaces.contains(ns))
                .unwrap_or(false);
            if !ns_in_scope {
                continue;
            }
            if is_protected(&obj.labels) {
                protection_violations.push(ProtectionViolation {
                    action: "delete".to_string(),
                    resource_ref: r.clone(),
                });
                continue;
            }
            changes.push(PlannedChange {
                id: format!("{}:{}", kind, r),
                action: Action::Delete,
                resource_type: *kind,
                resource_ref: r.clone(),
                resource_id: Some(obj.id.clone()),
                parent_ref: None,
                fields: serde_json::Map::new(),
                depends_on: Vec::new(),
                protection: None,
                post_resolution_targets: Vec::new(),
                tool: None,
            });
        }
        Ok(())
    }
}

fn summarize(changes: &[PlannedChange]) -> PlanSummary {
    let mut summary = PlanSummary::default();
    for c in changes {
        match c.action {
            Action::Create => summary.create += 1,
            Action::Update => summary.update += 1,
            Action::Delete => summary.delete += 1,
            Action::Noop => summary.noop += 1,
            Action::ExternalTool => summary.external_tool += 1,
        }
    }
    summary
}

pub fn internal_bug<S: Into<String>>(msg: S) -> failure::Error {
    execution(format!("internal planner invariant violated: {}", msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::memory::MemoryStateClient;
    use kongctl_definitions::{KongctlMeta, Portal};

    #[test]
    fn plans_a_create_for_a_new_portal() {
        let mut set = ResourceSet::default();
        set.portals.push(Portal {
            ref_: "p1".into(),
            name: "Main".into(),
            kongctl: Some(KongctlMeta::default()),
            ..Default::default()
        });
        let state = MemoryStateClient::new();
        let planner = Planner::new(&state);
        let plan = planner.plan(&set, &PlanOptions::default()).unwrap();
        assert_eq!(plan.summary.create, 1);
        assert_eq!(plan.summary.update, 0);
    }

    #[test]
    fn noop_when_nothing_changed() {
        let mut set = ResourceSet::default();
        set.portals.push(Portal {
            ref_: "p1".into(),
            name: "Main".into(),
            kongctl: Some(KongctlMeta::default()),
            ..Default::default()
        });
        let state = MemoryStateClient::new();
        let planner = Planner::new(&state);
        let first = planner.plan(&set, &PlanOptions::default()).unwrap();
        assert_eq!(first.summary.create, 1);

        let created_fields = first.changes[0].fields.clone();
        let mut labels = std::collections::BTreeMap::new();
        labels.insert("ref".to_string(), "p1".to_string());
        let mut obj_fields = created_fields;
        obj_fields.insert("ref".to_string(), serde_json::Value::String("p1".to_string()));
        state.seed(
            ResourceType::Portal,
            crate::state::RemoteObject {
                id: "konnect-1".to_string(),
                ref_: Some("p1".to_string()),
                labels,
                fields: obj_fields,
            },
        );

        let second = planner.plan(&set, &PlanOptions::default()).unwrap();
        assert_eq!(second.summary.noop, 1);
        assert_eq!(second.summary.create, 0);
    }

    #[test]
    fn create_stamps_ref_and_protected_labels() {
        let mut set = ResourceSet::default();
        set.portals.push(Portal {
            ref_: "p1".into(),
            name: "Main".into(),
            kongctl: Some(KongctlMeta { protected: true, ..KongctlMeta::default() }),
            ..Default::default()
        });
        let state = MemoryStateClient::new();
        let planner = Planner::new(&state);
        let options = PlanOptions { generator: "kongctl".to_string(), ..PlanOptions::default() };
        let plan = planner.plan(&set, &options).unwrap();

        let labels = plan.changes[0].fields.get("labels").and_then(|v| v.as_object()).unwrap();
        assert_eq!(labels.get("ref").unwrap(), "p1");
        assert_eq!(labels.get("managed-by").unwrap(), "kongctl");
        assert_eq!(labels.get("protected").unwrap(), "true");
    }

    #[test]
    fn external_gateway_service_is_never_planned_as_its_own_change() {
        use kongctl_definitions::{ControlPlane, DeckConfig, ExternalBlock, GatewayService, Selector};

        let mut set = ResourceSet::default();
        set.control_planes.push(ControlPlane {
            ref_: "cp1".into(),
            name: "Prod".into(),
            deck: Some(DeckConfig { files: vec!["services.yaml".into()], requires: None }),
            ..Default::default()
        });
        let mut match_fields = std::collections::BTreeMap::new();
        match_fields.insert("name".to_string(), "orders".to_string());
        set.gateway_services.push(GatewayService {
            ref_: "svc1".into(),
            parent_ref: "cp1".into(),
            external: Some(ExternalBlock { selector: Selector { match_fields } }),
            ..Default::default()
        });

        let state = MemoryStateClient::new();
        let planner = Planner::new(&state);
        let options = PlanOptions { mode: PlanMode::Apply, generator: "kongctl".to_string(), deck_binary: "deck".to_string() };
        let plan = planner.plan(&set, &options).unwrap();

        assert!(plan.changes.iter().all(|c| c.resource_ref != "svc1"));
        let deck_change = plan.changes.iter().find(|c| c.id == "deck:cp1").unwrap();
        assert_eq!(deck_change.post_resolution_targets[0].resource_ref, "svc1");
    }

    #[test]
    fn a_change_referencing_an_external_service_depends_on_its_deck_step() {
        use kongctl_definitions::{Api, ApiImplementation, ControlPlane, DeckConfig, ExternalBlock, GatewayService, Selector};

        let mut set = ResourceSet::default();
        set.control_planes.push(ControlPlane {
            ref_: "cp1".into(),
            name: "Prod".into(),
            deck: Some(DeckConfig { files: vec!["services.yaml".into()], requires: None }),
            ..Default::default()
        });
        let mut match_fields = std::collections::BTreeMap::new();
        match_fields.insert("name".to_string(), "orders".to_string());
        set.gateway_services.push(GatewayService {
            ref_: "svc1".into(),
            parent_ref: "cp1".into(),
            external: Some(ExternalBlock { selector: Selector { match_fields } }),
            ..Default::default()
        });
        set.apis.push(Api { ref_: "orders".into(), name: "Orders".into(), ..Default::default() });
        set.api_implementations.push(ApiImplementation {
            ref_: "orders-impl".into(),
            parent_ref: "orders".into(),
            control_plane_id: "cp1".into(),
            service_id: "__REF__:svc1#id".into(),
        });

        let state = MemoryStateClient::new();
        let planner = Planner::new(&state);
        let options = PlanOptions { mode: PlanMode::Apply, generator: "kongctl".to_string(), deck_binary: "deck".to_string() };
        let plan = planner.plan(&set, &options).unwrap();

        let impl_change = plan.changes.iter().find(|c| c.resource_ref == "orders-impl").unwrap();
        assert!(impl_change.depends_on.contains(&"deck:cp1".to_string()));
    }
}
