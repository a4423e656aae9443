//! The root container for a load: `ResourceSet` (component B).

use std::collections::HashMap;

use crate::resource::*;

/// Every successful or deferred `!ref` substitution performed by the
/// reference resolver (§4.D), kept so the validator (§4.E) can still check
/// cross-resource types after the placeholder string itself has been
/// overwritten.
#[derive(Debug, Clone)]
pub struct ResolvedRef {
    pub source_ref: String,
    pub field_path: &'static str,
    pub target_ref: String,
    pub target_type: ResourceType,
    pub deferred: bool,
}

/// All resources loaded from one or more YAML sources (§3, §4.B).
#[derive(Default, Clone)]
pub struct ResourceSet {
    pub portals: Vec<Portal>,
    pub portal_customizations: Vec<PortalCustomization>,
    pub portal_auth_settings: Vec<PortalAuthSettings>,
    pub portal_custom_domains: Vec<PortalCustomDomain>,
    pub portal_pages: Vec<PortalPage>,
    pub portal_snippets: Vec<PortalSnippet>,
    pub portal_teams: Vec<PortalTeam>,
    pub portal_team_roles: Vec<PortalTeamRole>,
    pub portal_email_configs: Vec<PortalEmailConfig>,
    pub portal_email_templates: Vec<PortalEmailTemplate>,

    pub apis: Vec<Api>,
    pub api_versions: Vec<ApiVersion>,
    pub api_publications: Vec<ApiPublication>,
    pub api_implementations: Vec<ApiImplementation>,
    pub api_documents: Vec<ApiDocument>,

    pub control_planes: Vec<ControlPlane>,
    pub gateway_services: Vec<GatewayService>,
    pub application_auth_strategies: Vec<ApplicationAuthStrategy>,
    pub organization_teams: Vec<OrganizationTeam>,

    /// Set when a source file contains only `_defaults.kongctl.namespace`
    /// with no resources (§4.C.6 / round-trip law in §8).
    pub default_namespace: Option<String>,

    /// Populated by the reference resolver (§4.D); consumed by the
    /// validator (§4.E) and the planner.
    pub resolved_refs: Vec<ResolvedRef>,
}

/// Expands to implementations of the read-only, generic-over-all-kinds
/// registry operations. Written as a macro rather than `Vec<Box<dyn
/// Resource>>` storage so planner/loader code keeps typed access to each
/// vec (e.g. `ControlPlane::deck`) while still getting a uniform
/// `&dyn Resource` view when one is needed.
macro_rules! for_all_resources {
    ($self:expr, $f:expr) => {{
        for r in &$self.portals {
            $f(r as &dyn Resource);
        }
        for r in &$self.portal_customizations {
            $f(r as &dyn Resource);
        }
        for r in &$self.portal_auth_settings {
            $f(r as &dyn Resource);
        }
        for r in &$self.portal_custom_domains {
            $f(r as &dyn Resource);
        }
        for r in &$self.portal_pages {
            $f(r as &dyn Resource);
        }
        for r in &$self.portal_snippets {
            $f(r as &dyn Resource);
        }
        for r in &$self.portal_teams {
            $f(r as &dyn Resource);
        }
        for r in &$self.portal_team_roles {
            $f(r as &dyn Resource);
        }
        for r in &$self.portal_email_configs {
            $f(r as &dyn Resource);
        }
        for r in &$self.portal_email_templates {
            $f(r as &dyn Resource);
        }
        for r in &$self.apis {
            $f(r as &dyn Resource);
        }
        for r in &$self.api_versions {
            $f(r as &dyn Resource);
        }
        for r in &$self.api_publications {
            $f(r as &dyn Resource);
        }
        for r in &$self.api_implementations {
            $f(r as &dyn Resource);
        }
        for r in &$self.api_documents {
            $f(r as &dyn Resource);
        }
        for r in &$self.control_planes {
            $f(r as &dyn Resource);
        }
        for r in &$self.gateway_services {
            $f(r as &dyn Resource);
        }
        for r in &$self.application_auth_strategies {
            $f(r as &dyn Resource);
        }
        for r in &$self.organization_teams {
            $f(r as &dyn Resource);
        }
    }};
}

macro_rules! for_all_resources_mut {
    ($self:expr, $f:expr) => {{
        for r in &mut $self.portals {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.portal_customizations {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.portal_auth_settings {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.portal_custom_domains {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.portal_pages {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.portal_snippets {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.portal_teams {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.portal_team_roles {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.portal_email_configs {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.portal_email_templates {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.apis {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.api_versions {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.api_publications {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.api_implementations {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.api_documents {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.control_planes {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.gateway_services {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.application_auth_strategies {
            $f(r as &mut dyn Resource);
        }
        for r in &mut $self.organization_teams {
            $f(r as &mut dyn Resource);
        }
    }};
}

impl ResourceSet {
    pub fn get_resource_by_ref(&self, r: &str) -> Option<&dyn Resource> {
        let mut found = None;
        for_all_resources!(self, |res: &dyn Resource| {
            if found.is_none() && res.get_ref() == r {
                found = Some(res);
            }
        });
        found
    }

    pub fn has_ref(&self, r: &str) -> bool {
        self.get_resource_by_ref(r).is_some()
    }

    pub fn get_resource_type_by_ref(&self, r: &str) -> Option<ResourceType> {
        self.get_resource_by_ref(r).map(|res| res.kind())
    }

    pub fn for_each_resource<F: FnMut(&dyn Resource)>(&self, mut f: F) {
        for_all_resources!(self, |res: &dyn Resource| f(res));
    }

    pub fn for_each_resource_mut<F: FnMut(&mut dyn Resource)>(&mut self, mut f: F) {
        for_all_resources_mut!(self, |res: &mut dyn Resource| f(res));
    }

    /// Builds a `ref -> type` index, used by the loader for O(1) duplicate
    /// detection across sources (§4.C).
    pub fn ref_index(&self) -> HashMap<String, ResourceType> {
        let mut idx = HashMap::new();
        self.for_each_resource(|res| {
            idx.insert(res.get_ref().to_string(), res.kind());
        });
        idx
    }

    /// Merges `other` into `self`. Callers (the loader) are responsible
    /// for duplicate-ref detection *before* calling this, since the merge
    /// itself is infallible.
    pub fn append_all(&mut self, mut other: ResourceSet) {
        self.portals.append(&mut other.portals);
        self.portal_customizations.append(&mut other.portal_customizations);
        self.portal_auth_settings.append(&mut other.portal_auth_settings);
        self.portal_custom_domains.append(&mut other.portal_custom_domains);
        self.portal_pages.append(&mut other.portal_pages);
        self.portal_snippets.append(&mut other.portal_snippets);
        self.portal_teams.append(&mut other.portal_teams);
        self.portal_team_roles.append(&mut other.portal_team_roles);
        self.portal_email_configs.append(&mut other.portal_email_configs);
        self.portal_email_templates.append(&mut other.portal_email_templates);
        self.apis.append(&mut other.apis);
        self.api_versions.append(&mut other.api_versions);
        self.api_publications.append(&mut other.api_publications);
        self.api_implementations.append(&mut other.api_implementations);
        self.api_documents.append(&mut other.api_documents);
        self.control_planes.append(&mut other.control_planes);
        self.gateway_services.append(&mut other.gateway_services);
        self.application_auth_strategies.append(&mut other.application_auth_strategies);
        self.organization_teams.append(&mut other.organization_teams);
        self.resolved_refs.append(&mut other.resolved_refs);
        if let Some(ns) = other.default_namespace {
            self.default_namespace = Some(ns);
        }
    }

    pub fn is_empty(&self) -> bool {
        let mut count = 0usize;
        self.for_each_resource(|_| count += 1);
        count == 0
    }
}
