//! Resource model & registry (component B).
//!
//! Every loadable resource kind is a concrete struct implementing
//! [`Resource`]. There is no runtime reflection: each type hand-writes its
//! own `placeholder_fields_mut` visitor, in the same explicit-accessor
//! style as `Manifest::get_env_vars` in the teacher codebase.

mod api;
mod app_auth_strategy;
mod control_plane;
mod gateway_service;
mod organization;
mod portal;

pub use api::*;
pub use app_auth_strategy::*;
pub use control_plane::*;
pub use gateway_service::*;
pub use organization::*;
pub use portal::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{validation, Result};

/// The closed enum of resource kinds (§3.3).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Portal,
    PortalCustomization,
    PortalAuthSettings,
    PortalCustomDomain,
    PortalPage,
    PortalSnippet,
    PortalTeam,
    PortalTeamRole,
    PortalEmailConfig,
    PortalEmailTemplate,
    Api,
    ApiVersion,
    ApiPublication,
    ApiImplementation,
    ApiDocument,
    ControlPlane,
    GatewayService,
    ApplicationAuthStrategy,
    OrganizationTeam,
    /// Pseudo-type marking an external-tool step in a `Plan`.
    Deck,
}

impl ResourceType {
    /// Stable priority used for plan tie-break ordering (§4.G.7): parents
    /// before children, leaves last.
    pub fn kind_priority(self) -> u8 {
        use ResourceType::*;
        match self {
            ApplicationAuthStrategy => 0,
            ControlPlane => 1,
            GatewayService => 2,
            Portal => 3,
            PortalCustomization => 4,
            PortalAuthSettings => 4,
            PortalCustomDomain => 4,
            PortalEmailConfig => 4,
            PortalEmailTemplate => 5,
            PortalSnippet => 5,
            PortalPage => 5,
            PortalTeam => 5,
            PortalTeamRole => 6,
            Api => 7,
            ApiVersion => 8,
            ApiPublication => 8,
            ApiImplementation => 8,
            ApiDocument => 9,
            OrganizationTeam => 3,
            Deck => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        use ResourceType::*;
        match self {
            Portal => "portal",
            PortalCustomization => "portal_customization",
            PortalAuthSettings => "portal_auth_settings",
            PortalCustomDomain => "portal_custom_domain",
            PortalPage => "portal_page",
            PortalSnippet => "portal_snippet",
            PortalTeam => "portal_team",
            PortalTeamRole => "portal_team_role",
            PortalEmailConfig => "portal_email_config",
            PortalEmailTemplate => "portal_email_template",
            Api => "api",
            ApiVersion => "api_version",
            ApiPublication => "api_publication",
            ApiImplementation => "api_implementation",
            ApiDocument => "api_document",
            ControlPlane => "control_plane",
            GatewayService => "gateway_service",
            ApplicationAuthStrategy => "application_auth_strategy",
            OrganizationTeam => "organization_team",
            Deck => "deck",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a parent resource's `namespace` value came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceOrigin {
    Explicit,
    FileDefault,
    ImplicitDefault,
}

/// Metadata carried by every managed (non-`external`) parent resource.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct KongctlMeta {
    #[serde(default = "default_namespace_value")]
    pub namespace: String,
    #[serde(default = "default_namespace_origin", skip_serializing)]
    pub namespace_origin: NamespaceOrigin,
    #[serde(default)]
    pub protected: bool,
}

fn default_namespace_value() -> String {
    "default".to_string()
}

fn default_namespace_origin() -> NamespaceOrigin {
    NamespaceOrigin::ImplicitDefault
}

impl Default for KongctlMeta {
    fn default() -> Self {
        KongctlMeta {
            namespace: default_namespace_value(),
            namespace_origin: default_namespace_origin(),
            protected: false,
        }
    }
}

/// Selector used by `external` resources to match live objects.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Selector {
    #[serde(rename = "matchFields", default)]
    pub match_fields: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExternalBlock {
    pub selector: Selector,
}

/// Common behaviour every resource kind implements. There is deliberately
/// no blanket impl: each struct hand-writes these so the compiler checks
/// that every field that can legally carry a `!ref` placeholder is wired
/// into `placeholder_fields_mut`.
pub trait Resource {
    fn get_ref(&self) -> &str;
    fn kind(&self) -> ResourceType;
    fn kongctl(&self) -> Option<&KongctlMeta>;
    fn kongctl_mut(&mut self) -> Option<&mut KongctlMeta>;
    fn external(&self) -> Option<&ExternalBlock> {
        None
    }
    fn parent_ref(&self) -> Option<&str> {
        None
    }
    fn set_defaults(&mut self) {}
    fn validate(&self) -> Result<()>;

    /// Static metadata: field path -> expected referent type, used by the
    /// validator (§4.E) together with the resolver's `ResolvedRef` log.
    fn reference_field_mappings(&self) -> &'static [(&'static str, ResourceType)] {
        &[]
    }

    /// Mutable access to every string field that may hold a `__REF__:`
    /// placeholder, keyed by the same field path used in
    /// `reference_field_mappings`. This is the hand-generated stand-in for
    /// reflection (§9 Design Notes, option (a)).
    fn placeholder_fields_mut(&mut self) -> Vec<(&'static str, &mut String)> {
        Vec::new()
    }

    /// Lookup used to satisfy `!ref <ref>#<field>` when this resource is
    /// the referent: the Rust stand-in for "reflection" field extraction.
    fn field_by_name(&self, _field: &str) -> Option<String> {
        None
    }
}

/// A resource that is `external: {selector: ...}` carries no kongctl
/// metadata (invariant 4). Helper used by loader/validator.
pub fn assert_external_exclusivity(kongctl: &Option<KongctlMeta>, external: &Option<ExternalBlock>, kind: ResourceType, r: &str) -> Result<()> {
    if external.is_some() && kongctl.is_some() {
        return Err(validation(format!(
            "{} '{}' cannot set both 'external' and 'kongctl' metadata",
            kind, r
        )));
    }
    Ok(())
}
