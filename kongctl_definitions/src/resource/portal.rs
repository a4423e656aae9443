use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{KongctlMeta, Resource, ResourceType};
use crate::error::{validation, Result};

// ---------------------------------------------------------------------
// Nested input shapes (pre-extraction)
// ---------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PortalCustomizationInput {
    #[serde(default)]
    pub css: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PortalAuthSettingsInput {
    #[serde(default)]
    pub basic_auth_enabled: bool,
    #[serde(default)]
    pub oidc_enabled: bool,
    #[serde(default)]
    pub default_application_auth_strategy_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PortalCustomDomainInput {
    pub hostname: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PortalPageInput {
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub children: Vec<PortalPageInput>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PortalSnippetInput {
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    pub name: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub visible: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PortalTeamRoleInput {
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    pub role: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PortalTeamInput {
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<PortalTeamRoleInput>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PortalEmailConfigInput {
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default)]
    pub reply_to_address: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PortalEmailTemplateInput {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PortalInput {
    #[serde(rename = "ref")]
    pub ref_: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub default_application_auth_strategy_id: Option<String>,
    #[serde(default)]
    pub customization: Option<PortalCustomizationInput>,
    #[serde(default)]
    pub auth_settings: Option<PortalAuthSettingsInput>,
    #[serde(default)]
    pub custom_domain: Option<PortalCustomDomainInput>,
    #[serde(default)]
    pub pages: Vec<PortalPageInput>,
    #[serde(default)]
    pub snippets: Vec<PortalSnippetInput>,
    #[serde(default)]
    pub teams: Vec<PortalTeamInput>,
    #[serde(default)]
    pub email_config: Option<PortalEmailConfigInput>,
    #[serde(default)]
    pub email_templates: BTreeMap<String, PortalEmailTemplateInput>,
    #[serde(default)]
    pub kongctl: Option<KongctlMeta>,
}

// ---------------------------------------------------------------------
// Root-level resources (post-extraction)
// ---------------------------------------------------------------------

/// `portal` — a parent resource; all of its optional child blocks are
/// extracted to root-level resources by the loader (§3.2) and this struct
/// is left holding only its own scalar fields.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Portal {
    pub ref_: String,
    pub name: String,
    pub description: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub default_application_auth_strategy_id: Option<String>,
    pub kongctl: Option<KongctlMeta>,
}

impl Resource for Portal {
    fn get_ref(&self) -> &str {
        &self.ref_
    }
    fn kind(&self) -> ResourceType {
        ResourceType::Portal
    }
    fn kongctl(&self) -> Option<&KongctlMeta> {
        self.kongctl.as_ref()
    }
    fn kongctl_mut(&mut self) -> Option<&mut KongctlMeta> {
        self.kongctl.as_mut()
    }
    fn set_defaults(&mut self) {
        if self.kongctl.is_none() {
            self.kongctl = Some(KongctlMeta::default());
        }
    }
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(validation(format!("portal '{}' is missing 'name'", self.ref_)));
        }
        Ok(())
    }
    fn reference_field_mappings(&self) -> &'static [(&'static str, ResourceType)] {
        &[(
            "default_application_auth_strategy_id",
            ResourceType::ApplicationAuthStrategy,
        )]
    }
    fn placeholder_fields_mut(&mut self) -> Vec<(&'static str, &mut String)> {
        match &mut self.default_application_auth_strategy_id {
            Some(v) => vec![("default_application_auth_strategy_id", v)],
            None => Vec::new(),
        }
    }
    fn field_by_name(&self, field: &str) -> Option<String> {
        match field {
            "ref" => Some(self.ref_.clone()),
            "name" => Some(self.name.clone()),
            "description" => self.description.clone(),
            _ => None,
        }
    }
}

macro_rules! simple_child_resource {
    ($name:ident, $kind:expr) => {
        impl Resource for $name {
            fn get_ref(&self) -> &str {
                &self.ref_
            }
            fn kind(&self) -> ResourceType {
                $kind
            }
            fn kongctl(&self) -> Option<&KongctlMeta> {
                None
            }
            fn kongctl_mut(&mut self) -> Option<&mut KongctlMeta> {
                None
            }
            fn parent_ref(&self) -> Option<&str> {
                Some(&self.parent_ref)
            }
            fn validate(&self) -> Result<()> {
                Ok(())
            }
            fn field_by_name(&self, field: &str) -> Option<String> {
                if field == "ref" {
                    Some(self.ref_.clone())
                } else {
                    None
                }
            }
        }
    };
}

/// `portal_customization` — singleton child, extracted to root.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PortalCustomization {
    pub ref_: String,
    pub parent_ref: String,
    pub css: Option<String>,
    pub logo: Option<String>,
    pub favicon: Option<String>,
}
simple_child_resource!(PortalCustomization, ResourceType::PortalCustomization);

/// `portal_auth_settings` — singleton child, extracted to root.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PortalAuthSettings {
    pub ref_: String,
    pub parent_ref: String,
    pub basic_auth_enabled: bool,
    pub oidc_enabled: bool,
    pub default_application_auth_strategy_id: Option<String>,
}

impl Resource for PortalAuthSettings {
    fn get_ref(&self) -> &str {
        &self.ref_
    }
    fn kind(&self) -> ResourceType {
        ResourceType::PortalAuthSettings
    }
    fn kongctl(&self) -> Option<&KongctlMeta> {
        None
    }
    fn kongctl_mut(&mut self) -> Option<&mut KongctlMeta> {
        None
    }
    fn parent_ref(&self) -> Option<&str> {
        Some(&self.parent_ref)
    }
    fn validate(&self) -> Result<()> {
        Ok(())
    }
    fn reference_field_mappings(&self) -> &'static [(&'static str, ResourceType)] {
        &[(
            "default_application_auth_strategy_id",
            ResourceType::ApplicationAuthStrategy,
        )]
    }
    fn placeholder_fields_mut(&mut self) -> Vec<(&'static str, &mut String)> {
        match &mut self.default_application_auth_strategy_id {
            Some(v) => vec![("default_application_auth_strategy_id", v)],
            None => Vec::new(),
        }
    }
    fn field_by_name(&self, field: &str) -> Option<String> {
        if field == "ref" {
            Some(self.ref_.clone())
        } else {
            None
        }
    }
}

/// `portal_custom_domain` — singleton child, extracted to root.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PortalCustomDomain {
    pub ref_: String,
    pub parent_ref: String,
    pub hostname: String,
    pub enabled: bool,
}
simple_child_resource!(PortalCustomDomain, ResourceType::PortalCustomDomain);

/// `portal_page` — recursive tree; each level carries `parent_page_ref`
/// in addition to `parent_ref` (the owning portal).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PortalPage {
    pub ref_: String,
    pub parent_ref: String,
    pub parent_page_ref: Option<String>,
    pub slug: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub visibility: Option<String>,
}
simple_child_resource!(PortalPage, ResourceType::PortalPage);

/// `portal_snippet` — extracted to root.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PortalSnippet {
    pub ref_: String,
    pub parent_ref: String,
    pub name: String,
    pub content: Option<String>,
    pub visible: bool,
}
simple_child_resource!(PortalSnippet, ResourceType::PortalSnippet);

/// `portal_team` — extracted to root; owns `portal_team_role` children.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PortalTeam {
    pub ref_: String,
    pub parent_ref: String,
    pub name: String,
}
simple_child_resource!(PortalTeam, ResourceType::PortalTeam);

/// `portal_team_role` — extracted from `portal.teams[].roles[]`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PortalTeamRole {
    pub ref_: String,
    pub parent_ref: String,
    pub role: String,
}
simple_child_resource!(PortalTeamRole, ResourceType::PortalTeamRole);

/// `portal_email_config` — singleton child, extracted to root.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PortalEmailConfig {
    pub ref_: String,
    pub parent_ref: String,
    pub from_name: Option<String>,
    pub from_address: Option<String>,
    pub reply_to_address: Option<String>,
}
simple_child_resource!(PortalEmailConfig, ResourceType::PortalEmailConfig);

/// `portal_email_template` — one per key in `portal.email_templates`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PortalEmailTemplate {
    pub ref_: String,
    pub parent_ref: String,
    pub template_name: String,
    pub subject: Option<String>,
    pub body: Option<String>,
}
simple_child_resource!(PortalEmailTemplate, ResourceType::PortalEmailTemplate);
