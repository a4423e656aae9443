use serde::{Deserialize, Serialize};

use super::{KongctlMeta, Resource, ResourceType};
use crate::error::{validation, Result};

/// Nested shape of `organization.teams[]` before extraction.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct OrganizationTeamInput {
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kongctl: Option<KongctlMeta>,
}

/// Top-level `organization` block: a singleton owning `teams`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct OrganizationInput {
    #[serde(default)]
    pub teams: Vec<OrganizationTeamInput>,
}

/// `organization_team` — flattened from `organization.teams[]`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct OrganizationTeam {
    #[serde(rename = "ref")]
    pub ref_: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kongctl: Option<KongctlMeta>,
}

impl Resource for OrganizationTeam {
    fn get_ref(&self) -> &str {
        &self.ref_
    }

    fn kind(&self) -> ResourceType {
        ResourceType::OrganizationTeam
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
            return Err(validation(format!("organization_team '{}' is missing 'name'", self.ref_)));
        }
        Ok(())
    }

    fn field_by_name(&self, field: &str) -> Option<String> {
        match field {
            "ref" => Some(self.ref_.clone()),
            "name" => Some(self.name.clone()),
            _ => None,
        }
    }
}
