use serde::{Deserialize, Serialize};

use super::{KongctlMeta, Resource, ResourceType};
use crate::error::{validation, Result};

/// A single `deck` invocation described by `requires.deck`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct DeckRequireStep {
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct DeckRequires {
    #[serde(default)]
    pub deck: Vec<DeckRequireStep>,
}

/// `control_plane.deck` block: either a plain list of state files, or the
/// richer `requires.deck` step list (§9 Open Question: "pick the variant
/// consistent with ... `requires.deck` step arrays" — both are kept since
/// real manifests in the wild use either shorthand).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct DeckConfig {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub requires: Option<DeckRequires>,
}

impl DeckConfig {
    /// Normalizes both shorthands into a flat list of argv tails (the
    /// positional file/flag arguments after `gateway {mode}`).
    pub fn steps(&self) -> Vec<Vec<String>> {
        let mut steps = Vec::new();
        if !self.files.is_empty() {
            steps.push(self.files.clone());
        }
        if let Some(req) = &self.requires {
            for step in &req.deck {
                steps.push(step.args.clone());
            }
        }
        steps
    }
}

/// `control_plane` — owns gateway services and a deck sync configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ControlPlane {
    #[serde(rename = "ref")]
    pub ref_: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    pub deck: Option<DeckConfig>,
    /// Nested on input; extracted to root-level `GatewayService` resources
    /// by the loader (§3.2) and cleared here afterwards.
    #[serde(default, rename = "gateway_services")]
    pub gateway_services: Vec<super::GatewayServiceInput>,
    #[serde(default)]
    pub kongctl: Option<KongctlMeta>,
}

impl Resource for ControlPlane {
    fn get_ref(&self) -> &str {
        &self.ref_
    }

    fn kind(&self) -> ResourceType {
        ResourceType::ControlPlane
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
            return Err(validation(format!("control_plane '{}' is missing 'name'", self.ref_)));
        }
        Ok(())
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
