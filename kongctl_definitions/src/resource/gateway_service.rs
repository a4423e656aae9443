use serde::{Deserialize, Serialize};

use super::{ExternalBlock, KongctlMeta, Resource, ResourceType};
use crate::error::{validation, Result};

/// Nested shape of `control_plane.gateway_services[]` before extraction.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GatewayServiceInput {
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub external: Option<ExternalBlock>,
    #[serde(default)]
    pub kongctl: Option<KongctlMeta>,
}

/// `gateway_service` — child of `control_plane`, flattened to root on load.
///
/// May be `external` (matched by selector against a service that a `deck`
/// step creates; see post-resolution targets in §4.G.5) instead of
/// directly managed.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GatewayService {
    #[serde(rename = "ref")]
    pub ref_: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub parent_ref: String,
    #[serde(default)]
    pub external: Option<ExternalBlock>,
    #[serde(default)]
    pub kongctl: Option<KongctlMeta>,
}

impl Resource for GatewayService {
    fn get_ref(&self) -> &str {
        &self.ref_
    }

    fn kind(&self) -> ResourceType {
        ResourceType::GatewayService
    }

    fn kongctl(&self) -> Option<&KongctlMeta> {
        self.kongctl.as_ref()
    }

    fn kongctl_mut(&mut self) -> Option<&mut KongctlMeta> {
        self.kongctl.as_mut()
    }

    fn external(&self) -> Option<&ExternalBlock> {
        self.external.as_ref()
    }

    fn parent_ref(&self) -> Option<&str> {
        Some(&self.parent_ref)
    }

    fn set_defaults(&mut self) {
        if self.external.is_none() && self.kongctl.is_none() {
            self.kongctl = Some(KongctlMeta::default());
        }
    }

    fn validate(&self) -> Result<()> {
        super::assert_external_exclusivity(&self.kongctl, &self.external, self.kind(), &self.ref_)?;
        if self.external.is_none() && self.name.is_none() {
            return Err(validation(format!("gateway_service '{}' is missing 'name'", self.ref_)));
        }
        if self.parent_ref.is_empty() {
            return Err(validation(format!(
                "gateway_service '{}' is missing its parent control_plane",
                self.ref_
            )));
        }
        Ok(())
    }

    fn field_by_name(&self, field: &str) -> Option<String> {
        match field {
            "ref" => Some(self.ref_.clone()),
            "name" => self.name.clone(),
            "url" => self.url.clone(),
            _ => None,
        }
    }
}
