use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{KongctlMeta, Resource, ResourceType};
use crate::error::{validation, Result};

/// `application_auth_strategy` — a leaf resource with no children.
///
/// ```yaml
/// application_auth_strategies:
/// - ref: default-key-auth
///   name: default-key-auth
///   strategy_type: key_auth
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ApplicationAuthStrategy {
    #[serde(rename = "ref")]
    pub ref_: String,
    pub name: String,
    #[serde(rename = "strategy_type")]
    pub strategy_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configs: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub kongctl: Option<KongctlMeta>,
}

impl Resource for ApplicationAuthStrategy {
    fn get_ref(&self) -> &str {
        &self.ref_
    }

    fn kind(&self) -> ResourceType {
        ResourceType::ApplicationAuthStrategy
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
            return Err(validation(format!(
                "application_auth_strategy '{}' is missing 'name'",
                self.ref_
            )));
        }
        if self.strategy_type.is_empty() {
            return Err(validation(format!(
                "application_auth_strategy '{}' is missing 'strategy_type'",
                self.ref_
            )));
        }
        const KNOWN: &[&str] = &["key_auth", "openid_connect", "basic_auth"];
        if !KNOWN.contains(&self.strategy_type.as_str()) {
            return Err(validation(format!(
                "application_auth_strategy '{}' has unsupported strategy_type '{}'",
                self.ref_, self.strategy_type
            )));
        }
        Ok(())
    }

    fn field_by_name(&self, field: &str) -> Option<String> {
        match field {
            "id" => None, // server-assigned; deferred to plan time
            "ref" => Some(self.ref_.clone()),
            "name" => Some(self.name.clone()),
            "strategy_type" => Some(self.strategy_type.clone()),
            _ => None,
        }
    }
}
