use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{KongctlMeta, Resource, ResourceType};
use crate::error::{validation, Result};

// ---------------------------------------------------------------------
// Nested input shapes (pre-extraction)
// ---------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ApiVersionInput {
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    pub version: String,
    #[serde(default)]
    pub spec: Option<serde_yaml::Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ApiPublicationInput {
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    pub portal_id: String,
    #[serde(default)]
    pub visibility: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ImplementationService {
    pub control_plane_id: String,
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ApiImplementationInput {
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    pub service: ImplementationService,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ApiDocumentInput {
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub documents: Vec<ApiDocumentInput>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ApiInput {
    #[serde(rename = "ref")]
    pub ref_: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub versions: Vec<ApiVersionInput>,
    #[serde(default)]
    pub publications: Vec<ApiPublicationInput>,
    #[serde(default)]
    pub implementations: Vec<ApiImplementationInput>,
    #[serde(default)]
    pub documents: Vec<ApiDocumentInput>,
    #[serde(default)]
    pub kongctl: Option<KongctlMeta>,
}

// ---------------------------------------------------------------------
// Root-level resources (post-extraction)
// ---------------------------------------------------------------------

/// `api` — a parent resource owning versions, publications,
/// implementations and a document tree.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Api {
    pub ref_: String,
    pub name: String,
    pub description: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub kongctl: Option<KongctlMeta>,
}

impl Resource for Api {
    fn get_ref(&self) -> &str {
        &self.ref_
    }
    fn kind(&self) -> ResourceType {
        ResourceType::Api
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
            return Err(validation(format!("api '{}' is missing 'name'", self.ref_)));
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

/// `api_version` — child of `api`; at most one per API (§4.E).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ApiVersion {
    pub ref_: String,
    pub parent_ref: String,
    pub version: String,
    pub spec: Option<serde_yaml::Value>,
}

impl Resource for ApiVersion {
    fn get_ref(&self) -> &str {
        &self.ref_
    }
    fn kind(&self) -> ResourceType {
        ResourceType::ApiVersion
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
        if self.version.is_empty() {
            return Err(validation(format!("api_version '{}' is missing 'version'", self.ref_)));
        }
        Ok(())
    }
    fn field_by_name(&self, field: &str) -> Option<String> {
        match field {
            "ref" => Some(self.ref_.clone()),
            "version" => Some(self.version.clone()),
            _ => None,
        }
    }
}

/// `api_publication` — child of `api`; references a `portal`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ApiPublication {
    pub ref_: String,
    pub parent_ref: String,
    pub portal_id: String,
    pub visibility: Option<String>,
}

impl Resource for ApiPublication {
    fn get_ref(&self) -> &str {
        &self.ref_
    }
    fn kind(&self) -> ResourceType {
        ResourceType::ApiPublication
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
        if self.portal_id.is_empty() {
            return Err(validation(format!(
                "api_publication '{}' is missing 'portal_id'",
                self.ref_
            )));
        }
        Ok(())
    }
    fn reference_field_mappings(&self) -> &'static [(&'static str, ResourceType)] {
        &[("portal_id", ResourceType::Portal)]
    }
    fn placeholder_fields_mut(&mut self) -> Vec<(&'static str, &mut String)> {
        vec![("portal_id", &mut self.portal_id)]
    }
    fn field_by_name(&self, field: &str) -> Option<String> {
        match field {
            "ref" => Some(self.ref_.clone()),
            _ => None,
        }
    }
}

/// `api_implementation` — child of `api`; references a `control_plane`
/// and a `gateway_service`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ApiImplementation {
    pub ref_: String,
    pub parent_ref: String,
    pub control_plane_id: String,
    pub service_id: String,
}

impl Resource for ApiImplementation {
    fn get_ref(&self) -> &str {
        &self.ref_
    }
    fn kind(&self) -> ResourceType {
        ResourceType::ApiImplementation
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
        if self.control_plane_id.is_empty() {
            return Err(validation(format!(
                "api_implementation '{}' is missing 'service.control_plane_id'",
                self.ref_
            )));
        }
        if self.service_id.is_empty() {
            return Err(validation(format!(
                "api_implementation '{}' is missing 'service.id'",
                self.ref_
            )));
        }
        Ok(())
    }
    fn reference_field_mappings(&self) -> &'static [(&'static str, ResourceType)] {
        &[
            ("service.control_plane_id", ResourceType::ControlPlane),
            ("service.id", ResourceType::GatewayService),
        ]
    }
    fn placeholder_fields_mut(&mut self) -> Vec<(&'static str, &mut String)> {
        vec![
            ("service.control_plane_id", &mut self.control_plane_id),
            ("service.id", &mut self.service_id),
        ]
    }
    fn field_by_name(&self, field: &str) -> Option<String> {
        match field {
            "ref" => Some(self.ref_.clone()),
            _ => None,
        }
    }
}

/// `api_document` — child of `api`; may recurse via `parent_document_ref`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ApiDocument {
    pub ref_: String,
    pub parent_ref: String,
    pub parent_document_ref: Option<String>,
    pub title: String,
    pub content: Option<String>,
    pub slug: Option<String>,
}

impl Resource for ApiDocument {
    fn get_ref(&self) -> &str {
        &self.ref_
    }
    fn kind(&self) -> ResourceType {
        ResourceType::ApiDocument
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
        if self.title.is_empty() {
            return Err(validation(format!("api_document '{}' is missing 'title'", self.ref_)));
        }
        Ok(())
    }
    fn field_by_name(&self, field: &str) -> Option<String> {
        match field {
            "ref" => Some(self.ref_.clone()),
            "title" => Some(self.title.clone()),
            _ => None,
        }
    }
}
