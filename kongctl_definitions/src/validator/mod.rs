//! Validator (component E, §4.E): per-kind schema checks plus
//! registry-level cross-resource checks. Fails fast on the first problem,
//! matching the loader's fail-fast propagation policy (§7) — unlike the
//! planner, which collects every protection violation before returning.

use std::collections::HashMap;

use crate::error::{configuration, validation};
use crate::namespace::validate_namespace;
use crate::registry::ResourceSet;
use crate::resource::ResourceType;
use crate::Result;

#[derive(Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Validator
    }

    pub fn validate(&self, set: &ResourceSet) -> Result<()> {
        self.validate_each_resource(set)?;
        self.validate_ref_uniqueness(set)?;
        self.validate_name_uniqueness(set)?;
        self.validate_parent_refs(set)?;
        self.validate_reference_types(set)?;
        self.validate_namespaces(set)?;
        self.validate_single_version_per_api(set)?;
        Ok(())
    }

    fn validate_each_resource(&self, set: &ResourceSet) -> Result<()> {
        let mut first_error = None;
        set.for_each_resource(|res| {
            if first_error.is_none() {
                if let Err(e) = res.validate() {
                    first_error = Some(e);
                }
            }
        });
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Invariant 1, retained as a safety net even though the loader already
    /// enforces this incrementally while merging sources.
    fn validate_ref_uniqueness(&self, set: &ResourceSet) -> Result<()> {
        let mut seen: HashMap<String, ResourceType> = HashMap::new();
        let mut dup = None;
        set.for_each_resource(|res| {
            if dup.is_some() {
                return;
            }
            let r = res.get_ref().to_string();
            if seen.contains_key(&r) {
                dup = Some(r.clone());
            } else {
                seen.insert(r, res.kind());
            }
        });
        match dup {
            Some(r) => Err(configuration(format!("duplicate ref '{}' found in loaded resource set", r))),
            None => Ok(()),
        }
    }

    fn validate_name_uniqueness(&self, set: &ResourceSet) -> Result<()> {
        // (kind, name) -> first ref seen with that name
        let mut seen: HashMap<(ResourceType, String), String> = HashMap::new();
        let mut dup = None;
        set.for_each_resource(|res| {
            if dup.is_some() {
                return;
            }
            if let Some(name) = res.field_by_name("name") {
                let key = (res.kind(), name.clone());
                if let Some(other_ref) = seen.get(&key) {
                    dup = Some(format!(
                        "duplicate {} name '{}': '{}' and '{}'",
                        res.kind(),
                        name,
                        other_ref,
                        res.get_ref()
                    ));
                } else {
                    seen.insert(key, res.get_ref().to_string());
                }
            }
        });
        match dup {
            Some(msg) => Err(validation(msg)),
            None => Ok(()),
        }
    }

    /// Invariant 2: every child's `parent_ref` resolves to a parent of the
    /// expected type.
    fn validate_parent_refs(&self, set: &ResourceSet) -> Result<()> {
        let mut error = None;
        set.for_each_resource(|res| {
            if error.is_some() {
                return;
            }
            let (Some(parent_ref), Some(expected)) = (res.parent_ref(), expected_parent_type(res.kind())) else {
                return;
            };
            match set.get_resource_type_by_ref(parent_ref) {
                None => {
                    error = Some(validation(format!(
                        "{} '{}' has unknown parent_ref '{}'",
                        res.kind(),
                        res.get_ref(),
                        parent_ref
                    )))
                }
                Some(actual) if actual != expected => {
                    error = Some(validation(format!(
                        "{} '{}' parent_ref '{}' resolves to a {}, expected {}",
                        res.kind(),
                        res.get_ref(),
                        parent_ref,
                        actual,
                        expected
                    )))
                }
                _ => {}
            }
        });
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Invariant 3, backed by the `ResolvedRef` log (§4.D/§9) rather than
    /// re-deriving types from already-overwritten placeholder strings.
    fn validate_reference_types(&self, set: &ResourceSet) -> Result<()> {
        let mut expectations: HashMap<(String, &'static str), ResourceType> = HashMap::new();
        set.for_each_resource(|res| {
            for (field_path, expected) in res.reference_field_mappings().iter().copied() {
                expectations.insert((res.get_ref().to_string(), field_path), expected);
            }
        });

        for resolved in &set.resolved_refs {
            if resolved.deferred {
                continue;
            }
            if let Some(expected) = expectations.get(&(resolved.source_ref.clone(), resolved.field_path)) {
                if *expected != resolved.target_type {
                    return Err(validation(format!(
                        "'{}' field '{}' references '{}', a {}, but expected a {}",
                        resolved.source_ref, resolved.field_path, resolved.target_ref, resolved.target_type, expected
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_namespaces(&self, set: &ResourceSet) -> Result<()> {
        let mut error = None;
        set.for_each_resource(|res| {
            if error.is_some() {
                return;
            }
            if let Some(meta) = res.kongctl() {
                if let Err(e) = validate_namespace(&meta.namespace) {
                    error = Some(e);
                }
            }
        });
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// §9's resolution of the single-version Open Question.
    fn validate_single_version_per_api(&self, set: &ResourceSet) -> Result<()> {
        let mut counts: HashMap<String, u32> = HashMap::new();
        for v in &set.api_versions {
            *counts.entry(v.parent_ref.clone()).or_insert(0) += 1;
        }
        if let Some((api_ref, _)) = counts.into_iter().find(|(_, n)| *n > 1) {
            return Err(validation(format!("api '{}' declares more than one api_version", api_ref)));
        }
        Ok(())
    }
}

fn expected_parent_type(kind: ResourceType) -> Option<ResourceType> {
    use ResourceType::*;
    match kind {
        PortalCustomization | PortalAuthSettings | PortalCustomDomain | PortalPage | PortalSnippet | PortalTeam
        | PortalEmailConfig | PortalEmailTemplate => Some(Portal),
        PortalTeamRole => Some(PortalTeam),
        ApiVersion | ApiPublication | ApiImplementation | ApiDocument => Some(Api),
        GatewayService => Some(ControlPlane),
        Portal | Api | ControlPlane | ApplicationAuthStrategy | OrganizationTeam | Deck => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ControlPlane, GatewayService, KongctlMeta, Portal, PortalPage};

    #[test]
    fn rejects_unknown_parent_ref() {
        let mut set = ResourceSet::default();
        set.portal_pages.push(PortalPage {
            ref_: "page1".into(),
            parent_ref: "missing-portal".into(),
            slug: "home".into(),
            ..Default::default()
        });
        assert!(Validator::new().validate(&set).is_err());
    }

    #[test]
    fn rejects_parent_ref_of_wrong_type() {
        let mut set = ResourceSet::default();
        set.control_planes.push(ControlPlane {
            ref_: "cp1".into(),
            name: "CP".into(),
            kongctl: Some(KongctlMeta::default()),
            ..Default::default()
        });
        set.portal_pages.push(PortalPage {
            ref_: "page1".into(),
            parent_ref: "cp1".into(),
            slug: "home".into(),
            ..Default::default()
        });
        assert!(Validator::new().validate(&set).is_err());
    }

    #[test]
    fn rejects_duplicate_names_within_kind() {
        let mut set = ResourceSet::default();
        set.portals.push(Portal {
            ref_: "p1".into(),
            name: "Shared".into(),
            kongctl: Some(KongctlMeta::default()),
            ..Default::default()
        });
        set.portals.push(Portal {
            ref_: "p2".into(),
            name: "Shared".into(),
            kongctl: Some(KongctlMeta::default()),
            ..Default::default()
        });
        assert!(Validator::new().validate(&set).is_err());
    }

    #[test]
    fn accepts_well_formed_set() {
        let mut set = ResourceSet::default();
        set.control_planes.push(ControlPlane {
            ref_: "cp1".into(),
            name: "CP".into(),
            kongctl: Some(KongctlMeta::default()),
            ..Default::default()
        });
        set.gateway_services.push(GatewayService {
            ref_: "svc1".into(),
            name: Some("svc1".into()),
            parent_ref: "cp1".into(),
            kongctl: Some(KongctlMeta::default()),
            ..Default::default()
        });
        assert!(Validator::new().validate(&set).is_ok());
    }
}
