//! Reference resolver (component D, §4.D): substitutes `__REF__:<ref>#<field>`
//! placeholders left by the `!ref` tag pass with concrete values read from
//! other resources, following chains of references and detecting cycles.

use crate::error::reference;
use crate::registry::{ResolvedRef, ResourceSet};
use crate::resource::ResourceType;
use crate::tags::parse_placeholder;
use crate::Result;

#[derive(Default)]
pub struct ReferenceResolver;

impl ReferenceResolver {
    pub fn new() -> Self {
        ReferenceResolver
    }

    /// Resolves every placeholder in `set` in place, recording a
    /// [`ResolvedRef`] for each attempt (successful or deferred).
    ///
    /// Lookups are performed against a snapshot taken before any mutation,
    /// so a chain of references (A -> B -> C) resolves correctly without
    /// needing repeated fixed-point passes: every `field_by_name` call
    /// reads the resource graph as it existed right after loading.
    pub fn resolve(&self, set: &mut ResourceSet) -> Result<()> {
        let snapshot = set.clone();
        let mut resolved_refs = Vec::new();
        let mut first_error = None;

        set.for_each_resource_mut(|res| {
            if first_error.is_some() {
                return;
            }
            let source_ref = res.get_ref().to_string();

            for (field_path, slot) in res.placeholder_fields_mut() {
                let Some((target_ref, target_field)) = parse_placeholder(slot) else {
                    continue; // not a placeholder: no-op (§8 boundary law)
                };
                let target_ref = target_ref.to_string();
                let target_field = target_field.to_string();

                match resolve_chain(&snapshot, &target_ref, &target_field, &mut Vec::new()) {
                    Ok((target_type, Some(value))) => {
                        *slot = value;
                        resolved_refs.push(ResolvedRef {
                            source_ref: source_ref.clone(),
                            field_path,
                            target_ref,
                            target_type,
                            deferred: false,
                        });
                    }
                    Ok((target_type, None)) => {
                        resolved_refs.push(ResolvedRef {
                            source_ref: source_ref.clone(),
                            field_path,
                            target_ref,
                            target_type,
                            deferred: true,
                        });
                    }
                    Err(e) => {
                        first_error = Some(e);
                        return;
                    }
                }
            }
        });

        if let Some(e) = first_error {
            return Err(e);
        }
        set.resolved_refs = resolved_refs;
        Ok(())
    }
}

/// Follows a `#[field]` lookup on `target_ref`, recursing through any
/// further placeholder the referent's own field holds. `visited` guards
/// against cycles: a repeated `(ref, field)` pair is a cycle (§4.D).
fn resolve_chain(
    snapshot: &ResourceSet,
    target_ref: &str,
    target_field: &str,
    visited: &mut Vec<(String, String)>,
) -> Result<(ResourceType, Option<String>)> {
    let triple = (target_ref.to_string(), target_field.to_string());
    if visited.contains(&triple) {
        return Err(reference(format!(
            "circular reference detected resolving '{}#{}'",
            target_ref, target_field
        )));
    }
    visited.push(triple);

    let referent = snapshot
        .get_resource_by_ref(target_ref)
        .ok_or_else(|| reference(format!("dangling reference: no resource with ref '{}'", target_ref)))?;
    let target_type = referent.kind();

    match referent.field_by_name(target_field) {
        None => Ok((target_type, None)),
        Some(value) => match parse_placeholder(&value) {
            Some((next_ref, next_field)) => {
                let (_, resolved) = resolve_chain(snapshot, next_ref, next_field, visited)?;
                Ok((target_type, resolved))
            }
            None => Ok((target_type, Some(value))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ApiPublication, KongctlMeta, Portal};

    #[test]
    fn resolves_direct_reference() {
        let mut set = ResourceSet::default();
        set.portals.push(Portal {
            ref_: "p1".into(),
            name: "Main".into(),
            kongctl: Some(KongctlMeta::default()),
            ..Default::default()
        });
        set.api_publications.push(ApiPublication {
            ref_: "pub1".into(),
            parent_ref: "api1".into(),
            portal_id: "__REF__:p1#name".into(),
            visibility: None,
        });

        ReferenceResolver::new().resolve(&mut set).unwrap();
        assert_eq!(set.api_publications[0].portal_id, "Main");
        assert_eq!(set.resolved_refs.len(), 1);
        assert!(!set.resolved_refs[0].deferred);
    }

    #[test]
    fn defers_when_field_unavailable() {
        let mut set = ResourceSet::default();
        set.portals.push(Portal {
            ref_: "p1".into(),
            name: "Main".into(),
            kongctl: Some(KongctlMeta::default()),
            ..Default::default()
        });
        set.api_publications.push(ApiPublication {
            ref_: "pub1".into(),
            parent_ref: "api1".into(),
            portal_id: "__REF__:p1#id".into(),
            visibility: None,
        });
        ReferenceResolver::new().resolve(&mut set).unwrap();
        assert_eq!(set.api_publications[0].portal_id, "__REF__:p1#id");
        assert!(set.resolved_refs[0].deferred);
    }

    #[test]
    fn fails_on_dangling_reference() {
        let mut set = ResourceSet::default();
        set.api_publications.push(ApiPublication {
            ref_: "pub1".into(),
            parent_ref: "api1".into(),
            portal_id: "__REF__:missing#id".into(),
            visibility: None,
        });
        assert!(ReferenceResolver::new().resolve(&mut set).is_err());
    }

    #[test]
    fn detects_two_cycle() {
        // Two portals whose `name` fields each hold an unresolved
        // placeholder pointing at the other: resolving p1's
        // `default_application_auth_strategy_id` placeholder chains
        // through p2#name -> p1#name -> p2#name, a cycle.
        let mut set = ResourceSet::default();
        set.portals.push(Portal {
            ref_: "p1".into(),
            name: "__REF__:p2#name".into(),
            default_application_auth_strategy_id: Some("__REF__:p2#name".into()),
            kongctl: Some(KongctlMeta::default()),
            ..Default::default()
        });
        set.portals.push(Portal {
            ref_: "p2".into(),
            name: "__REF__:p1#name".into(),
            kongctl: Some(KongctlMeta::default()),
            ..Default::default()
        });
        assert!(ReferenceResolver::new().resolve(&mut set).is_err());
    }
}
