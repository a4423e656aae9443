//! Child-resource extraction/flattening (§3.2, §9 Design Notes): replaces
//! tree ownership with flat root-level collections plus `parent_ref`
//! indices — an arena + index pattern.
//!
//! Resources whose input shape has no `ref` field of their own (singleton
//! children) get a deterministic synthetic ref derived from their parent,
//! so re-loading the same file twice produces the same refs (required for
//! plan idempotence, §8).

use crate::registry::ResourceSet;
use crate::resource::*;

fn synthetic_ref(parent_ref: &str, suffix: &str) -> String {
    format!("{}::{}", parent_ref, suffix)
}

pub fn extract_portal(input: PortalInput, set: &mut ResourceSet) {
    let portal_ref = input.ref_.clone();

    if let Some(c) = input.customization {
        set.portal_customizations.push(PortalCustomization {
            ref_: synthetic_ref(&portal_ref, "customization"),
            parent_ref: portal_ref.clone(),
            css: c.css,
            logo: c.logo,
            favicon: c.favicon,
        });
    }

    if let Some(a) = input.auth_settings {
        set.portal_auth_settings.push(PortalAuthSettings {
            ref_: synthetic_ref(&portal_ref, "auth-settings"),
            parent_ref: portal_ref.clone(),
            basic_auth_enabled: a.basic_auth_enabled,
            oidc_enabled: a.oidc_enabled,
            default_application_auth_strategy_id: a.default_application_auth_strategy_id,
        });
    }

    if let Some(d) = input.custom_domain {
        set.portal_custom_domains.push(PortalCustomDomain {
            ref_: synthetic_ref(&portal_ref, "custom-domain"),
            parent_ref: portal_ref.clone(),
            hostname: d.hostname,
            enabled: d.enabled,
        });
    }

    extract_pages(input.pages, &portal_ref, None, set);

    for (i, snippet) in input.snippets.into_iter().enumerate() {
        let ref_ = snippet.ref_.clone().unwrap_or_else(|| synthetic_ref(&portal_ref, &format!("snippet-{}", i)));
        set.portal_snippets.push(PortalSnippet {
            ref_,
            parent_ref: portal_ref.clone(),
            name: snippet.name,
            content: snippet.content,
            visible: snippet.visible,
        });
    }

    for (i, team) in input.teams.into_iter().enumerate() {
        let team_ref = team.ref_.clone().unwrap_or_else(|| synthetic_ref(&portal_ref, &format!("team-{}", i)));
        set.portal_teams.push(PortalTeam {
            ref_: team_ref.clone(),
            parent_ref: portal_ref.clone(),
            name: team.name,
        });
        for (j, role) in team.roles.into_iter().enumerate() {
            let role_ref = role.ref_.clone().unwrap_or_else(|| synthetic_ref(&team_ref, &format!("role-{}", j)));
            set.portal_team_roles.push(PortalTeamRole {
                ref_: role_ref,
                parent_ref: team_ref.clone(),
                role: role.role,
            });
        }
    }

    if let Some(e) = input.email_config {
        set.portal_email_configs.push(PortalEmailConfig {
            ref_: synthetic_ref(&portal_ref, "email-config"),
            parent_ref: portal_ref.clone(),
            from_name: e.from_name,
            from_address: e.from_address,
            reply_to_address: e.reply_to_address,
        });
    }

    for (name, tmpl) in input.email_templates {
        set.portal_email_templates.push(PortalEmailTemplate {
            ref_: synthetic_ref(&portal_ref, &format!("email-template-{}", name)),
            parent_ref: portal_ref.clone(),
            template_name: name,
            subject: tmpl.subject,
            body: tmpl.body,
        });
    }

    set.portals.push(Portal {
        ref_: portal_ref,
        name: input.name,
        description: input.description,
        labels: input.labels,
        default_application_auth_strategy_id: input.default_application_auth_strategy_id,
        kongctl: input.kongctl,
    });
}

fn extract_pages(pages: Vec<PortalPageInput>, portal_ref: &str, parent_page_ref: Option<&str>, set: &mut ResourceSet) {
    for (i, page) in pages.into_iter().enumerate() {
        let fallback = match parent_page_ref {
            Some(pp) => synthetic_ref(pp, &format!("page-{}", i)),
            None => synthetic_ref(portal_ref, &format!("page-{}", i)),
        };
        let ref_ = page.ref_.clone().unwrap_or(fallback);
        set.portal_pages.push(PortalPage {
            ref_: ref_.clone(),
            parent_ref: portal_ref.to_string(),
            parent_page_ref: parent_page_ref.map(|s| s.to_string()),
            slug: page.slug,
            title: page.title,
            content: page.content,
            visibility: page.visibility,
        });
        extract_pages(page.children, portal_ref, Some(&ref_), set);
    }
}

pub fn extract_api(input: ApiInput, set: &mut ResourceSet) {
    let api_ref = input.ref_.clone();

    for (i, v) in input.versions.into_iter().enumerate() {
        let ref_ = v.ref_.clone().unwrap_or_else(|| synthetic_ref(&api_ref, &format!("version-{}", i)));
        set.api_versions.push(ApiVersion {
            ref_,
            parent_ref: api_ref.clone(),
            version: v.version,
            spec: v.spec,
        });
    }

    for (i, p) in input.publications.into_iter().enumerate() {
        let ref_ = p.ref_.clone().unwrap_or_else(|| synthetic_ref(&api_ref, &format!("publication-{}", i)));
        set.api_publications.push(ApiPublication {
            ref_,
            parent_ref: api_ref.clone(),
            portal_id: p.portal_id,
            visibility: p.visibility,
        });
    }

    for (i, impl_) in input.implementations.into_iter().enumerate() {
        let ref_ = impl_.ref_.clone().unwrap_or_else(|| synthetic_ref(&api_ref, &format!("implementation-{}", i)));
        set.api_implementations.push(ApiImplementation {
            ref_,
            parent_ref: api_ref.clone(),
            control_plane_id: impl_.service.control_plane_id,
            service_id: impl_.service.id,
        });
    }

    extract_documents(input.documents, &api_ref, None, set);

    set.apis.push(Api {
        ref_: api_ref,
        name: input.name,
        description: input.description,
        labels: input.labels,
        kongctl: input.kongctl,
    });
}

fn extract_documents(documents: Vec<ApiDocumentInput>, api_ref: &str, parent_document_ref: Option<&str>, set: &mut ResourceSet) {
    for (i, doc) in documents.into_iter().enumerate() {
        let fallback = match parent_document_ref {
            Some(pd) => synthetic_ref(pd, &format!("document-{}", i)),
            None => synthetic_ref(api_ref, &format!("document-{}", i)),
        };
        let ref_ = doc.ref_.clone().unwrap_or(fallback);
        set.api_documents.push(ApiDocument {
            ref_: ref_.clone(),
            parent_ref: api_ref.to_string(),
            parent_document_ref: parent_document_ref.map(|s| s.to_string()),
            title: doc.title,
            content: doc.content,
            slug: doc.slug,
        });
        extract_documents(doc.documents, api_ref, Some(&ref_), set);
    }
}

pub fn extract_control_plane(mut cp: ControlPlane, set: &mut ResourceSet) {
    let cp_ref = cp.ref_.clone();
    let services = std::mem::take(&mut cp.gateway_services);
    for (i, svc) in services.into_iter().enumerate() {
        let ref_ = svc.ref_.clone().unwrap_or_else(|| synthetic_ref(&cp_ref, &format!("gateway-service-{}", i)));
        set.gateway_services.push(GatewayService {
            ref_,
            name: svc.name,
            url: svc.url,
            parent_ref: cp_ref.clone(),
            external: svc.external,
            kongctl: svc.kongctl,
        });
    }
    set.control_planes.push(cp);
}

pub fn extract_organization(org: OrganizationInput, set: &mut ResourceSet) {
    for (i, team) in org.teams.into_iter().enumerate() {
        let ref_ = team.ref_.unwrap_or_else(|| format!("organization::team-{}", i));
        set.organization_teams.push(OrganizationTeam {
            ref_,
            name: team.name,
            description: team.description,
            kongctl: team.kongctl,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portal_page_tree_gets_parent_page_ref_chain() {
        let mut set = ResourceSet::default();
        let input = PortalInput {
            ref_: "docs-portal".into(),
            name: "Docs".into(),
            pages: vec![PortalPageInput {
                ref_: None,
                slug: "root".into(),
                children: vec![PortalPageInput {
                    ref_: Some("child-page".into()),
                    slug: "child".into(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };
        extract_portal(input, &mut set);
        assert_eq!(set.portal_pages.len(), 2);
        let root = set.portal_pages.iter().find(|p| p.slug == "root").unwrap();
        assert_eq!(root.parent_ref, "docs-portal");
        assert!(root.parent_page_ref.is_none());
        let child = set.portal_pages.iter().find(|p| p.slug == "child").unwrap();
        assert_eq!(child.parent_page_ref.as_deref(), Some(root.ref_.as_str()));
    }

    #[test]
    fn gateway_services_flatten_with_parent_ref() {
        let mut set = ResourceSet::default();
        let cp = ControlPlane {
            ref_: "cp1".into(),
            name: "Default CP".into(),
            gateway_services: vec![GatewayServiceInput {
                ref_: Some("svc1".into()),
                name: Some("svc1".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        extract_control_plane(cp, &mut set);
        assert_eq!(set.control_planes[0].gateway_services.len(), 0);
        assert_eq!(set.gateway_services.len(), 1);
        assert_eq!(set.gateway_services[0].parent_ref, "cp1");
    }
}
