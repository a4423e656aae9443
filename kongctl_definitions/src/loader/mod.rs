//! Loader (component C, §4.C): multi-source YAML ingestion with custom
//! tags, file-level defaults, child extraction, and global ref uniqueness.

mod extract;
pub mod source;
pub mod suggest;

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use crate::defaults::{FileDefaults, FileDefaultsInput};
use crate::error::configuration;
use crate::reference::ReferenceResolver;
use crate::registry::ResourceSet;
use crate::resource::{ApplicationAuthStrategy, ApiInput, ControlPlane, OrganizationInput, PortalInput, ResourceType};
use crate::tags::TagResolver;
use crate::validator::Validator;
use crate::Result;

pub use source::Source;
use source::InputFile;

/// The top-level shape of one source document (§6): `_defaults`, and the
/// five resource-collection keys. Strict: unknown top-level keys fail.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    _defaults: Option<FileDefaultsInput>,
    #[serde(default)]
    portals: Vec<PortalInput>,
    #[serde(default)]
    apis: Vec<ApiInput>,
    #[serde(default)]
    application_auth_strategies: Vec<ApplicationAuthStrategy>,
    #[serde(default)]
    control_planes: Vec<ControlPlane>,
    #[serde(default)]
    organization: Option<OrganizationInput>,
}

/// Reads and reconciles one or more YAML sources into a validated,
/// reference-resolved `ResourceSet`.
pub struct Loader {
    resolver: TagResolver,
    recursive: bool,
}

impl Loader {
    /// `tag_root` bounds every `!file` resolution and deck-config path
    /// (§4.A, §4.C.6); it is typically the current working directory.
    pub fn new<P: Into<PathBuf>>(tag_root: P, recursive: bool) -> Self {
        Loader {
            resolver: TagResolver::new(tag_root),
            recursive,
        }
    }

    pub fn load_from_sources(&self, sources: &[Source]) -> Result<ResourceSet> {
        let mut set = ResourceSet::default();
        let mut global_index: HashMap<String, (ResourceType, String)> = HashMap::new();
        let mut default_namespace: Option<(String, String)> = None; // (namespace, source label)

        for source in sources {
            for file in source::enumerate(source, self.recursive)? {
                let (raw_defaults, file_set) = self.load_one_file(&file)?;

                if file_set.is_empty() {
                    if let Some(defaults) = &raw_defaults {
                        if let Some(ns) = &defaults.namespace {
                            match &default_namespace {
                                None => default_namespace = Some((ns.clone(), file.label())),
                                Some((existing, _)) if existing != ns => {
                                    return Err(configuration(format!(
                                        "conflicting _defaults.kongctl.namespace values: '{}' and '{}'",
                                        existing, ns
                                    )))
                                }
                                _ => {}
                            }
                        }
                    }
                }

                self.check_duplicates(&mut global_index, &file_set, &file.label())?;
                set.append_all(file_set);
            }
        }

        if let Some((ns, _)) = default_namespace {
            if set.is_empty() {
                set.default_namespace = Some(ns);
            }
        }

        ReferenceResolver::new().resolve(&mut set)?;
        Validator::new().validate(&set)?;
        Ok(set)
    }

    fn load_one_file(&self, file: &InputFile) -> Result<(Option<FileDefaults>, ResourceSet)> {
        let content = match file {
            InputFile::Path(path) => std::fs::read_to_string(path)
                .map_err(|e| configuration(format!("cannot read {}: {}", path.display(), e)))?,
            InputFile::Stdin => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| configuration(format!("cannot read stdin: {}", e)))?;
                buf
            }
        };

        let raw_value: serde_yaml::Value = serde_yaml::from_str(&content)
            .map_err(|e| configuration(format!("{}: invalid YAML: {}", file.label(), e)))?;
        let resolved = self.resolver.resolve_document(raw_value, &file.dir())?;

        let doc: RawDocument = serde_yaml::from_value(resolved).map_err(|e| {
            configuration(format!("{}: {}", file.label(), suggest::enrich_unknown_field_message(&e.to_string())))
        })?;

        let defaults = match doc._defaults {
            Some(input) => Some(FileDefaults::from_input(input)?),
            None => None,
        };

        let mut set = ResourceSet::default();
        for portal in doc.portals {
            extract::extract_portal(portal, &mut set);
        }
        for api in doc.apis {
            extract::extract_api(api, &mut set);
        }
        for strategy in doc.application_auth_strategies {
            set.application_auth_strategies.push(strategy);
        }
        for cp in doc.control_planes {
            extract::extract_control_plane(cp, &mut set);
        }
        if let Some(org) = doc.organization {
            extract::extract_organization(org, &mut set);
        }

        set.for_each_resource_mut(|r| r.set_defaults());
        if let Some(defaults) = &defaults {
            if !defaults.is_empty() {
                set.for_each_resource_mut(|r| defaults.apply(r));
            }
        }

        self.resolve_deck_paths(&mut set, &file.dir())?;

        Ok((defaults, set))
    }

    /// Resolves `control_plane.deck.files` paths relative to the source
    /// file and rejects any that escape the tag root (§4.C.6).
    fn resolve_deck_paths(&self, set: &mut ResourceSet, file_dir: &std::path::Path) -> Result<()> {
        for cp in &mut set.control_planes {
            if let Some(deck) = &mut cp.deck {
                for f in &mut deck.files {
                    let resolved = crate::tags::resolve_within_root(self.resolver.root(), file_dir, f)?;
                    *f = resolved.to_string_lossy().into_owned();
                }
            }
        }
        Ok(())
    }

    fn check_duplicates(
        &self,
        global_index: &mut HashMap<String, (ResourceType, String)>,
        file_set: &ResourceSet,
        source_label: &str,
    ) -> Result<()> {
        let mut dup_err = None;
        file_set.for_each_resource(|res| {
            if dup_err.is_some() {
                return;
            }
            let r = res.get_ref().to_string();
            if let Some((_, prior_source)) = global_index.get(&r) {
                dup_err = Some(configuration(format!(
                    "duplicate ref '{}' found in both {} and {}",
                    r, prior_source, source_label
                )));
            } else {
                global_index.insert(r, (res.kind(), source_label.to_string()));
            }
        });
        match dup_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
