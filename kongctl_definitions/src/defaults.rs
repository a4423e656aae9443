//! File-level default overlay (§4.B, §4.C.4): plays the same role as the
//! teacher's region/manifest merge module, generalised from manifest-region
//! merging to overlaying `_defaults.kongctl.*` onto every managed parent
//! resource declared in one source file.

use serde::Deserialize;

use crate::error::{configuration, Result};
use crate::resource::{NamespaceOrigin, Resource};

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
struct DefaultsKongctl {
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    protected: Option<bool>,
}

/// The `_defaults` top-level key of one source file.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct FileDefaultsInput {
    #[serde(default)]
    kongctl: Option<DefaultsKongctl>,
}

/// Validated, flattened form of [`FileDefaultsInput`].
#[derive(Debug, Clone, Default)]
pub struct FileDefaults {
    pub namespace: Option<String>,
    pub protected: Option<bool>,
}

impl FileDefaults {
    pub fn from_input(input: FileDefaultsInput) -> Result<Self> {
        let kongctl = input.kongctl.unwrap_or_default();
        if let Some(ns) = &kongctl.namespace {
            if ns.is_empty() {
                return Err(configuration("_defaults.kongctl.namespace must not be empty"));
            }
        }
        Ok(FileDefaults {
            namespace: kongctl.namespace,
            protected: kongctl.protected,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.namespace.is_none() && self.protected.is_none()
    }

    /// Overlays this file's defaults onto a managed parent resource.
    /// `resource.set_defaults()` must already have run, so `kongctl_mut()`
    /// is `Some` for every managed parent.
    pub fn apply(&self, resource: &mut dyn Resource) {
        if resource.external().is_some() {
            return;
        }
        if let Some(ns) = &self.namespace {
            if let Some(meta) = resource.kongctl_mut() {
                meta.namespace = ns.clone();
                meta.namespace_origin = NamespaceOrigin::FileDefault;
            }
        }
        if let Some(protected) = self.protected {
            if let Some(meta) = resource.kongctl_mut() {
                meta.protected = protected;
            }
        }
    }
}
