//! Configuration surface (§1 ambient stack, §6): CLI flags take priority
//! over environment variables, which take priority over a YAML profile
//! file — the same env-var-first-with-filesystem-fallback shape as the
//! teacher's `vault::default_addr`/`default_token`.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::configuration;
use crate::Result;

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Profile {
    #[serde(default)]
    pub addr: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub preview: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
struct ConfigFile {
    #[serde(default)]
    profiles: BTreeMap<String, Profile>,
}

/// Resolved runtime configuration for one invocation.
#[derive(Debug, Clone)]
pub struct KongctlConfig {
    pub profile: String,
    pub addr: String,
    pub token: String,
    pub preview: Vec<String>,
    pub max_concurrency: usize,
    pub page_size: usize,
}

impl KongctlConfig {
    /// Loads configuration from (in priority order) environment variables
    /// and the YAML profile file; CLI flags are applied by the caller
    /// afterwards by overwriting fields on the returned value.
    pub fn load() -> Result<Self> {
        let profile = env::var("KONGCTL_PROFILE").unwrap_or_else(|_| "default".to_string());
        let path = Self::config_path()?;
        let file = Self::read_config_file(&path)?;
        let from_profile = file.profiles.get(&profile).cloned().unwrap_or_default();

        let addr = env::var("KONGCTL_ADDR")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| Some(from_profile.addr.clone()).filter(|s| !s.is_empty()))
            .ok_or_else(|| configuration("no Konnect address configured (set KONGCTL_ADDR or add it to a profile)"))?;

        let token = env::var("KONGCTL_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| Some(from_profile.token.clone()).filter(|s| !s.is_empty()))
            .ok_or_else(|| configuration("no Konnect token configured (set KONGCTL_TOKEN or add it to a profile)"))?;

        let preview = match env::var("KONGCTL_PREVIEW") {
            Ok(raw) => raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
            Err(_) => from_profile.preview,
        };

        Ok(KongctlConfig {
            profile,
            addr,
            token,
            preview,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    fn config_path() -> Result<PathBuf> {
        if let Ok(p) = env::var("KONGCTL_CONFIG_PATH") {
            return Ok(PathBuf::from(p));
        }
        let home = dirs::home_dir().ok_or_else(|| configuration("cannot determine home directory"))?;
        Ok(home.join(".config").join("kongctl").join("config.yaml"))
    }

    fn read_config_file(path: &Path) -> Result<ConfigFile> {
        if !path.exists() {
            return Ok(ConfigFile::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| configuration(format!("cannot read {}: {}", path.display(), e)))?;
        serde_yaml::from_str(&content).map_err(|e| configuration(format!("invalid config file {}: {}", path.display(), e)))
    }

    pub fn previews_enabled(&self, kind: &str) -> bool {
        self.preview.iter().any(|p| p == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_preview_csv() {
        env::set_var("KONGCTL_PREVIEW", "gateway_service, api_document");
        env::set_var("KONGCTL_ADDR", "https://example.konghq.com");
        env::set_var("KONGCTL_TOKEN", "t");
        env::set_var("KONGCTL_CONFIG_PATH", "/nonexistent/kongctl-config.yaml");
        let cfg = KongctlConfig::load().unwrap();
        assert!(cfg.previews_enabled("gateway_service"));
        assert!(cfg.previews_enabled("api_document"));
        assert!(!cfg.previews_enabled("portal"));
        env::remove_var("KONGCTL_PREVIEW");
        env::remove_var("KONGCTL_ADDR");
        env::remove_var("KONGCTL_TOKEN");
        env::remove_var("KONGCTL_CONFIG_PATH");
    }
}
