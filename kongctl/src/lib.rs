#![allow(non_snake_case)]

#[macro_use]
extern crate serde_derive;
extern crate serde;
extern crate serde_json;
extern crate serde_yaml;

#[macro_use]
extern crate log;

#[macro_use]
extern crate failure;

extern crate clap;
extern crate openssl_probe;
extern crate reqwest;
extern crate regex;
extern crate chrono;
extern crate dirs;
extern crate url;
extern crate petgraph;

extern crate kongctl_definitions;
pub use kongctl_definitions::{ResourceSet, Resource, ResourceType};

pub use failure::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds and constructors used throughout this crate.
pub mod error;

/// Runtime configuration: CLI flags, environment variables, profile file.
pub mod config;

/// Label conventions applied to resources kongctl manages (§6).
pub mod labels;

/// Renders a `failure::Error` chain as a human-readable message (§7).
pub mod friendly_error;

/// Konnect API clients, one per resource kind, plus pagination and HTTP logging.
pub mod state;

/// Builds an ordered `Plan` from a loaded `ResourceSet` and remote state.
pub mod planner;

/// Applies a `Plan` against the Konnect API, or hands deck steps to `deck`.
pub mod executor;

/// Invokes the external `deck` tool for Gateway Service configuration.
pub mod external_tool;

/// The `clap` command-line surface.
pub mod cli;

pub use config::KongctlConfig;
pub use planner::{Plan, PlanOptions, PlannedChange, Planner};
pub use executor::{CancellationToken, Executor, SequentialExecutor};

/// Prepares the process environment the same way the CLI expects it:
/// TLS roots probed, and an optional manifest-directory override applied
/// before anything else runs.
pub fn init() -> Result<()> {
    use std::env;
    use std::path::Path;
    openssl_probe::init_ssl_cert_env_vars();

    if let Ok(mdir) = env::var("KONGCTL_MANIFEST_DIR") {
        let pth = Path::new(&mdir);
        if !pth.is_dir() {
            bail!("KONGCTL_MANIFEST_DIR must exist");
        }
        env::set_current_dir(pth)?;
    }

    Ok(())
}
