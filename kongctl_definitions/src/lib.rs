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

extern crate base64;
extern crate dirs;
extern crate regex;
extern crate semver;
extern crate strsim;
extern crate uuid;
extern crate walkdir;

pub use failure::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds and constructors used throughout this crate.
pub mod error;
pub use error::{DefErrKind, DefError};

/// Every loadable resource kind, and the `Resource` trait they implement.
pub mod resource;
pub use resource::*;

/// `ResourceSet`, the container a load populates.
pub mod registry;
pub use registry::{ResourceSet, ResolvedRef};

/// Custom YAML tag resolution (`!file`, `!ref`) ahead of typed deserialization.
pub mod tags;

/// Reads one or more YAML sources into a `ResourceSet`, extracting nested
/// child blocks into flat root-level resources as it goes.
pub mod loader;
pub use loader::Loader;

/// Resolves `!ref` placeholders left by the tag pass, in dependency order.
pub mod reference;
pub use reference::ReferenceResolver;

/// Per-kind and registry-level validation (§4.E).
pub mod validator;
pub use validator::Validator;

/// Namespace syntax rules shared by the loader, defaulting pass and validator.
pub mod namespace;

/// Default-overlay application (`_defaults` blocks, §4.C.5/6).
pub mod defaults;
