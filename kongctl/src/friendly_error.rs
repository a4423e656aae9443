//! Renders a `failure::Error` chain the way `main.rs` prints it to stderr
//! (§7): a single `Error:` line — walking `Fail::cause()` into it so a
//! stack of wrapped errors reads as one sentence — followed by an indented
//! `suggestion:` line and any sorted contextual attributes the caller
//! supplied at the error site.

use std::collections::BTreeMap;
use std::fmt::Write;

use failure::Fail;

use kongctl_definitions::error::{DefError, DefErrKind};

use crate::error::{KongctlError, KongctlErrKind};

/// Renders `err` with no extra attributes.
pub fn render(err: &failure::Error) -> String {
    render_with_attributes(err, &BTreeMap::new())
}

/// Renders `err`, appending `attributes` (already naturally sorted, since
/// `BTreeMap` iterates by key) after the suggestion line.
pub fn render_with_attributes(err: &failure::Error, attributes: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    write!(out, "Error: {}", chain_message(err)).ok();

    if let Some(suggestion) = suggestion_for(err) {
        write!(out, "\n  suggestion: {}", suggestion).ok();
    }
    for (k, v) in attributes {
        write!(out, "\n  {}: {}", k, v).ok();
    }
    out
}

/// Joins the top-level error with every `cause()` below it into one line.
fn chain_message(err: &failure::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut cause = err.as_fail().cause();
    while let Some(c) = cause {
        parts.push(c.to_string());
        cause = c.cause();
    }
    parts.join(": caused by: ")
}

fn suggestion_for(err: &failure::Error) -> Option<String> {
    if let Some(kongctl_err) = err.downcast_ref::<KongctlError>() {
        let text = match kongctl_err.kind() {
            KongctlErrKind::Auth(_) => "re-authenticate and retry (check KONGCTL_TOKEN or the active profile)",
            KongctlErrKind::RateLimit(_) => "retry after the backoff interval, or lower max_concurrency",
            KongctlErrKind::Network(_) => "check connectivity to the Konnect address and retry",
            KongctlErrKind::ExternalTool(_) => "ensure `deck` is installed and present on PATH",
            KongctlErrKind::Protection(_, _) => "remove the resource's protected label before retrying",
            KongctlErrKind::Configuration(_) => "check the command-line flags and configuration file for typos",
            KongctlErrKind::Validation(_) | KongctlErrKind::Reference(_) => "fix the resource definition and reload",
            KongctlErrKind::Conflict(_) => "a remote object with that name already exists; rename it or adopt the resource",
            KongctlErrKind::Server(_) => "the server reported an internal error; retry later",
            KongctlErrKind::Execution(_) => return None,
        };
        return Some(text.to_string());
    }
    let def_err = err.downcast_ref::<DefError>()?;
    let text = match def_err.kind() {
        DefErrKind::Configuration(_) => "check the command-line flags and configuration file for typos",
        DefErrKind::Validation(_) | DefErrKind::Reference(_) => "fix the resource definition and reload",
        DefErrKind::UnsupportedTag(_) => "check the YAML document for a typo in a custom tag",
        DefErrKind::PathEscapesBaseDir(_) => "point `!file` at a path inside the manifest directory",
    };
    Some(text.to_string())
}

/// Exit code `main.rs` maps a rendered error to (§4.K): `1` for runtime
/// errors, `2` for configuration/validation (usage) errors. Errors raised
/// by `kongctl_definitions` (`DefError`) classify the same way as the
/// equivalent `KongctlError` kind.
pub fn exit_code_for(err: &failure::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<KongctlError>() {
        return match e.kind() {
            KongctlErrKind::Configuration(_) | KongctlErrKind::Validation(_) | KongctlErrKind::Reference(_) => 2,
            _ => 1,
        };
    }
    if let Some(e) = err.downcast_ref::<DefError>() {
        return match e.kind() {
            DefErrKind::Configuration(_) | DefErrKind::Validation(_) | DefErrKind::Reference(_) => 2,
            _ => 1,
        };
    }
    1
}
