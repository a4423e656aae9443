//! External-tool runner (§4.I): builds argv for and invokes `deck`, the
//! same `Command::new(binary).args(...).output()` plus exit-status/stderr
//! classification shape as the bash tool in `agenticlaw-tools`, generalised
//! to an arbitrary external binary located by `PATH`.

use std::path::Path;
use std::process::Command;

use kongctl_definitions::tags::resolve_within_root;

use crate::error::{configuration, external_tool};
use crate::Result;

const MODE_PLACEHOLDER: &str = "{mode}";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub args: Vec<String>,
    pub mode: String,
    pub konnect_token: String,
    pub konnect_control_plane_name: String,
    pub konnect_address: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

pub trait Runner {
    fn run(&self, binary: &str, options: &RunOptions, base_dir: &Path) -> Result<RunOutput>;
}

pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        ProcessRunner
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        ProcessRunner::new()
    }
}

impl Runner for ProcessRunner {
    fn run(&self, binary: &str, options: &RunOptions, base_dir: &Path) -> Result<RunOutput> {
        let argv = build_argv(options, base_dir)?;

        let output = Command::new(binary).args(&argv).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                external_tool(format!("`{}` was not found on PATH", binary))
            } else {
                external_tool(format!("failed to execute `{}`: {}", binary, e))
            }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            return Err(external_tool(format!(
                "`{}` exited with {}: {}",
                binary,
                output.status,
                if stderr.is_empty() { &stdout } else { &stderr }
            )));
        }
        Ok(RunOutput { stdout, stderr })
    }
}

/// Builds the final argv: substitutes the mode placeholder, injects
/// `gateway` subcommand credentials, and sandbox-checks positional file
/// arguments (§4.I steps 1-3).
pub fn build_argv(options: &RunOptions, base_dir: &Path) -> Result<Vec<String>> {
    let mut args = substitute_mode(&options.args, &options.mode)?;

    if args.first().map(|s| s.as_str()) == Some("gateway") {
        inject_gateway_flags(&mut args, options)?;
    }

    validate_positional_paths(&args, base_dir)?;
    Ok(args)
}

fn substitute_mode(args: &[String], mode: &str) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        if arg == MODE_PLACEHOLDER {
            out.push(mode.to_string());
        } else if arg.contains(MODE_PLACEHOLDER) {
            return Err(configuration(format!(
                "the {} placeholder must be a whole argument, not part of '{}'",
                MODE_PLACEHOLDER, arg
            )));
        } else {
            out.push(arg.clone());
        }
    }
    Ok(out)
}

fn inject_gateway_flags(args: &mut Vec<String>, options: &RunOptions) -> Result<()> {
    if options.konnect_token.is_empty() || options.konnect_control_plane_name.is_empty() || options.konnect_address.is_empty() {
        return Err(configuration("gateway deck steps require a Konnect token, control-plane name and address".to_string()));
    }
    for (flag, value) in [
        ("--konnect-token", &options.konnect_token),
        ("--konnect-control-plane-name", &options.konnect_control_plane_name),
        ("--konnect-addr", &options.konnect_address),
    ] {
        if args.iter().any(|a| a == flag || a.starts_with(&format!("{}=", flag))) {
            return Err(configuration(format!("conflicting flag '{}' already present in deck args", flag)));
        }
        let _ = value;
    }

    let insert_at = args.len().min(2);
    let mut injected = vec![
        "--konnect-token".to_string(),
        options.konnect_token.clone(),
        "--konnect-control-plane-name".to_string(),
        options.konnect_control_plane_name.clone(),
        "--konnect-addr".to_string(),
        options.konnect_address.clone(),
    ];
    let tail = args.split_off(insert_at);
    args.append(&mut injected);
    args.extend(tail);
    Ok(())
}

fn validate_positional_paths(args: &[String], base_dir: &Path) -> Result<()> {
    for (i, arg) in args.iter().enumerate() {
        if i < 2 || arg == "-" || arg.starts_with('-') {
            continue;
        }
        if arg.contains("://") {
            continue;
        }
        resolve_within_root(base_dir, base_dir, arg)?;
    }
    Ok(())
}
