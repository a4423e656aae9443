//! Command-line surface (§4.K): a `clap` v2 builder exposing the seven
//! subcommands and the global flags `main.rs` resolves into an
//! `Invocation` before wiring up the loader/planner/executor.

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use crate::error::configuration;
use crate::planner::PlanMode;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Plan,
    Apply,
    Sync,
    Diff,
    Export,
    Adopt,
    Dump,
}

impl Command {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "plan" => Some(Command::Plan),
            "apply" => Some(Command::Apply),
            "sync" => Some(Command::Sync),
            "diff" => Some(Command::Diff),
            "export" => Some(Command::Export),
            "adopt" => Some(Command::Adopt),
            "dump" => Some(Command::Dump),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: Command,
    pub filenames: Vec<String>,
    pub recursive: bool,
    pub mode: PlanMode,
    pub generator: String,
    pub konnect_token: Option<String>,
    pub konnect_control_plane_name: Option<String>,
    pub konnect_addr: Option<String>,
}

pub fn build() -> App<'static, 'static> {
    App::new("kongctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Declarative configuration management for Kong Konnect")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("filename")
                .short("f")
                .long("filename")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .global(true)
                .help("a YAML file, a directory, or '-' for stdin; repeatable or comma-separated"),
        )
        .arg(
            Arg::with_name("recursive")
                .short("R")
                .long("recursive")
                .global(true)
                .help("recurse into subdirectories of any -f directory"),
        )
        .arg(
            Arg::with_name("mode")
                .long("mode")
                .takes_value(true)
                .possible_values(&["apply", "sync"])
                .global(true)
                .help("plan mode; sync additionally deletes unmanaged-in-desired-state objects"),
        )
        .arg(
            Arg::with_name("generator")
                .long("generator")
                .takes_value(true)
                .default_value("kongctl")
                .global(true)
                .help("value recorded in the managed-by label and used to scope sync deletions"),
        )
        .arg(Arg::with_name("konnect-token").long("konnect-token").takes_value(true).global(true))
        .arg(Arg::with_name("konnect-control-plane-name").long("konnect-control-plane-name").takes_value(true).global(true))
        .arg(Arg::with_name("konnect-addr").long("konnect-addr").takes_value(true).global(true))
        .subcommand(SubCommand::with_name("plan").about("show the changes apply would make"))
        .subcommand(SubCommand::with_name("apply").about("create and update resources to match the desired state"))
        .subcommand(SubCommand::with_name("sync").about("apply, then delete managed resources no longer present"))
        .subcommand(SubCommand::with_name("diff").about("alias for plan"))
        .subcommand(SubCommand::with_name("export").about("dump live remote state as YAML"))
        .subcommand(SubCommand::with_name("adopt").about("label an existing remote object as managed, without changing it"))
        .subcommand(SubCommand::with_name("dump").about("print the resolved resource set after loading, before planning"))
}

pub fn parse(matches: &ArgMatches) -> Result<Invocation> {
    let name = matches.subcommand_name().ok_or_else(|| configuration("no subcommand given"))?;
    let command = Command::from_name(name).ok_or_else(|| configuration(format!("unknown subcommand '{}'", name)))?;

    let filenames: Vec<String> = matches
        .values_of("filename")
        .map(|vs| vs.map(str::to_string).collect())
        .unwrap_or_default();
    if filenames.is_empty() && command != Command::Export {
        return Err(configuration("at least one -f/--filename is required"));
    }

    let mode = match matches.value_of("mode") {
        Some("sync") => PlanMode::Sync,
        _ if command == Command::Sync => PlanMode::Sync,
        _ => PlanMode::Apply,
    };

    Ok(Invocation {
        command,
        filenames,
        recursive: matches.is_present("recursive"),
        mode,
        generator: matches.value_of("generator").unwrap_or("kongctl").to_string(),
        konnect_token: matches.value_of("konnect-token").map(str::to_string),
        konnect_control_plane_name: matches.value_of("konnect-control-plane-name").map(str::to_string),
        konnect_addr: matches.value_of("konnect-addr").map(str::to_string),
    })
}
