extern crate clap;
extern crate failure;
extern crate kongctl;
extern crate kongctl_definitions;
extern crate loggerv;
extern crate serde_json;
extern crate serde_yaml;

use std::path::PathBuf;
use std::process;

use kongctl::cli::{self, Command, Invocation};
use kongctl::external_tool::ProcessRunner;
use kongctl::friendly_error::{exit_code_for, render};
use kongctl::state::{HttpStateClient, List};
use kongctl::{CancellationToken, Executor, KongctlConfig, PlanOptions, Planner, Result, SequentialExecutor};
use kongctl_definitions::loader::source::parse_sources;
use kongctl_definitions::{Loader, ResourceSet, ResourceType};

/// Every real (non-`Deck`) resource kind, in the order `export` prints them.
const EXPORTABLE_KINDS: &[ResourceType] = &[
    ResourceType::Portal,
    ResourceType::PortalCustomization,
    ResourceType::PortalAuthSettings,
    ResourceType::PortalCustomDomain,
    ResourceType::PortalPage,
    ResourceType::PortalSnippet,
    ResourceType::PortalTeam,
    ResourceType::PortalTeamRole,
    ResourceType::PortalEmailConfig,
    ResourceType::PortalEmailTemplate,
    ResourceType::Api,
    ResourceType::ApiVersion,
    ResourceType::ApiPublication,
    ResourceType::ApiImplementation,
    ResourceType::ApiDocument,
    ResourceType::ControlPlane,
    ResourceType::GatewayService,
    ResourceType::ApplicationAuthStrategy,
    ResourceType::OrganizationTeam,
];

fn main() {
    loggerv::Logger::new()
        .verbosity(1)
        .level(true)
        .module_path(false)
        .init()
        .expect("logger already initialized");

    if let Err(e) = kongctl::init().and_then(run) {
        eprintln!("{}", render(&e));
        process::exit(exit_code_for(&e));
    }
}

fn run() -> Result<()> {
    let app = cli::build();
    let matches = app.get_matches();
    let invocation = cli::parse(&matches)?;

    if invocation.command == Command::Dump {
        let set = load(&invocation)?;
        println!("{}", serde_yaml::to_string(&DumpView::from(&set)).unwrap_or_default());
        return Ok(());
    }

    let config = resolve_config(&invocation)?;
    let state = HttpStateClient::new(&config)?;

    if invocation.command == Command::Export {
        return export(&state);
    }

    let set = load(&invocation)?;

    if invocation.command == Command::Adopt {
        let mut count = 0usize;
        set.for_each_resource(|_| count += 1);
        println!("adopt: would label {} resources as managed by '{}'", count, invocation.generator);
        return Ok(());
    }

    let options = PlanOptions {
        mode: invocation.mode,
        generator: invocation.generator.clone(),
        deck_binary: "deck".to_string(),
    };
    let planner = Planner::new(&state);
    let plan = planner.plan(&set, &options)?;

    match invocation.command {
        Command::Plan | Command::Diff => print_plan(&plan),
        Command::Apply | Command::Sync => {
            print_plan(&plan);
            let runner = ProcessRunner::new();
            let deck_base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let executor = SequentialExecutor::new(
                &state,
                &runner,
                &deck_base,
                invocation.konnect_token.clone().unwrap_or_default(),
                invocation.konnect_addr.clone().unwrap_or_default(),
            );
            let report = executor.execute(&plan, &CancellationToken::new())?;
            print_report(&report);
            if !report.success() {
                process::exit(1);
            }
        }
        Command::Dump | Command::Adopt | Command::Export => unreachable!("handled above"),
    }

    Ok(())
}

fn load(invocation: &Invocation) -> Result<ResourceSet> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let joined = invocation.filenames.join(",");
    let sources = parse_sources(&joined);
    let loader = Loader::new(cwd, invocation.recursive);
    Ok(loader.load_from_sources(&sources)?)
}

fn resolve_config(invocation: &Invocation) -> Result<KongctlConfig> {
    let mut config = KongctlConfig::load()?;
    if let Some(token) = &invocation.konnect_token {
        config.token = token.clone();
    }
    if let Some(addr) = &invocation.konnect_addr {
        config.addr = addr.clone();
    }
    Ok(config)
}

fn export(state: &HttpStateClient) -> Result<()> {
    for &kind in EXPORTABLE_KINDS {
        for obj in state.list(kind, None)? {
            println!("{}", serde_json::to_string_pretty(&obj.fields).unwrap_or_default());
        }
    }
    Ok(())
}

fn print_plan(plan: &kongctl::Plan) {
    println!(
        "Plan ({} mode, generator '{}'): {} to create, {} to update, {} to delete, {} no-op, {} external",
        plan.mode.as_str(),
        plan.generator,
        plan.summary.create,
        plan.summary.update,
        plan.summary.delete,
        plan.summary.noop,
        plan.summary.external_tool
    );
    for change in &plan.changes {
        println!("  {:?} {} ({})", change.action, change.resource_ref, change.resource_type);
    }
}

fn print_report(report: &kongctl::executor::ExecutionReport) {
    for result in &report.results {
        println!("  {} -> {:?}", result.resource_ref, result.outcome);
    }
}

#[derive(serde::Serialize)]
struct DumpView {
    portals: usize,
    apis: usize,
    control_planes: usize,
    application_auth_strategies: usize,
    organization_teams: usize,
}

impl From<&ResourceSet> for DumpView {
    fn from(set: &ResourceSet) -> Self {
        DumpView {
            portals: set.portals.len(),
            apis: set.apis.len(),
            control_planes: set.control_planes.len(),
            application_auth_strategies: set.application_auth_strategies.len(),
            organization_teams: set.organization_teams.len(),
        }
    }
}
