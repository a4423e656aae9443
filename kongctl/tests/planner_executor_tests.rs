//! Full load -> plan -> execute pipeline, the same black-box level as
//! `kongctl_definitions`'s own `tests/end_to_end.rs` but carried through
//! to the planner and executor.

use std::path::Path;

use kongctl::executor::{CancellationToken, Executor, Outcome, SequentialExecutor};
use kongctl::external_tool::{RunOptions, RunOutput, Runner};
use kongctl::planner::{PlanMode, PlanOptions, Planner};
use kongctl::state::memory::MemoryStateClient;
use kongctl::state::List;
use kongctl::Result;
use kongctl_definitions::loader::source::Source;
use kongctl_definitions::{Loader, ResourceType};

struct NoopRunner;
impl Runner for NoopRunner {
    fn run(&self, _binary: &str, _options: &RunOptions, _base_dir: &Path) -> Result<RunOutput> {
        Ok(RunOutput::default())
    }
}

fn load(dir: &Path, yaml: &str) -> kongctl_definitions::ResourceSet {
    let path = dir.join("manifest.yaml");
    std::fs::write(&path, yaml).unwrap();
    let loader = Loader::new(dir, false);
    loader.load_from_sources(&[Source::File(path)]).unwrap()
}

#[test]
fn creates_a_portal_that_depends_on_its_auth_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let set = load(
        dir.path(),
        r#"
application_auth_strategies:
- ref: default-key-auth
  name: default-key-auth
  strategy_type: key_auth

portals:
- ref: main
  name: Main Portal
  default_application_auth_strategy_id: !ref default-key-auth
"#,
    );

    let state = MemoryStateClient::new();
    let planner = Planner::new(&state);
    let options = PlanOptions { mode: PlanMode::Apply, generator: "kongctl".to_string(), deck_binary: "deck".to_string() };
    let plan = planner.plan(&set, &options).unwrap();

    assert_eq!(plan.summary.create, 2);

    let portal_change = plan.changes.iter().find(|c| c.resource_ref == "main").unwrap();
    let strategy_change = plan.changes.iter().find(|c| c.resource_ref == "default-key-auth").unwrap();
    assert!(portal_change.depends_on.contains(&strategy_change.id));

    let runner = NoopRunner;
    let base = dir.path().to_path_buf();
    let executor = SequentialExecutor::new(&state, &runner, &base, "tok".to_string(), "addr".to_string());
    let report = executor.execute(&plan, &CancellationToken::new()).unwrap();
    assert!(report.success());
    assert!(report.results.iter().all(|r| r.outcome == Outcome::Applied));

    let strategies = state.list(ResourceType::ApplicationAuthStrategy, None).unwrap();
    let strategy_id = strategies[0].id.clone();

    let portals = state.list(ResourceType::Portal, None).unwrap();
    assert_eq!(
        portals[0].fields.get("default_application_auth_strategy_id").and_then(|v| v.as_str()),
        Some(strategy_id.as_str())
    );
}

#[test]
fn second_plan_against_unchanged_state_is_all_noop() {
    let dir = tempfile::tempdir().unwrap();
    let set = load(
        dir.path(),
        r#"
portals:
- ref: main
  name: Main Portal
"#,
    );

    let state = MemoryStateClient::new();
    let planner = Planner::new(&state);
    let options = PlanOptions::default();

    let first = planner.plan(&set, &options).unwrap();
    let runner = NoopRunner;
    let base = dir.path().to_path_buf();
    let executor = SequentialExecutor::new(&state, &runner, &base, "tok".to_string(), "addr".to_string());
    executor.execute(&first, &CancellationToken::new()).unwrap();

    let second = planner.plan(&set, &options).unwrap();
    assert_eq!(second.summary.create, 0);
    assert_eq!(second.summary.noop, 1);
}

#[test]
fn sync_mode_deletes_managed_objects_no_longer_in_the_desired_state() {
    let dir = tempfile::tempdir().unwrap();
    let set_with_extra = load(
        dir.path(),
        r#"
portals:
- ref: main
  name: Main Portal
- ref: staging
  name: Staging Portal
"#,
    );

    let state = MemoryStateClient::new();
    let planner = Planner::new(&state);
    let apply_options = PlanOptions { mode: PlanMode::Apply, generator: "kongctl".to_string(), deck_binary: "deck".to_string() };
    let plan = planner.plan(&set_with_extra, &apply_options).unwrap();
    let runner = NoopRunner;
    let base = dir.path().to_path_buf();
    let executor = SequentialExecutor::new(&state, &runner, &base, "tok".to_string(), "addr".to_string());
    executor.execute(&plan, &CancellationToken::new()).unwrap();

    let set_without_staging = load(
        dir.path(),
        r#"
portals:
- ref: main
  name: Main Portal
"#,
    );
    let sync_options = PlanOptions { mode: PlanMode::Sync, generator: "kongctl".to_string(), deck_binary: "deck".to_string() };
    let sync_plan = planner.plan(&set_without_staging, &sync_options).unwrap();

    assert_eq!(sync_plan.summary.delete, 1);
    let deleted = sync_plan.changes.iter().find(|c| c.resource_ref == "staging").unwrap();
    assert_eq!(deleted.action, kongctl::planner::Action::Delete);
}
