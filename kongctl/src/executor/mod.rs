//! Executor (§4.H): applies `plan.changes` in topological order, honoring
//! `depends_on`, substituting placeholders as earlier changes resolve, and
//! classifying failures through the §7 error taxonomy.

mod errors;

pub use errors::{backoff_delay, classify, ErrorClass};

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::error::execution;
use crate::external_tool::{RunOptions, Runner};
use crate::planner::{Action, Plan, PlannedChange};
use crate::state::{Create, Delete, List, StateClient, Update};
use crate::Result;

/// Cooperative cancellation flag (§5): checked between changes, never
/// mid-flight, so the current HTTP call or `deck` invocation always
/// completes before execution stops.
#[derive(Clone)]
pub struct CancellationToken(Arc<AtomicBool>);

impl Default for CancellationToken {
    fn default() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Noop,
    SkippedDueToDependency,
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ChangeResult {
    pub change_id: String,
    pub resource_ref: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub results: Vec<ChangeResult>,
}

impl ExecutionReport {
    pub fn success(&self) -> bool {
        !self.results.iter().any(|r| matches!(r.outcome, Outcome::Failed(_)))
    }
}

pub trait Executor {
    fn execute(&self, plan: &Plan, cancel: &CancellationToken) -> Result<ExecutionReport>;
}

struct Resolved {
    id: String,
    fields: serde_json::Map<String, serde_json::Value>,
}

pub struct SequentialExecutor<'a> {
    state: &'a dyn StateClient,
    runner: &'a dyn Runner,
    deck_binary_path: &'a Path,
    konnect_token: String,
    konnect_address: String,
}

impl<'a> SequentialExecutor<'a> {
    pub fn new(state: &'a dyn StateClient, runner: &'a dyn Runner, deck_binary_path: &'a Path, konnect_token: String, konnect_address: String) -> Self {
        SequentialExecutor {
            state,
            runner,
            deck_binary_path,
            konnect_token,
            konnect_address,
        }
    }

    fn apply_one(&self, change: &PlannedChange, resolved: &HashMap<String, Resolved>) -> Result<Option<Resolved>> {
        let fields = substitute_placeholders(&change.fields, resolved);

        match change.action {
            Action::Noop => Ok(None),
            Action::Create => {
                let parent_id = change.parent_ref.as_ref().and_then(|r| resolved.get(r)).map(|r| r.id.as_str());
                let obj = retry(|| self.state.create(change.resource_type, parent_id, fields.clone()))?;
                Ok(Some(Resolved { id: obj.id, fields: obj.fields }))
            }
            Action::Update => {
                let id = change.resource_id.clone().ok_or_else(|| execution(format!("update for '{}' has no resource_id", change.resource_ref)))?;
                let obj = retry(|| self.state.update(change.resource_type, &id, fields.clone()))?;
                Ok(Some(Resolved { id: obj.id, fields: obj.fields }))
            }
            Action::Delete => {
                let id = change.resource_id.clone().ok_or_else(|| execution(format!("delete for '{}' has no resource_id", change.resource_ref)))?;
                retry(|| self.state.delete(change.resource_type, &id))?;
                Ok(None)
            }
            Action::ExternalTool => {
                let tool = change.tool.as_ref().ok_or_else(|| execution("external_tool change has no tool invocation".to_string()))?;
                for step in &tool.steps {
                    let options = RunOptions {
                        args: step.clone(),
                        mode: "apply".to_string(),
                        konnect_token: self.konnect_token.clone(),
                        konnect_control_plane_name: tool.control_plane_ref.clone(),
                        konnect_address: self.konnect_address.clone(),
                    };
                    self.runner.run(&tool.binary, &options, self.deck_binary_path)?;
                }
                Ok(None)
            }
        }
    }

    /// After a `deck` step runs, the gateway services it created only exist
    /// on the provider side; this looks each post-resolution target up by
    /// its `external.selector` match fields so dependents can resolve
    /// `__REF__:<ref>#id` placeholders against a real id.
    fn resolve_post_resolution_targets(&self, change: &PlannedChange, resolved: &mut HashMap<String, Resolved>) -> Result<()> {
        if change.post_resolution_targets.is_empty() {
            return Ok(());
        }
        let remote = self.state.list(kongctl_definitions::ResourceType::GatewayService, None)?;
        for target in &change.post_resolution_targets {
            let found = remote.iter().find(|obj| {
                target.selector.iter().all(|(k, v)| obj.fields.get(k).and_then(|f| f.as_str()) == Some(v.as_str()))
            });
            if let Some(obj) = found {
                resolved.insert(target.resource_ref.clone(), Resolved { id: obj.id.clone(), fields: obj.fields.clone() });
            }
        }
        Ok(())
    }
}

fn substitute_placeholders(fields: &serde_json::Map<String, serde_json::Value>, resolved: &HashMap<String, Resolved>) -> serde_json::Map<String, serde_json::Value> {
    let mut out = serde_json::Map::with_capacity(fields.len());
    for (k, v) in fields {
        let replaced = match v.as_str().and_then(|s| s.strip_prefix("__REF__:")) {
            Some(rest) => {
                let mut parts = rest.splitn(2, '#');
                let target_ref = parts.next().unwrap_or_default();
                let field = parts.next().unwrap_or("id");
                resolved
                    .get(target_ref)
                    .and_then(|r| if field == "id" { Some(serde_json::Value::String(r.id.clone())) } else { r.fields.get(field).cloned() })
                    .unwrap_or_else(|| v.clone())
            }
            None => v.clone(),
        };
        out.insert(k.clone(), replaced);
    }
    out
}

fn retry<T, F: FnMut() -> Result<T>>(mut f: F) -> Result<T> {
    let mut attempt = 0;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let class = errors::classify(&e);
                if !errors::is_retryable(class) || attempt + 1 >= errors::max_attempts() {
                    return Err(e);
                }
                thread::sleep(errors::backoff_delay(attempt));
                attempt += 1;
            }
        }
    }
}

fn dependency_failed(depends_on: &[String], results: &HashMap<String, Outcome>) -> bool {
    depends_on.iter().any(|d| matches!(results.get(d), Some(Outcome::Failed(_)) | Some(Outcome::SkippedDueToDependency)))
}

impl<'a> Executor for SequentialExecutor<'a> {
    fn execute(&self, plan: &Plan, cancel: &CancellationToken) -> Result<ExecutionReport> {
        let order = topo_order(&plan.changes)?;
        let mut results: HashMap<String, Outcome> = HashMap::new();
        let mut resolved: HashMap<String, Resolved> = HashMap::new();
        let mut report = ExecutionReport::default();

        for change in order {
            if cancel.is_cancelled() {
                results.insert(change.id.clone(), Outcome::Cancelled);
                report.results.push(ChangeResult { change_id: change.id.clone(), resource_ref: change.resource_ref.clone(), outcome: Outcome::Cancelled });
                continue;
            }
            if dependency_failed(&change.depends_on, &results) {
                results.insert(change.id.clone(), Outcome::SkippedDueToDependency);
                report.results.push(ChangeResult { change_id: change.id.clone(), resource_ref: change.resource_ref.clone(), outcome: Outcome::SkippedDueToDependency });
                continue;
            }

            let outcome = match self.apply_one(change, &resolved) {
                Ok(Some(r)) => {
                    resolved.insert(change.resource_ref.clone(), r);
                    Outcome::Applied
                }
                Ok(None) => {
                    if change.action == Action::ExternalTool {
                        if let Err(e) = self.resolve_post_resolution_targets(change, &mut resolved) {
                            results.insert(change.id.clone(), Outcome::Failed(e.to_string()));
                            report.results.push(ChangeResult { change_id: change.id.clone(), resource_ref: change.resource_ref.clone(), outcome: Outcome::Failed(e.to_string()) });
                            continue;
                        }
                        Outcome::Applied
                    } else {
                        Outcome::Noop
                    }
                }
                Err(e) => Outcome::Failed(e.to_string()),
            };
            results.insert(change.id.clone(), outcome.clone());
            report.results.push(ChangeResult { change_id: change.id.clone(), resource_ref: change.resource_ref.clone(), outcome });
        }
        Ok(report)
    }
}

/// Orders `changes` so every dependency precedes its dependents, breaking
/// ties by the planner's own stable `(kind_priority, ref)` order (already
/// reflected in `changes`'s incoming order).
fn topo_order(changes: &[PlannedChange]) -> Result<Vec<&PlannedChange>> {
    let by_id: HashMap<&str, &PlannedChange> = changes.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut order = Vec::with_capacity(changes.len());

    fn visit<'a>(
        id: &'a str,
        by_id: &HashMap<&'a str, &'a PlannedChange>,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
        order: &mut Vec<&'a PlannedChange>,
    ) -> Result<()> {
        if visited.contains(id) {
            return Ok(());
        }
        if stack.contains(&id) {
            return Err(execution(format!("cyclic dependency detected at '{}'", id)));
        }
        let Some(change) = by_id.get(id) else { return Ok(()) };
        stack.push(id);
        for dep in &change.depends_on {
            visit(dep.as_str(), by_id, visited, stack, order)?;
        }
        stack.pop();
        visited.insert(id);
        order.push(change);
        Ok(())
    }

    let mut stack = Vec::new();
    for change in changes {
        visit(&change.id, &by_id, &mut visited, &mut stack, &mut order)?;
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_tool::RunOutput;
    use crate::planner::{PlanMode, PlanSummary};
    use crate::state::memory::MemoryStateClient;
    use kongctl_definitions::ResourceType;

    struct NoopRunner;
    impl Runner for NoopRunner {
        fn run(&self, _binary: &str, _options: &RunOptions, _base_dir: &Path) -> Result<RunOutput> {
            Ok(RunOutput::default())
        }
    }

    struct FailingRunner;
    impl Runner for FailingRunner {
        fn run(&self, _binary: &str, _options: &RunOptions, _base_dir: &Path) -> Result<RunOutput> {
            Err(execution("boom".to_string()))
        }
    }

    fn create_change(id: &str, r: &str, depends_on: Vec<&str>) -> PlannedChange {
        PlannedChange {
            id: id.to_string(),
            action: Action::Create,
            resource_type: ResourceType::Portal,
            resource_ref: r.to_string(),
            resource_id: None,
            parent_ref: None,
            fields: serde_json::Map::new(),
            depends_on: depends_on.into_iter().map(String::from).collect(),
            protection: None,
            post_resolution_targets: Vec::new(),
            tool: None,
        }
    }

    fn plan_of(changes: Vec<PlannedChange>) -> Plan {
        Plan {
            mode: PlanMode::Apply,
            generator: "kongctl".to_string(),
            changes,
            summary: PlanSummary::default(),
        }
    }

    #[test]
    fn applies_changes_in_dependency_order() {
        let state = MemoryStateClient::new();
        let runner = NoopRunner;
        let dir = std::env::temp_dir();
        let executor = SequentialExecutor::new(&state, &runner, &dir, "tok".to_string(), "addr".to_string());

        let plan = plan_of(vec![create_change("portal:b", "b", vec!["portal:a"]), create_change("portal:a", "a", vec![])]);
        let report = executor.execute(&plan, &CancellationToken::new()).unwrap();

        assert!(report.success());
        let order: Vec<&str> = report.results.iter().map(|r| r.change_id.as_str()).collect();
        assert_eq!(order, vec!["portal:a", "portal:b"]);
    }

    #[test]
    fn skips_dependents_of_a_failed_change() {
        let state = MemoryStateClient::new();
        let mut parent = create_change("portal:a", "a", vec![]);
        parent.resource_id = Some("does-not-matter".to_string());
        parent.action = Action::Update; // no remote object exists -> update fails
        let child = create_change("portal:b", "b", vec!["portal:a"]);

        let runner = NoopRunner;
        let dir = std::env::temp_dir();
        let executor = SequentialExecutor::new(&state, &runner, &dir, "tok".to_string(), "addr".to_string());
        let plan = plan_of(vec![parent, child]);
        let report = executor.execute(&plan, &CancellationToken::new()).unwrap();

        assert!(!report.success());
        assert!(matches!(report.results[0].outcome, Outcome::Failed(_)));
        assert_eq!(report.results[1].outcome, Outcome::SkippedDueToDependency);
    }

    #[test]
    fn external_tool_failure_is_reported() {
        let state = MemoryStateClient::new();
        let runner = FailingRunner;
        let dir = std::env::temp_dir();
        let executor = SequentialExecutor::new(&state, &runner, &dir, "tok".to_string(), "addr".to_string());

        let mut change = create_change("deck:cp1", "cp1::deck", vec![]);
        change.action = Action::ExternalTool;
        change.tool = Some(crate::planner::DeckToolInvocation {
            control_plane_ref: "cp1".to_string(),
            binary: "deck".to_string(),
            steps: vec![vec!["gateway".to_string(), "sync".to_string()]],
        });

        let plan = plan_of(vec![change]);
        let report = executor.execute(&plan, &CancellationToken::new()).unwrap();
        assert!(matches!(report.results[0].outcome, Outcome::Failed(_)));
    }

    #[test]
    fn cancellation_marks_remaining_changes_cancelled() {
        let state = MemoryStateClient::new();
        let runner = NoopRunner;
        let dir = std::env::temp_dir();
        let executor = SequentialExecutor::new(&state, &runner, &dir, "tok".to_string(), "addr".to_string());

        let token = CancellationToken::new();
        token.cancel();
        let plan = plan_of(vec![create_change("portal:a", "a", vec![]), create_change("portal:b", "b", vec![])]);
        let report = executor.execute(&plan, &token).unwrap();

        assert_eq!(report.results[0].outcome, Outcome::Cancelled);
        assert_eq!(report.results[1].outcome, Outcome::Cancelled);
    }
}
