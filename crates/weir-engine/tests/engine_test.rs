//! End-to-end engine scenarios

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use weir_engine::memory::{BlockId, InMemoryStorageDriver, StorageDriverRegistry, VariableStorageDriver};
use weir_engine::notification::RecordingNotificationSender;
use weir_engine::persistence::{CommitError, CommitHandler, InMemoryWorkflowStateStore};
use weir_engine::prelude::*;
use weir_engine::state::{apply, extract};

// =============================================================================
// Test handlers and fixtures
// =============================================================================

/// Appends its `text` input to the `trace` workflow variable
struct AppendTrace;

#[async_trait]
impl ActivityHandler for AppendTrace {
    fn type_name(&self) -> &'static str {
        "append_trace"
    }

    async fn execute(&self, scope: &mut ActivityScope<'_>) -> Result<(), ActivityFault> {
        let text = scope
            .input_string("text")
            .ok_or_else(|| ActivityFault::new("append_trace requires a `text` input"))?;
        let mut trace = scope
            .get_variable("trace")
            .await?
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default();
        trace.push(Value::String(text));
        scope.set_variable("trace", Value::Array(trace)).await
    }
}

/// Copies a variable into a named workflow output
struct EchoVariable;

#[async_trait]
impl ActivityHandler for EchoVariable {
    fn type_name(&self) -> &'static str {
        "echo_variable"
    }

    async fn execute(&self, scope: &mut ActivityScope<'_>) -> Result<(), ActivityFault> {
        let from = scope
            .input_string("from")
            .ok_or_else(|| ActivityFault::new("echo_variable requires a `from` input"))?;
        let output_name = scope
            .input_string("output_name")
            .ok_or_else(|| ActivityFault::new("echo_variable requires an `output_name` input"))?;
        let value = scope.get_variable(&from).await?.unwrap_or(Value::Null);
        scope.set_workflow_output(output_name, value);
        Ok(())
    }
}

/// Commit handler that fails after a fixed number of commits
struct FlakyCommitter {
    inner: Arc<InMemoryWorkflowStateStore>,
    remaining: AtomicUsize,
}

impl FlakyCommitter {
    fn new(inner: Arc<InMemoryWorkflowStateStore>, allowed: usize) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(allowed),
        }
    }
}

#[async_trait]
impl CommitHandler for FlakyCommitter {
    async fn commit(&self, state: &WorkflowState) -> Result<(), CommitError> {
        if self.remaining.load(Ordering::SeqCst) == 0 {
            return Err(CommitError("injected commit failure".to_string()));
        }
        self.remaining.fetch_sub(1, Ordering::SeqCst);
        self.inner.commit(state).await
    }
}

fn test_registry() -> ActivityRegistry {
    let mut registry = activities::default_registry();
    registry.register(Arc::new(AppendTrace));
    registry.register(Arc::new(EchoVariable));
    registry
}

fn append(id: &str, text: &str) -> ActivityNode {
    ActivityNode::new(id, "append_trace").with_input("text", json!(text))
}

fn set_variable(id: &str, name: &str, value: Value) -> ActivityNode {
    ActivityNode::new(id, "set_variable")
        .with_input("name", json!(name))
        .with_input("value", value)
}

fn wait(id: &str, event_name: &str) -> ActivityNode {
    ActivityNode::new(id, "event").with_input("event_name", json!(event_name))
}

/// `Sequence[SetX(1), Wait("evt"), SetY(2)]`
fn suspend_resume_workflow() -> Arc<Workflow> {
    let root = ActivityNode::new("seq", "sequence")
        .with_child("activities", set_variable("setx", "x", json!(1)))
        .with_child("activities", wait("pause", "evt"))
        .with_child("activities", set_variable("sety", "y", json!(2)));
    Arc::new(
        Workflow::new("suspend-resume", root)
            .with_variable(Variable::workflow("x"))
            .with_variable(Variable::workflow("y")),
    )
}

fn root_variable(state: &WorkflowState, name: &str) -> Option<Value> {
    state
        .variables
        .get(&BlockId::new(name))
        .map(|block| block.value.clone())
}

// =============================================================================
// S1: linear sequence
// =============================================================================

#[tokio::test]
async fn test_linear_sequence_runs_to_completion() {
    let root = ActivityNode::new("seq", "sequence")
        .with_child("activities", append("a", "A"))
        .with_child("activities", append("b", "B"))
        .with_child("activities", append("c", "C"));
    let workflow = Arc::new(
        Workflow::new("linear", root)
            .with_variable(Variable::workflow("trace").with_default(json!([]))),
    );

    let runner = WorkflowRunner::new(test_registry());
    let result = runner
        .run(workflow, RunWorkflowOptions::new())
        .await
        .expect("should run");

    let state = &result.workflow_state;
    assert_eq!(state.status, WorkflowStatus::Finished);
    assert_eq!(state.sub_status, WorkflowSubStatus::Finished);
    assert_eq!(result.result, None);
    assert_eq!(root_variable(state, "trace"), Some(json!(["A", "B", "C"])));
    assert!(state.bookmarks.is_empty());

    // three child contexts recorded in execution order, all completed
    let children: Vec<_> = state
        .activity_execution_contexts
        .iter()
        .filter(|record| record.node_id.as_str() != "seq")
        .collect();
    assert_eq!(children.len(), 3);
    let order: Vec<&str> = children.iter().map(|r| r.node_id.as_str()).collect();
    assert_eq!(order, ["seq:a", "seq:b", "seq:c"]);
    assert!(children.iter().all(|r| r.status == ActivityStatus::Completed));

    // finished runs hold no pending or executing work
    assert!(state.scheduler.is_empty());
    assert!(state
        .activity_execution_contexts
        .iter()
        .all(|r| !r.is_executing));
}

// =============================================================================
// S2: bookmark suspend and resume
// =============================================================================

#[tokio::test]
async fn test_bookmark_suspend_and_resume() {
    let workflow = suspend_resume_workflow();
    let runner = WorkflowRunner::new(test_registry());

    let first = runner
        .run(workflow.clone(), RunWorkflowOptions::new())
        .await
        .expect("should suspend");

    let state = first.workflow_state;
    assert_eq!(state.status, WorkflowStatus::Running);
    assert_eq!(state.sub_status, WorkflowSubStatus::Suspended);
    assert_eq!(state.bookmarks.len(), 1);
    assert_eq!(state.bookmarks[0].name, "evt");
    assert_eq!(root_variable(&state, "x"), Some(json!(1)));
    assert_eq!(root_variable(&state, "y"), Some(Value::Null));

    // every bookmark points at a live execution context
    for bookmark in &state.bookmarks {
        assert!(state
            .activity_execution_contexts
            .iter()
            .any(|r| r.id == bookmark.activity_instance_id));
    }

    let bookmark_id = state.bookmarks[0].id;
    let second = runner
        .resume(
            workflow,
            state,
            RunWorkflowOptions::new().with_bookmark(bookmark_id),
        )
        .await
        .expect("should finish");

    let state = second.workflow_state;
    assert_eq!(state.sub_status, WorkflowSubStatus::Finished);
    assert_eq!(root_variable(&state, "y"), Some(json!(2)));
    assert!(state.bookmarks.is_empty());
}

// =============================================================================
// S3: fault propagation
// =============================================================================

#[tokio::test]
async fn test_fault_propagates_to_root() {
    let root = ActivityNode::new("seq", "sequence")
        .with_child("activities", append("a", "A"))
        .with_child(
            "activities",
            ActivityNode::new("boom", "fault").with_input("message", json!("boom")),
        )
        .with_child("activities", append("c", "C"));
    let workflow = Arc::new(
        Workflow::new("faulty", root)
            .with_variable(Variable::workflow("trace").with_default(json!([]))),
    );

    let runner = WorkflowRunner::new(test_registry());
    let result = runner
        .run(workflow, RunWorkflowOptions::new())
        .await
        .expect("faults surface as incidents, not errors");

    let state = &result.workflow_state;
    assert_eq!(state.status, WorkflowStatus::Finished);
    assert_eq!(state.sub_status, WorkflowSubStatus::Faulted);
    assert_eq!(state.incidents.len(), 1);
    assert_eq!(state.incidents[0].message, "boom");

    // the activity after the fault was never reached
    assert!(!state
        .activity_execution_contexts
        .iter()
        .any(|r| r.node_id.as_str() == "seq:c"));
    assert_eq!(root_variable(state, "trace"), Some(json!(["A"])));
    assert!(state.scheduler.is_empty());
}

#[tokio::test]
async fn test_contained_fault_keeps_workflow_running() {
    let root = ActivityNode::new("seq", "sequence")
        .with_child(
            "activities",
            ActivityNode::new("boom", "fault").with_input("message", json!("boom")),
        )
        .with_child("activities", append("after", "C"));
    let workflow = Arc::new(
        Workflow::new("contained", root)
            .with_variable(Variable::workflow("trace").with_default(json!([])))
            .with_fault_strategy(FaultStrategy::Contain),
    );

    let runner = WorkflowRunner::new(test_registry());
    let result = runner
        .run(workflow, RunWorkflowOptions::new())
        .await
        .expect("should run");

    let state = &result.workflow_state;
    assert_eq!(state.sub_status, WorkflowSubStatus::Finished);
    assert_eq!(state.incidents.len(), 1);
    assert_eq!(root_variable(state, "trace"), Some(json!(["C"])));
}

// =============================================================================
// S4: parallel composite
// =============================================================================

#[tokio::test]
async fn test_parallel_waits_resume_independently() {
    let root = ActivityNode::new("par", "parallel")
        .with_child("branches", wait("wait_a", "a"))
        .with_child("branches", wait("wait_b", "b"));
    let workflow = Arc::new(Workflow::new("parallel", root));

    let runner = WorkflowRunner::new(test_registry());
    let fresh = runner
        .run(workflow.clone(), RunWorkflowOptions::new())
        .await
        .expect("should suspend");

    let state = fresh.workflow_state;
    assert_eq!(state.sub_status, WorkflowSubStatus::Suspended);
    assert_eq!(state.bookmarks.len(), 2);
    for node in ["par:wait_a", "par:wait_b"] {
        let record = state
            .activity_execution_contexts
            .iter()
            .find(|r| r.node_id.as_str() == node)
            .expect("wait context should exist");
        assert!(record.is_executing);
    }

    let bookmark_a = state
        .bookmarks
        .iter()
        .find(|b| b.name == "a")
        .expect("bookmark a")
        .id;
    let after_a = runner
        .resume(
            workflow.clone(),
            state,
            RunWorkflowOptions::new().with_bookmark(bookmark_a),
        )
        .await
        .expect("should stay suspended");

    let state = after_a.workflow_state;
    assert_eq!(state.sub_status, WorkflowSubStatus::Suspended);
    assert_eq!(state.bookmarks.len(), 1);
    assert_eq!(state.bookmarks[0].name, "b");

    let bookmark_b = state.bookmarks[0].id;
    let after_b = runner
        .resume(
            workflow,
            state,
            RunWorkflowOptions::new().with_bookmark(bookmark_b),
        )
        .await
        .expect("should finish");

    assert_eq!(
        after_b.workflow_state.sub_status,
        WorkflowSubStatus::Finished
    );
    assert!(after_b.workflow_state.bookmarks.is_empty());
}

// =============================================================================
// S5: interrupted resumption
// =============================================================================

#[tokio::test]
async fn test_interrupted_run_resumes_from_checkpoint() {
    let root = ActivityNode::new("seq", "sequence")
        .with_child("activities", set_variable("seta", "x", json!(1)))
        .with_child("activities", set_variable("setb", "y", json!(2)));
    let workflow = Arc::new(
        Workflow::new("interrupted", root)
            .with_variable(Variable::workflow("x"))
            .with_variable(Variable::workflow("y")),
    );

    let store = Arc::new(InMemoryWorkflowStateStore::new());
    let instance_id = Uuid::now_v7();

    // First runner: the committer accepts one checkpoint, then fails the
    // turn mid-flight.
    let flaky = WorkflowRunner::builder(test_registry())
        .committer(Arc::new(FlakyCommitter::new(store.clone(), 1)))
        .build();
    let error = flaky
        .run(
            workflow.clone(),
            RunWorkflowOptions::new().with_instance_id(instance_id),
        )
        .await
        .expect_err("turn should abort on commit failure");
    assert!(matches!(error, EngineError::Commit(_)));

    // The surviving checkpoint is mid-turn: the root context took
    // ownership of the popped work item but nothing else ran.
    let persisted = store
        .load(instance_id)
        .await
        .expect("should load")
        .expect("checkpoint should exist");
    assert_eq!(persisted.sub_status, WorkflowSubStatus::Executing);
    assert!(persisted.scheduler.is_empty());
    assert!(persisted.bookmarks.is_empty());
    let executing: Vec<_> = persisted
        .activity_execution_contexts
        .iter()
        .filter(|r| r.is_executing)
        .collect();
    assert_eq!(executing.len(), 1);
    assert_eq!(executing[0].node_id.as_str(), "seq");

    // Second runner: reload and resume; the runner must reschedule the
    // interrupted context and complete normally.
    let steady = WorkflowRunner::builder(test_registry())
        .committer(store.clone())
        .build();
    let result = steady
        .resume(workflow, persisted, RunWorkflowOptions::new())
        .await
        .expect("should recover");

    let state = &result.workflow_state;
    assert_eq!(state.sub_status, WorkflowSubStatus::Finished);
    assert_eq!(root_variable(state, "x"), Some(json!(1)));
    assert_eq!(root_variable(state, "y"), Some(json!(2)));
}

// =============================================================================
// S6: state round trip
// =============================================================================

#[tokio::test]
async fn test_suspended_state_round_trips_through_bytes() {
    let workflow = suspend_resume_workflow();
    let runner = WorkflowRunner::new(test_registry());

    let suspended = runner
        .run(workflow.clone(), RunWorkflowOptions::new())
        .await
        .expect("should suspend");
    let original = suspended.workflow_state;

    let bytes = serde_json::to_vec(&original).expect("should serialize");
    let decoded: Value = serde_json::from_slice(&bytes).expect("should parse");
    let state = WorkflowState::from_value(decoded).expect("should decode");

    let graph = Arc::new(WorkflowGraph::new(workflow.clone()));
    let rebuilt = apply(state, graph).expect("should apply");
    assert_eq!(extract(&rebuilt), original);

    // the rebuilt context is executable: resuming it finishes the run
    let bookmark_id = original.bookmarks[0].id;
    let finished = runner
        .resume(
            workflow,
            extract(&rebuilt),
            RunWorkflowOptions::new().with_bookmark(bookmark_id),
        )
        .await
        .expect("should finish");
    assert_eq!(
        finished.workflow_state.sub_status,
        WorkflowSubStatus::Finished
    );
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_notification_ordering() {
    let root = ActivityNode::new("seq", "sequence")
        .with_child("activities", append("a", "A"))
        .with_child("activities", append("b", "B"));
    let workflow = Arc::new(
        Workflow::new("notify", root)
            .with_variable(Variable::workflow("trace").with_default(json!([]))),
    );

    let recorder = Arc::new(RecordingNotificationSender::new());
    let runner = WorkflowRunner::builder(test_registry())
        .notifications(recorder.clone())
        .build();
    runner
        .run(workflow, RunWorkflowOptions::new())
        .await
        .expect("should run");

    let kinds = recorder.kinds();
    assert_eq!(
        kinds,
        [
            "workflow_executing",
            "workflow_started",
            "activity_executing", // sequence
            "activity_executed",
            "activity_executing", // a
            "activity_executed",
            "activity_executing", // b
            "activity_executed",
            "workflow_finished",
            "workflow_executed",
        ]
    );
}

#[tokio::test]
async fn test_workflow_started_not_emitted_on_resume() {
    let workflow = suspend_resume_workflow();
    let recorder = Arc::new(RecordingNotificationSender::new());
    let runner = WorkflowRunner::builder(test_registry())
        .notifications(recorder.clone())
        .build();

    let first = runner
        .run(workflow.clone(), RunWorkflowOptions::new())
        .await
        .expect("should suspend");
    let started_in_first = recorder
        .kinds()
        .iter()
        .filter(|k| **k == "workflow_started")
        .count();
    assert_eq!(started_in_first, 1);

    let bookmark_id = first.workflow_state.bookmarks[0].id;
    runner
        .resume(
            workflow,
            first.workflow_state,
            RunWorkflowOptions::new().with_bookmark(bookmark_id),
        )
        .await
        .expect("should finish");

    let total_started = recorder
        .kinds()
        .iter()
        .filter(|k| **k == "workflow_started")
        .count();
    assert_eq!(total_started, 1, "resume must not re-emit workflow_started");
}

// =============================================================================
// Dynamic variables
// =============================================================================

#[tokio::test]
async fn test_dynamic_variables_visible_in_turn_and_across_turns() {
    let root = ActivityNode::new("seq", "sequence")
        .with_child(
            "activities",
            ActivityNode::new("echo1", "echo_variable")
                .with_input("from", json!("greeting"))
                .with_input("output_name", json!("first")),
        )
        .with_child("activities", wait("pause", "evt"))
        .with_child(
            "activities",
            ActivityNode::new("echo2", "echo_variable")
                .with_input("from", json!("greeting"))
                .with_input("output_name", json!("second")),
        );
    let workflow = Arc::new(Workflow::new("dynamic-vars", root));

    let runner = WorkflowRunner::new(test_registry());
    let first = runner
        .run(
            workflow.clone(),
            RunWorkflowOptions::new().with_variable("greeting", json!("hi")),
        )
        .await
        .expect("should suspend");

    // visible to activities in the seeding turn
    assert_eq!(
        first.workflow_execution_context.output.get("first"),
        Some(&json!("hi"))
    );
    // persisted as a dynamic root binding
    assert_eq!(
        root_variable(&first.workflow_state, "greeting"),
        Some(json!("hi"))
    );

    let bookmark_id = first.workflow_state.bookmarks[0].id;
    let second = runner
        .resume(
            workflow,
            first.workflow_state,
            RunWorkflowOptions::new().with_bookmark(bookmark_id),
        )
        .await
        .expect("should finish");

    // still visible after rehydration in a later turn
    assert_eq!(
        second.workflow_execution_context.output.get("second"),
        Some(&json!("hi"))
    );
}

// =============================================================================
// Storage-driven variables
// =============================================================================

#[tokio::test]
async fn test_storage_driven_variable_delegates_to_driver() {
    let root = ActivityNode::new("seq", "sequence")
        .with_child("activities", set_variable("put", "blob", json!("payload")));
    let workflow = Arc::new(
        Workflow::new("storage", root)
            .with_variable(Variable::workflow("blob").with_storage_driver("mem")),
    );

    let driver = Arc::new(InMemoryStorageDriver::new());
    let mut drivers = StorageDriverRegistry::new();
    drivers.register("mem", driver.clone());

    let instance_id = Uuid::now_v7();
    let runner = WorkflowRunner::builder(test_registry())
        .storage_drivers(Arc::new(drivers))
        .build();
    let result = runner
        .run(
            workflow,
            RunWorkflowOptions::new().with_instance_id(instance_id),
        )
        .await
        .expect("should run");

    assert_eq!(
        result.workflow_state.sub_status,
        WorkflowSubStatus::Finished
    );

    // the value lives in the driver, not the snapshot
    let stored = driver
        .read(instance_id, &BlockId::new("blob"))
        .await
        .expect("should read");
    assert_eq!(stored, Some(json!("payload")));
    let block = result
        .workflow_state
        .variables
        .get(&BlockId::new("blob"))
        .expect("block should persist");
    assert_eq!(block.driver.as_deref(), Some("mem"));
    assert_eq!(block.value, Value::Null);
}

// =============================================================================
// Results and early completion
// =============================================================================

#[tokio::test]
async fn test_finish_binds_result_variable() {
    let root = ActivityNode::new("seq", "sequence")
        .with_child("activities", append("a", "A"))
        .with_child(
            "activities",
            ActivityNode::new("done", "finish").with_input("result", json!(42)),
        )
        .with_child("activities", append("never", "B"));
    let workflow = Arc::new(
        Workflow::new("early-finish", root)
            .with_variable(Variable::workflow("trace").with_default(json!([])))
            .with_variable(Variable::workflow("answer"))
            .with_result_variable("answer"),
    );

    let runner = WorkflowRunner::new(test_registry());
    let result = runner
        .run(workflow, RunWorkflowOptions::new())
        .await
        .expect("should run");

    assert_eq!(
        result.workflow_state.sub_status,
        WorkflowSubStatus::Finished
    );
    assert_eq!(result.result, Some(json!(42)));
    assert_eq!(
        root_variable(&result.workflow_state, "trace"),
        Some(json!(["A"]))
    );
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancellation_commits_cancelled_state() {
    let root = ActivityNode::new("seq", "sequence")
        .with_child("activities", append("a", "A"));
    let workflow = Arc::new(
        Workflow::new("cancelled", root)
            .with_variable(Variable::workflow("trace").with_default(json!([]))),
    );

    let token = CancellationToken::new();
    token.cancel();

    let store = Arc::new(InMemoryWorkflowStateStore::new());
    let instance_id = Uuid::now_v7();
    let runner = WorkflowRunner::builder(test_registry())
        .committer(store.clone())
        .build();
    let result = runner
        .run(
            workflow,
            RunWorkflowOptions::new()
                .with_instance_id(instance_id)
                .with_cancellation(token),
        )
        .await
        .expect("cancellation is not an error");

    assert_eq!(result.workflow_state.status, WorkflowStatus::Finished);
    assert_eq!(
        result.workflow_state.sub_status,
        WorkflowSubStatus::Cancelled
    );
    assert_eq!(root_variable(&result.workflow_state, "trace"), Some(json!([])));

    let persisted = store
        .load(instance_id)
        .await
        .expect("should load")
        .expect("state should be committed");
    assert_eq!(persisted.sub_status, WorkflowSubStatus::Cancelled);
}

// =============================================================================
// Seeding errors
// =============================================================================

#[tokio::test]
async fn test_seeding_error_paths() {
    let workflow = suspend_resume_workflow();
    let runner = WorkflowRunner::new(test_registry());
    let suspended = runner
        .run(workflow.clone(), RunWorkflowOptions::new())
        .await
        .expect("should suspend");
    let state = suspended.workflow_state;

    let unknown_bookmark = runner
        .resume(
            workflow.clone(),
            state.clone(),
            RunWorkflowOptions::new().with_bookmark(Uuid::now_v7()),
        )
        .await;
    assert!(matches!(
        unknown_bookmark,
        Err(EngineError::BookmarkNotFound(_))
    ));

    let unknown_context = runner
        .resume(
            workflow.clone(),
            state.clone(),
            RunWorkflowOptions::new()
                .with_activity_handle(ActivityHandle::instance(Uuid::now_v7())),
        )
        .await;
    assert!(matches!(
        unknown_context,
        Err(EngineError::ContextNotFound(_))
    ));

    let unknown_activity = runner
        .resume(
            workflow.clone(),
            state.clone(),
            RunWorkflowOptions::new()
                .with_activity_handle(ActivityHandle::activity("does-not-exist")),
        )
        .await;
    assert!(matches!(
        unknown_activity,
        Err(EngineError::ActivityNotFound(_))
    ));

    let conflicting = runner
        .resume(
            workflow,
            state,
            RunWorkflowOptions::new()
                .with_bookmark(Uuid::now_v7())
                .with_activity_handle(ActivityHandle::activity("setx")),
        )
        .await;
    assert!(matches!(conflicting, Err(EngineError::InvalidOptions(_))));
}

#[tokio::test]
async fn test_resume_by_activity_handle_schedules_activity() {
    let workflow = suspend_resume_workflow();
    let runner = WorkflowRunner::new(test_registry());
    let suspended = runner
        .run(workflow.clone(), RunWorkflowOptions::new())
        .await
        .expect("should suspend");

    let result = runner
        .resume(
            workflow,
            suspended.workflow_state,
            RunWorkflowOptions::new()
                .with_activity_handle(ActivityHandle::activity("setx")),
        )
        .await
        .expect("should run the named activity");

    // the wait bookmark is untouched, so the run suspends again; the
    // re-run activity produced a second context for its node
    let state = &result.workflow_state;
    assert_eq!(state.sub_status, WorkflowSubStatus::Suspended);
    assert_eq!(state.bookmarks.len(), 1);
    let setx_runs = state
        .activity_execution_contexts
        .iter()
        .filter(|r| r.node_id.as_str() == "seq:setx")
        .count();
    assert_eq!(setx_runs, 2);
}

// =============================================================================
// Scheduler fairness
// =============================================================================

#[tokio::test]
async fn test_composite_children_run_before_earlier_siblings() {
    // Parallel schedules both branches up front; when the sequence branch
    // starts, its children must run before the sibling branch that was
    // already queued (depth-first descent via prepend).
    let inner = ActivityNode::new("inner", "sequence")
        .with_child("activities", append("i1", "I1"))
        .with_child("activities", append("i2", "I2"));
    let root = ActivityNode::new("par", "parallel")
        .with_child("branches", inner)
        .with_child("branches", append("sibling", "Z"));
    let workflow = Arc::new(
        Workflow::new("descent", root)
            .with_variable(Variable::workflow("trace").with_default(json!([]))),
    );

    let runner = WorkflowRunner::new(test_registry());
    let result = runner
        .run(workflow, RunWorkflowOptions::new())
        .await
        .expect("should run");

    assert_eq!(
        root_variable(&result.workflow_state, "trace"),
        Some(json!(["I1", "I2", "Z"]))
    );
    assert_eq!(
        result.workflow_state.sub_status,
        WorkflowSubStatus::Finished
    );
}
