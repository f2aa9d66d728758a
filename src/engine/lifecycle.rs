use std::sync::Arc;

use crate::catalog::AgentCatalog;
use crate::executor::{ActionExecutor, ExecutionOutcome};
use crate::lifecycle::{RunEvent, RunStateMachine};
use crate::store::{RunStore, StoreError};
use crate::types::{Message, Run, RunCreateRequest, RunError, RunId, RunMode, RunStatus};

/// Orchestrates run creation, dispatch, execution, and terminal-state
/// transition. All state transitions are applied through the store's
/// atomic `mutate`, so a completing worker and a concurrent cancel request
/// can never produce a lost update.
pub struct RunLifecycle {
    store: Arc<dyn RunStore>,
    catalog: Arc<AgentCatalog>,
    executor: Arc<dyn ActionExecutor>,
}

impl RunLifecycle {
    pub fn new(
        store: Arc<dyn RunStore>,
        catalog: Arc<AgentCatalog>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Self {
        Self {
            store,
            catalog,
            executor,
        }
    }

    /// Creates a run and dispatches it. SYNC blocks until the record is
    /// terminal (or AWAITING); ASYNC returns the IN_PROGRESS snapshot
    /// immediately and executes on a worker task. An unknown agent name is
    /// recorded as a FAILED run, not rejected.
    pub async fn create_run(&self, request: RunCreateRequest) -> Result<Run, StoreError> {
        let run = Run::new(
            request.agent_name.clone(),
            request.session_id,
            request.input.clone(),
        );
        let run_id = run.run_id;
        self.store.put(run);

        if !self.catalog.contains(&request.agent_name) {
            log::warn!(
                "run {} references unknown agent '{}'",
                run_id,
                request.agent_name
            );
            return self.store.mutate(&run_id, &mut |run| {
                Self::apply(run, RunEvent::Dispatched);
                run.error = Some(RunError::new(
                    RunError::AGENT_NOT_FOUND,
                    format!("no agent named '{}'", run.agent_name),
                ));
                Self::apply(run, RunEvent::Failed);
            });
        }

        // The IN_PROGRESS transition is visible in the store before any
        // worker is scheduled, so an async caller can never observe
        // CREATED after this returns.
        let in_flight = self.store.mutate(&run_id, &mut |run| {
            Self::apply(run, RunEvent::Dispatched);
        })?;

        match request.mode {
            RunMode::Sync => {
                Self::drive(
                    self.store.clone(),
                    self.executor.clone(),
                    run_id,
                    request.agent_name,
                    request.input,
                )
                .await
            }
            RunMode::Async => {
                let store = self.store.clone();
                let executor = self.executor.clone();
                tokio::spawn(async move {
                    if let Err(e) =
                        Self::drive(store, executor, run_id, request.agent_name, request.input)
                            .await
                    {
                        log::error!("async run {} lost its record: {}", run_id, e);
                    }
                });
                Ok(in_flight)
            }
        }
    }

    pub fn get_run(&self, id: &RunId) -> Result<Run, StoreError> {
        self.store.get(id)
    }

    /// Flags cancellation intent. Cooperative and best-effort: an in-flight
    /// execution is not interrupted, but its result is discarded at the
    /// completion boundary. Cancelling a terminal run returns the frozen
    /// record unchanged.
    pub fn cancel_run(&self, id: &RunId) -> Result<Run, StoreError> {
        self.store.mutate(id, &mut |run| match run.status {
            RunStatus::InProgress => {
                Self::apply(run, RunEvent::CancelRequested);
            }
            RunStatus::Created | RunStatus::Awaiting => {
                // No execution in flight, so there is nobody left to
                // acknowledge; the cancel completes immediately.
                Self::apply(run, RunEvent::CancelRequested);
                Self::apply(run, RunEvent::CancelAcknowledged);
            }
            RunStatus::Cancelling => {}
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled => {}
        })
    }

    /// Re-enters the executor path for an AWAITING run, appending the
    /// resume input to the retained request input. Any other status is a
    /// no-op returning the current record.
    pub async fn resume_run(&self, id: &RunId, input: Vec<Message>) -> Result<Run, StoreError> {
        let mut resumed = false;
        let snapshot = self.store.mutate(id, &mut |run| {
            if run.status == RunStatus::Awaiting {
                Self::apply(run, RunEvent::Resumed);
                run.input.extend(input.iter().cloned());
                resumed = run.status == RunStatus::InProgress;
            }
        })?;

        if resumed {
            let store = self.store.clone();
            let executor = self.executor.clone();
            let run_id = *id;
            let agent_name = snapshot.agent_name.clone();
            let resume_input = snapshot.input.clone();
            tokio::spawn(async move {
                if let Err(e) = Self::drive(store, executor, run_id, agent_name, resume_input).await
                {
                    log::error!("resumed run {} lost its record: {}", run_id, e);
                }
            });
        }

        Ok(snapshot)
    }

    /// Invokes the executor and applies the resulting transition. Shared by
    /// the sync path (inline) and the async/resume paths (worker task).
    /// Executor faults are contained here and become FAILED records.
    async fn drive(
        store: Arc<dyn RunStore>,
        executor: Arc<dyn ActionExecutor>,
        run_id: RunId,
        agent_name: String,
        input: Vec<Message>,
    ) -> Result<Run, StoreError> {
        let outcome = executor.execute(&agent_name, &input).await;

        store.mutate(&run_id, &mut |run| {
            if run.status == RunStatus::Cancelling {
                // The result raced a cancel request; the ack wins and the
                // output is dropped.
                Self::apply(run, RunEvent::CancelAcknowledged);
                return;
            }

            match &outcome {
                Ok(ExecutionOutcome::Complete(text)) => {
                    let message = Message::agent(text.clone());
                    match RunStateMachine::transition(run, RunEvent::Completed) {
                        Ok(_) => run.output.push(message),
                        Err(e) => run.fail(RunError::INTERNAL_ERROR, e.to_string()),
                    }
                }
                Ok(ExecutionOutcome::AwaitInput) => {
                    Self::apply(run, RunEvent::InputRequired);
                }
                Err(e) => {
                    run.error = Some(RunError::new(RunError::PROCESSING_ERROR, e.to_string()));
                    Self::apply(run, RunEvent::Failed);
                }
            }
        })
    }

    /// Engine-side transitions are valid by construction; a failure here is
    /// an engine fault and is converted to a FAILED record rather than
    /// propagated, so no run is left stuck non-terminal.
    fn apply(run: &mut Run, event: RunEvent) {
        if let Err(e) = RunStateMachine::transition(run, event) {
            log::error!("run {}: {}", run.run_id, e);
            run.fail(RunError::INTERNAL_ERROR, e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogConfig;
    use crate::executor::ExecutionError;
    use crate::store::InMemoryRunStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Blocks until released, then completes with "done".
    struct GatedExecutor {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ActionExecutor for GatedExecutor {
        async fn execute(
            &self,
            _agent_name: &str,
            _input: &[Message],
        ) -> Result<ExecutionOutcome, ExecutionError> {
            self.release.notified().await;
            Ok(ExecutionOutcome::Complete("done".to_string()))
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl ActionExecutor for FailingExecutor {
        async fn execute(
            &self,
            _agent_name: &str,
            _input: &[Message],
        ) -> Result<ExecutionOutcome, ExecutionError> {
            Err(ExecutionError::new("model exploded"))
        }
    }

    /// Awaits input on the first call, completes on the second.
    struct InteractiveExecutor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ActionExecutor for InteractiveExecutor {
        async fn execute(
            &self,
            _agent_name: &str,
            input: &[Message],
        ) -> Result<ExecutionOutcome, ExecutionError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(ExecutionOutcome::AwaitInput)
            } else {
                let text = input
                    .iter()
                    .map(|m| m.text_content())
                    .collect::<Vec<_>>()
                    .join(" + ");
                Ok(ExecutionOutcome::Complete(text))
            }
        }
    }

    fn engine_with(executor: Arc<dyn ActionExecutor>) -> (RunLifecycle, Arc<InMemoryRunStore>) {
        let store = Arc::new(InMemoryRunStore::new());
        let catalog = Arc::new(AgentCatalog::from_config(
            CatalogConfig::builtin(),
            "http://localhost:8080",
        ));
        let lifecycle = RunLifecycle::new(store.clone(), catalog, executor);
        (lifecycle, store)
    }

    fn sync_request(agent: &str, text: &str) -> RunCreateRequest {
        RunCreateRequest {
            agent_name: agent.to_string(),
            session_id: None,
            input: vec![Message::user(text)],
            mode: RunMode::Sync,
        }
    }

    fn async_request(agent: &str, text: &str) -> RunCreateRequest {
        RunCreateRequest {
            mode: RunMode::Async,
            ..sync_request(agent, text)
        }
    }

    async fn wait_for_status(store: &InMemoryRunStore, id: &RunId, status: RunStatus) -> Run {
        for _ in 0..200 {
            let run = store.get(id).unwrap();
            if run.status == status {
                return run;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("run {} never reached {:?}", id, status);
    }

    #[tokio::test]
    async fn test_sync_run_completes_with_echoed_output() {
        let (lifecycle, _) = engine_with(Arc::new(crate::executor::EchoExecutor));

        let run = lifecycle.create_run(sync_request("echo", "hello")).await.unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.output.len(), 1);
        assert_eq!(run.output[0].text_content(), "hello");
        assert!(run.finished_at.is_some());
        assert!(run.error.is_none());
    }

    #[tokio::test]
    async fn test_sync_run_for_unknown_agent_fails_as_run() {
        let (lifecycle, store) = engine_with(Arc::new(crate::executor::EchoExecutor));

        let run = lifecycle
            .create_run(sync_request("no-such-agent", "hello"))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error.as_ref().unwrap().code, "agent_not_found");
        assert!(run.output.is_empty());
        assert!(run.finished_at.is_some());
        // the attempt is still recorded
        assert!(store.get(&run.run_id).is_ok());
    }

    #[tokio::test]
    async fn test_sync_executor_failure_becomes_failed_run() {
        let (lifecycle, _) = engine_with(Arc::new(FailingExecutor));

        let run = lifecycle.create_run(sync_request("echo", "hello")).await.unwrap();

        assert_eq!(run.status, RunStatus::Failed);
        let error = run.error.unwrap();
        assert_eq!(error.code, "processing_error");
        assert_eq!(error.message, "model exploded");
    }

    #[tokio::test]
    async fn test_async_run_returns_in_progress_before_completion() {
        let release = Arc::new(Notify::new());
        let (lifecycle, store) = engine_with(Arc::new(GatedExecutor {
            release: release.clone(),
        }));

        let run = lifecycle
            .create_run(async_request("echo", "hello"))
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::InProgress);
        assert!(run.output.is_empty());

        release.notify_one();
        let finished = wait_for_status(&store, &run.run_id, RunStatus::Completed).await;
        assert_eq!(finished.output[0].text_content(), "done");
    }

    #[tokio::test]
    async fn test_async_unknown_agent_is_terminal_immediately() {
        let (lifecycle, _) = engine_with(Arc::new(crate::executor::EchoExecutor));

        let run = lifecycle
            .create_run(async_request("missing", "hello"))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error.unwrap().code, "agent_not_found");
    }

    #[tokio::test]
    async fn test_cancel_in_flight_run_discards_output() {
        let release = Arc::new(Notify::new());
        let (lifecycle, store) = engine_with(Arc::new(GatedExecutor {
            release: release.clone(),
        }));

        let run = lifecycle
            .create_run(async_request("echo", "hello"))
            .await
            .unwrap();

        let cancelled = lifecycle.cancel_run(&run.run_id).unwrap();
        assert_eq!(cancelled.status, RunStatus::Cancelling);

        release.notify_one();
        let finished = wait_for_status(&store, &run.run_id, RunStatus::Cancelled).await;
        assert!(finished.output.is_empty());
        assert!(finished.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_cancel_terminal_run_is_a_frozen_no_op() {
        let (lifecycle, _) = engine_with(Arc::new(crate::executor::EchoExecutor));

        let run = lifecycle.create_run(sync_request("echo", "hello")).await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);

        let after_cancel = lifecycle.cancel_run(&run.run_id).unwrap();
        assert_eq!(after_cancel.status, RunStatus::Completed);
        assert_eq!(after_cancel.output.len(), 1);
        assert!(after_cancel.error.is_none());
    }

    #[tokio::test]
    async fn test_cancel_unknown_run_is_not_found() {
        let (lifecycle, _) = engine_with(Arc::new(crate::executor::EchoExecutor));

        let err = lifecycle.cancel_run(&RunId::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cancel_awaiting_run_reaches_cancelled_immediately() {
        let (lifecycle, _) = engine_with(Arc::new(InteractiveExecutor {
            calls: AtomicUsize::new(0),
        }));

        let run = lifecycle.create_run(sync_request("echo", "hello")).await.unwrap();
        assert_eq!(run.status, RunStatus::Awaiting);

        let cancelled = lifecycle.cancel_run(&run.run_id).unwrap();
        assert_eq!(cancelled.status, RunStatus::Cancelled);
        assert!(cancelled.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_resume_awaiting_run_completes_with_combined_input() {
        let (lifecycle, store) = engine_with(Arc::new(InteractiveExecutor {
            calls: AtomicUsize::new(0),
        }));

        let run = lifecycle.create_run(sync_request("echo", "first")).await.unwrap();
        assert_eq!(run.status, RunStatus::Awaiting);
        assert!(run.finished_at.is_none());

        let resumed = lifecycle
            .resume_run(&run.run_id, vec![Message::user("second")])
            .await
            .unwrap();
        assert_eq!(resumed.status, RunStatus::InProgress);

        let finished = wait_for_status(&store, &run.run_id, RunStatus::Completed).await;
        assert_eq!(finished.output[0].text_content(), "first + second");
    }

    #[tokio::test]
    async fn test_resume_non_awaiting_run_is_a_no_op() {
        let (lifecycle, _) = engine_with(Arc::new(crate::executor::EchoExecutor));

        let run = lifecycle.create_run(sync_request("echo", "hello")).await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);

        let after_resume = lifecycle
            .resume_run(&run.run_id, vec![Message::user("more")])
            .await
            .unwrap();
        assert_eq!(after_resume.status, RunStatus::Completed);
        assert_eq!(after_resume.output.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_produce_independent_runs() {
        let (lifecycle, _) = engine_with(Arc::new(crate::executor::EchoExecutor));

        let (first, second) = tokio::join!(
            lifecycle.create_run(sync_request("echo", "one")),
            lifecycle.create_run(sync_request("echo", "two")),
        );

        let first = first.unwrap();
        let second = second.unwrap();
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(first.output[0].text_content(), "one");
        assert_eq!(second.output[0].text_content(), "two");
    }

    #[tokio::test]
    async fn test_get_run_returns_snapshot() {
        let (lifecycle, _) = engine_with(Arc::new(crate::executor::EchoExecutor));

        let run = lifecycle.create_run(sync_request("echo", "hello")).await.unwrap();
        let snapshot = lifecycle.get_run(&run.run_id).unwrap();

        assert_eq!(snapshot.run_id, run.run_id);
        assert_eq!(snapshot.status, RunStatus::Completed);
    }
}
