use async_trait::async_trait;
use thiserror::Error;

use crate::types::Message;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What an execution produced. `AwaitInput` parks the run until a resume
/// request supplies more input.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Complete(String),
    AwaitInput,
}

/// The component that actually performs an agent's work. Opaque to the
/// lifecycle engine; failures are reported through `ExecutionError` and
/// converted into FAILED run records at the lifecycle boundary.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(
        &self,
        agent_name: &str,
        input: &[Message],
    ) -> Result<ExecutionOutcome, ExecutionError>;
}

/// Builtin executor that echoes the inline text of the input back. Serves
/// as the default wiring and as a deterministic test double.
pub struct EchoExecutor;

#[async_trait]
impl ActionExecutor for EchoExecutor {
    async fn execute(
        &self,
        _agent_name: &str,
        input: &[Message],
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let text = input
            .iter()
            .map(|m| m.text_content())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ExecutionOutcome::Complete(text))
    }
}
