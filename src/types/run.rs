use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Message, RunId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Created,
    InProgress,
    Awaiting,
    Cancelling,
    Cancelled,
    Completed,
    Failed,
}

impl RunStatus {
    /// Terminal records are frozen; no field may change after this.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Created => "CREATED",
            RunStatus::InProgress => "IN_PROGRESS",
            RunStatus::Awaiting => "AWAITING",
            RunStatus::Cancelling => "CANCELLING",
            RunStatus::Cancelled => "CANCELLED",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    Sync,
    Async,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

impl RunError {
    pub const AGENT_NOT_FOUND: &'static str = "agent_not_found";
    pub const PROCESSING_ERROR: &'static str = "processing_error";
    pub const INTERNAL_ERROR: &'static str = "internal_error";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A single tracked invocation of an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub run_id: RunId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub agent_name: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Request input, retained in-process so a resume can re-dispatch the
    /// executor. Not part of the wire shape.
    #[serde(skip)]
    pub input: Vec<Message>,
}

impl Run {
    pub fn new(agent_name: String, session_id: Option<SessionId>, input: Vec<Message>) -> Self {
        Self {
            run_id: RunId::new_v4(),
            session_id,
            agent_name,
            status: RunStatus::Created,
            output: Vec::new(),
            error: None,
            created_at: Utc::now(),
            finished_at: None,
            input,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Forces the record into FAILED with the given error. Used when the
    /// engine itself faults mid-transition; a run must never be left stuck
    /// in a non-terminal state.
    pub fn fail(&mut self, code: &str, message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.error = Some(RunError::new(code, message));
        self.finished_at = Some(Utc::now());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCreateRequest {
    pub agent_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub input: Vec<Message>,
    pub mode: RunMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResumeRequest {
    #[serde(default)]
    pub input: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RunMode>,
}
