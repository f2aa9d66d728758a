use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{Run, RunStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum RunEvent {
    Dispatched,
    Completed,
    Failed,
    CancelRequested,
    CancelAcknowledged,
    InputRequired,
    Resumed,
}

pub struct RunStateMachine;

impl RunStateMachine {
    /// Applies `event` to the run, returning the new status. Transitioning
    /// into a terminal status stamps `finished_at`.
    pub fn transition(run: &mut Run, event: RunEvent) -> Result<RunStatus> {
        let new_status = match (run.status, &event) {
            (RunStatus::Created, RunEvent::Dispatched) => RunStatus::InProgress,

            (RunStatus::InProgress, RunEvent::Completed) => RunStatus::Completed,
            (RunStatus::InProgress, RunEvent::Failed) => RunStatus::Failed,
            (RunStatus::InProgress, RunEvent::InputRequired) => RunStatus::Awaiting,

            (
                RunStatus::Created | RunStatus::InProgress | RunStatus::Awaiting,
                RunEvent::CancelRequested,
            ) => RunStatus::Cancelling,
            (RunStatus::Cancelling, RunEvent::CancelAcknowledged) => RunStatus::Cancelled,

            (RunStatus::Awaiting, RunEvent::Resumed) => RunStatus::InProgress,

            _ => {
                return Err(anyhow!(
                    "Invalid run transition from {:?} with event {:?}",
                    run.status,
                    event
                ));
            }
        };

        run.status = new_status;
        if new_status.is_terminal() {
            run.finished_at = Some(Utc::now());
        }

        Ok(new_status)
    }
}
