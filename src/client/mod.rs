use std::time::Duration;

use anyhow::Result;

use crate::types::{
    AgentManifest, AgentsListResponse, Message, Run, RunCreateRequest, RunId, RunMode,
    RunResumeRequest, RunStatus,
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// HTTP client for a herald server. `execute_async` polls the run until it
/// leaves CREATED/IN_PROGRESS; the poll loop is an ordinary future, so
/// dropping it abandons the wait without touching the server-side run.
pub struct AcpClient {
    base_url: String,
    http: reqwest::Client,
    poll_interval: Duration,
}

impl AcpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub async fn ping(&self) -> bool {
        match self.http.get(format!("{}/ping", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn list_agents(&self, limit: usize, offset: usize) -> Result<Vec<AgentManifest>> {
        let response = self
            .http
            .get(format!("{}/agents", self.base_url))
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<AgentsListResponse>().await?.agents)
    }

    pub async fn get_agent(&self, name: &str) -> Result<AgentManifest> {
        let response = self
            .http
            .get(format!("{}/agents/{}", self.base_url, name))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    pub async fn create_run(&self, request: &RunCreateRequest) -> Result<Run> {
        let response = self
            .http
            .post(format!("{}/runs", self.base_url))
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Creates a SYNC run; the server blocks until the record is settled.
    pub async fn execute_sync(&self, agent_name: &str, input: Vec<Message>) -> Result<Run> {
        self.create_run(&RunCreateRequest {
            agent_name: agent_name.to_string(),
            session_id: None,
            input,
            mode: RunMode::Sync,
        })
        .await
    }

    /// Creates an ASYNC run and polls until it settles.
    pub async fn execute_async(&self, agent_name: &str, input: Vec<Message>) -> Result<Run> {
        let initial = self
            .create_run(&RunCreateRequest {
                agent_name: agent_name.to_string(),
                session_id: None,
                input,
                mode: RunMode::Async,
            })
            .await?;

        if initial.is_terminal() {
            return Ok(initial);
        }
        self.wait_for_run(&initial.run_id).await
    }

    pub async fn wait_for_run(&self, run_id: &RunId) -> Result<Run> {
        loop {
            tokio::time::sleep(self.poll_interval).await;

            let run = self.get_run(run_id).await?;
            if !matches!(run.status, RunStatus::Created | RunStatus::InProgress) {
                return Ok(run);
            }
        }
    }

    pub async fn get_run(&self, run_id: &RunId) -> Result<Run> {
        let response = self
            .http
            .get(format!("{}/runs/{}", self.base_url, run_id))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    pub async fn cancel_run(&self, run_id: &RunId) -> Result<Run> {
        let response = self
            .http
            .post(format!("{}/runs/{}/cancel", self.base_url, run_id))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    pub async fn resume_run(&self, run_id: &RunId, input: Vec<Message>) -> Result<Run> {
        let response = self
            .http
            .post(format!("{}/runs/{}", self.base_url, run_id))
            .json(&RunResumeRequest { input, mode: None })
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
