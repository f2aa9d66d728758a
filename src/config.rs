use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub agents_file: Option<String>,
    pub run_capacity: Option<usize>,
    pub base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("HERALD_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            agents_file: std::env::var("HERALD_AGENTS_FILE").ok(),
            run_capacity: std::env::var("HERALD_RUN_CAPACITY")
                .ok()
                .and_then(|c| c.parse().ok()),
            base_url: std::env::var("HERALD_BASE_URL").ok(),
        }
    }

    /// Base URL advertised in manifest links.
    pub fn manifest_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }
}
