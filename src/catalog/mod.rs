use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{AgentManifest, AgentStatus, Capability, Link, ManifestMetadata};

/// Static agent-group configuration the catalog is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub agents: Vec<GroupConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<CapabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CatalogConfig {
    /// Minimal catalog used when no config file is supplied.
    pub fn builtin() -> Self {
        Self {
            agents: vec![GroupConfig {
                name: "echo".to_string(),
                description: "Echoes the request input back".to_string(),
                capabilities: vec![CapabilityConfig {
                    name: "echo".to_string(),
                    description: "Return the input text unchanged".to_string(),
                }],
            }],
        }
    }
}

/// Read-only list of invocable agents, built once at startup. The
/// lifecycle engine only reads from this; no locking needed.
pub struct AgentCatalog {
    manifests: Vec<AgentManifest>,
}

impl AgentCatalog {
    pub fn from_config(config: CatalogConfig, base_url: &str) -> Self {
        let mut manifests = Vec::new();

        for group in config.agents {
            if group.capabilities.is_empty() {
                log::warn!("skipping agent group '{}': no capabilities", group.name);
                continue;
            }

            let name = normalize_name(&group.name);
            let now = Utc::now();
            let content_types = vec!["text/plain".to_string(), "application/json".to_string()];

            manifests.push(AgentManifest {
                name: name.clone(),
                description: group.description.clone(),
                input_content_types: content_types.clone(),
                output_content_types: content_types,
                metadata: ManifestMetadata {
                    documentation: group.description,
                    framework: "herald".to_string(),
                    capabilities: group
                        .capabilities
                        .into_iter()
                        .map(|c| Capability {
                            name: c.name,
                            description: c.description,
                        })
                        .collect(),
                    created_at: now,
                    updated_at: now,
                    links: vec![Link {
                        link_type: "api".to_string(),
                        url: format!("{}/agents/{}", base_url, name),
                    }],
                },
                status: AgentStatus {
                    success_rate: 100.0,
                },
            });
        }

        if manifests.is_empty() {
            log::warn!("no agent manifests built from catalog config");
        } else {
            log::info!("built {} agent manifests", manifests.len());
        }

        Self { manifests }
    }

    pub fn from_file(path: &Path, base_url: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading agent catalog {}", path.display()))?;
        let config: CatalogConfig =
            serde_yaml::from_str(&raw).context("parsing agent catalog config")?;
        Ok(Self::from_config(config, base_url))
    }

    /// Paginated slice in catalog order. Out-of-range offsets yield an
    /// empty slice, never an error.
    pub fn list(&self, limit: usize, offset: usize) -> &[AgentManifest] {
        if offset >= self.manifests.len() {
            return &[];
        }
        let end = offset.saturating_add(limit).min(self.manifests.len());
        &self.manifests[offset..end]
    }

    pub fn get(&self, name: &str) -> Option<&AgentManifest> {
        self.manifests.iter().find(|m| m.name == name)
    }

    /// Run-creation lookup is forgiving about case.
    pub fn contains(&self, name: &str) -> bool {
        self.manifests
            .iter()
            .any(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}

fn normalize_name(raw: &str) -> String {
    raw.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}
