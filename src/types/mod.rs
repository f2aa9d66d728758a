pub mod manifest;
pub mod message;
pub mod run;

pub use manifest::{
    AgentManifest, AgentStatus, AgentsListResponse, Capability, Link, ManifestMetadata,
};
pub use message::{Message, MessagePart, MessageRole};
pub use run::{Run, RunCreateRequest, RunError, RunMode, RunResumeRequest, RunStatus};

use uuid::Uuid;

pub type RunId = Uuid;
pub type SessionId = Uuid;
