pub mod api;
pub mod catalog;
pub mod client;
pub mod config;
pub mod engine;
pub mod executor;
pub mod lifecycle;
pub mod store;
pub mod types;

pub use config::Config;
pub use engine::RunLifecycle;
pub use types::*;
