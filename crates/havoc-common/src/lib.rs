//! Shared primitives for the havoc agent workspace.
//!
//! This crate exposes configuration loading and the tracing bootstrap consumed
//! by the daemon and by integration tests.

pub mod config;
pub mod logging;

pub use config::{
    AgentConfig, AppConfig, DockerConfig, LoadedAppConfig, LoggingConfig, ServiceConfig,
};
pub use logging::{init_tracing, LogFormat};
