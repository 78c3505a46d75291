//! Runtime support for the Spotless client: configuration loading and
//! logging bootstrap.
//!
//! Everything here is synchronous and runs once at process start, before the
//! HTTP clients or any command logic exist.

pub mod config;
pub mod logging;

pub use config::{
    default_logging_config, AppConfig, CliArgs, ClientConfig, EndpointConfig, LoggingConfig,
    Section,
};
