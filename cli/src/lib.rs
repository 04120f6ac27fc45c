//! Command-line front end for `portal-core`.
//!
//! Wires the core controller to a ureq transport, a file token store and
//! stdout, and maps clap subcommands onto controller operations.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod store;
pub mod transport;

pub use cli::{Cli, Commands};
pub use config::{Config, Overrides};
pub use error::ConfigError;
pub use store::FileTokenStore;
pub use transport::UreqTransport;
