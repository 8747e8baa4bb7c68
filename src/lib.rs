//! linkfinder: find the best reachable link for a show or episode.
//!
//! This crate is the front-end around the `linkfinder-search` engine:
//! configuration loading, the text command layer, and the CLI binary.
//!
//! # Architecture
//!
//! - **Config**: TOML file plus environment overrides, see [`LinkfinderConfig`]
//! - **Commands**: `find` / `link` / `fast` / `normalize` parsed from one line
//!   of text and answered with a plain-text reply
//! - **Engine**: every command is answered through one
//!   [`linkfinder_search::Resolver`] built per invocation

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{Command, execute, parse_command};
pub use config::LinkfinderConfig;
pub use error::{LinkfinderError, Result};
