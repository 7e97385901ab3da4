//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`tile`] - Tile or tile range download
//! - [`file`] - Single file download
//! - [`common`] - Shared options, waiting and reporting

pub mod common;
pub mod file;
pub mod tile;
