//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, show, path)
//! - [`serve`] - HTTP API server
//! - [`stitch`] - Stitch a region into one image

pub mod common;
pub mod config;
pub mod serve;
pub mod stitch;
