//! CLI subcommands.

pub mod common;
pub mod config;
pub mod replay;
pub mod route;
