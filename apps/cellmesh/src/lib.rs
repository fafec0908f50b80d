//! # cellmesh
//!
//! Library half of the cellmesh binary: command-line definitions, command
//! implementations and configuration. Exposed as a library so the commands
//! can be exercised from integration tests.

pub mod cli;
pub mod config;
