//! ContentOS - production kits, upload statistics and ingredient grading
//!
//! The `contentos` binary is a thin clap front end over [`commands`]. Command
//! handlers and the HTTP clients in [`services`] are exposed here so they can
//! be driven from integration tests.

pub mod commands;
pub mod services;
