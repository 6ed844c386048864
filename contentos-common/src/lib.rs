//! # ContentOS Common Library
//!
//! Shared code for the ContentOS CLI including:
//! - Global and per-channel configuration, channel context switching
//! - Kit model, lifecycle, templates and production ledger
//! - SQLite store for kit metadata and video metrics
//! - Ingredient performance aggregation and grading
//! - Growth guardrails and the channel brain

pub mod analysis;
pub mod brain;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod files;
pub mod growth;
pub mod kit;
pub mod time;

pub use context::{ChannelContext, ContextManager};
pub use error::{Error, Result};
