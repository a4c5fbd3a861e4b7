//! Core types and configuration for the opal auction bid engine.
//!
//! This crate provides shared types used across all other crates:
//! - Bid candidates, validated bids and scan results
//! - Engine options
//! - The caller-owned seen-set contract
//! - Common error types

pub mod config;
pub mod error;
pub mod seen;
pub mod types;

pub use config::{
    ContextConfig, EngineOptions, InputConfig, OptionOverrides, OversizePolicy, ScannerConfig,
    ScoringConfig,
};
pub use error::{Error, Result};
pub use seen::{seen_key, MemorySeenSet, SeenSet};
pub use types::*;
