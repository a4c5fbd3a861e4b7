//! Text ingestion for the opal bid engine.
//!
//! This crate handles:
//! - Visible-text extraction from raw page HTML
//! - Context windows and the numeric-sequence guard
//! - Splitting concatenated amount/age runs
//! - Facebook comment markers
//! - The candidate scanner

pub mod markup;
pub mod scanner;
pub mod signals;
pub mod splitter;
pub mod window;

pub use markup::visible_text;
pub use scanner::CandidateScanner;
pub use splitter::{split_amount_and_age, AgeSplit};
