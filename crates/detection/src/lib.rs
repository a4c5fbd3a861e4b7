//! Bid detection for the opal auction tracker.
//!
//! Combines the candidate scanner with name extraction, validation,
//! confidence scoring and aggregation into a single [`BidEngine`].

pub mod aggregator;
pub mod confidence;
pub mod engine;
pub mod names;
pub mod validator;

pub use aggregator::{rank, BidAggregator};
pub use confidence::ConfidenceScorer;
pub use engine::{scan, BidEngine};
pub use names::{clean_name, NameExtractor};
pub use validator::{BidValidator, Rejection};
