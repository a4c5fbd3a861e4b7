//! Session metrics.
//!
//! Summarises a replayed monitoring session from the bids it applied.

use chrono::{DateTime, Utc};
use opal_core::{Amount, AuctionBidState, BidUpdate};
use serde::Serialize;

/// A bid update the session applied to the auction state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedBid {
    /// 1-based poll number.
    pub poll: u32,
    /// Capture time of the snapshot, if known.
    pub captured_at: Option<DateTime<Utc>>,
    /// Floor before the update.
    pub previous_floor: Amount,
    /// The update.
    pub update: BidUpdate,
}

impl AppliedBid {
    /// Amount by which the update raised the floor.
    pub fn raise(&self) -> Amount {
        self.update.amount - self.previous_floor
    }
}

/// Session summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    /// Snapshots scanned.
    pub polls: u32,
    /// Polls that applied an update.
    pub updates: u32,
    /// Polls that found nothing new.
    pub quiet_polls: u32,
    /// Floor when the session started.
    pub opening_floor: Amount,
    /// Current bid when the session ended.
    pub final_bid: Amount,
    /// Current bidder when the session ended.
    pub final_bidder: Option<String>,
    /// Sum of all raises.
    pub total_raise: Amount,
    /// Largest single raise.
    pub largest_raise: Amount,
    /// Mean confidence of applied updates.
    pub avg_confidence: f64,
    /// Distinct bidders among applied updates.
    pub distinct_bidders: u32,
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Calculate metrics for a session.
    pub fn calculate(
        opening: &AuctionBidState,
        closing: &AuctionBidState,
        polls: u32,
        applied: &[AppliedBid],
    ) -> SessionMetrics {
        let mut metrics = SessionMetrics {
            polls,
            updates: applied.len() as u32,
            quiet_polls: polls.saturating_sub(applied.len() as u32),
            opening_floor: opening.floor().floor(),
            final_bid: closing.current_bid,
            final_bidder: closing.current_bidder.clone(),
            ..SessionMetrics::default()
        };

        if applied.is_empty() {
            return metrics;
        }

        let mut total_confidence = 0.0;
        let mut bidders: Vec<&str> = Vec::new();
        for bid in applied {
            let raise = bid.raise();
            metrics.total_raise += raise;
            metrics.largest_raise = metrics.largest_raise.max(raise);
            total_confidence += bid.update.confidence;

            if !bidders.contains(&bid.update.bidder_name.as_str()) {
                bidders.push(&bid.update.bidder_name);
            }
        }

        metrics.avg_confidence = total_confidence / applied.len() as f64;
        metrics.distinct_bidders = bidders.len() as u32;
        metrics
    }
}
