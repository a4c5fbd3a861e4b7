//! Bid aggregation.
//!
//! Picks the single bid to report for an auction out of everything that
//! validated in one document, skipping bids already reported.

use opal_core::{seen_key, Amount, ScanResult, SeenSet, ValidatedBid};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use tracing::debug;

/// Order bids for reporting: latest position first, then higher amount,
/// then higher confidence.
pub fn rank(bids: &mut [ValidatedBid]) {
    bids.sort_by(compare);
}

fn compare(a: &ValidatedBid, b: &ValidatedBid) -> Ordering {
    b.position()
        .cmp(&a.position())
        .then_with(|| OrderedFloat(b.amount()).cmp(&OrderedFloat(a.amount())))
        .then_with(|| OrderedFloat(b.confidence).cmp(&OrderedFloat(a.confidence)))
}

/// Aggregator over one auction's seen-set partition.
pub struct BidAggregator<'a> {
    auction_id: &'a str,
    seen: &'a mut dyn SeenSet,
}

impl<'a> BidAggregator<'a> {
    /// Create an aggregator for one auction.
    pub fn new(auction_id: &'a str, seen: &'a mut dyn SeenSet) -> Self {
        Self { auction_id, seen }
    }

    /// Has this bid already been reported for the auction?
    pub fn was_already_reported(&self, amount: Amount, bidder_name: &str) -> bool {
        self.seen.has(&seen_key(self.auction_id, amount, bidder_name))
    }

    /// Record a bid as reported.
    pub fn mark_reported(&mut self, amount: Amount, bidder_name: &str) {
        self.seen.add(&seen_key(self.auction_id, amount, bidder_name));
    }

    /// Select the bid to report and mark it reported.
    pub fn select(&mut self, mut bids: Vec<ValidatedBid>) -> ScanResult {
        let total = bids.len();
        bids.retain(|bid| !self.was_already_reported(bid.amount(), &bid.bidder_name));
        if bids.len() < total {
            debug!(
                auction_id = self.auction_id,
                skipped = total - bids.len(),
                "Skipping already reported bids"
            );
        }

        rank(&mut bids);
        let Some(top) = bids.into_iter().next() else {
            return ScanResult::NoUpdate;
        };

        self.mark_reported(top.amount(), &top.bidder_name);
        debug!(
            auction_id = self.auction_id,
            amount = top.amount(),
            bidder = %top.bidder_name,
            kind = %top.candidate.pattern_kind,
            confidence = top.confidence,
            "Selected bid"
        );
        ScanResult::Found(top.into_update())
    }
}
