//! Poll session over captured snapshots.
//!
//! Plays the caller's role around the engine: keeps the auction state,
//! owns the seen-set, and applies at most one update per poll, and only
//! when it raises the floor.

use crate::metrics::{AppliedBid, MetricsCalculator, SessionMetrics};
use crate::snapshot::{PageSnapshot, SnapshotFormat};
use opal_core::{AuctionBidState, Result, SeenSet};
use opal_detection::BidEngine;
use tracing::{debug, info};

/// Monitoring session for one auction.
pub struct MonitorSession<S: SeenSet> {
    auction_id: String,
    engine: BidEngine,
    opening: AuctionBidState,
    state: AuctionBidState,
    seen: S,
    polls: u32,
    applied: Vec<AppliedBid>,
}

impl<S: SeenSet> MonitorSession<S> {
    /// Create a session starting from `state`.
    pub fn new(
        auction_id: impl Into<String>,
        engine: BidEngine,
        state: AuctionBidState,
        seen: S,
    ) -> Self {
        Self {
            auction_id: auction_id.into(),
            engine,
            opening: state.clone(),
            state,
            seen,
            polls: 0,
            applied: Vec::new(),
        }
    }

    /// Current auction state.
    pub fn state(&self) -> &AuctionBidState {
        &self.state
    }

    /// The session's seen-set.
    pub fn seen(&self) -> &S {
        &self.seen
    }

    /// Updates applied so far.
    pub fn applied(&self) -> &[AppliedBid] {
        &self.applied
    }

    /// Scan one snapshot and apply the update, if any.
    pub fn poll(&mut self, snapshot: &PageSnapshot) -> Result<Option<AppliedBid>> {
        self.polls += 1;
        let floor = self.state.floor();

        let result = match snapshot.format {
            SnapshotFormat::Text => {
                self.engine
                    .scan(&self.auction_id, &snapshot.body, &floor, &mut self.seen)?
            }
            SnapshotFormat::Html => {
                self.engine
                    .scan_html(&self.auction_id, &snapshot.body, &floor, &mut self.seen)?
            }
        };

        let Some(update) = result.into_update() else {
            debug!(auction_id = %self.auction_id, poll = self.polls, "No new bid");
            return Ok(None);
        };

        if !self.state.record(update.amount, &update.bidder_name) {
            debug!(
                auction_id = %self.auction_id,
                amount = update.amount,
                "Update does not raise the floor, ignoring"
            );
            return Ok(None);
        }

        info!(
            auction_id = %self.auction_id,
            poll = self.polls,
            amount = update.amount,
            bidder = %update.bidder_name,
            kind = %update.pattern_kind,
            confidence = update.confidence,
            "Applied bid update"
        );
        let applied = AppliedBid {
            poll: self.polls,
            captured_at: snapshot.captured_at,
            previous_floor: floor.floor(),
            update,
        };
        self.applied.push(applied.clone());
        Ok(Some(applied))
    }

    /// Poll every snapshot in order and summarise the session.
    pub fn run<'s>(
        &mut self,
        snapshots: impl IntoIterator<Item = &'s PageSnapshot>,
    ) -> Result<SessionMetrics> {
        for snapshot in snapshots {
            self.poll(snapshot)?;
        }
        Ok(self.metrics())
    }

    /// Summary of the session so far.
    pub fn metrics(&self) -> SessionMetrics {
        MetricsCalculator::calculate(&self.opening, &self.state, self.polls, &self.applied)
    }
}
