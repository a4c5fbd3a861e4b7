//! Bid detection engine.
//!
//! Runs the full pipeline for one document:
//! scanner → validator + name extractor → aggregator.
//!
//! The engine holds only immutable configuration and compiled patterns, so a
//! single instance can serve many auctions from many threads. All per-auction
//! state lives in the caller's [`SeenSet`] and [`AuctionFloor`].

use crate::aggregator::{rank, BidAggregator};
use crate::names::NameExtractor;
use crate::validator::BidValidator;
use opal_core::{
    AuctionFloor, EngineOptions, Error, OversizePolicy, Result, ScanResult, SeenSet, SourceHints,
    ValidatedBid,
};
use opal_ingestion::window::keep_tail;
use opal_ingestion::{visible_text, CandidateScanner};
use tracing::{debug, warn};

/// Bid detection engine.
#[derive(Debug, Clone)]
pub struct BidEngine {
    options: EngineOptions,
    scanner: CandidateScanner,
    names: NameExtractor,
    validator: BidValidator,
}

impl BidEngine {
    /// Create an engine, failing fast on malformed options.
    pub fn new(options: EngineOptions) -> Result<Self> {
        options.validate()?;
        let validator = BidValidator::new(&options)?;
        Ok(Self {
            scanner: CandidateScanner::new(&options),
            names: NameExtractor::new(options.scanner.proximity_levels),
            validator,
            options,
        })
    }

    /// Get the options the engine was built with.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Scan a document for a new bid on one auction.
    pub fn scan(
        &self,
        auction_id: &str,
        document: &str,
        floor: &AuctionFloor,
        seen: &mut dyn SeenSet,
    ) -> Result<ScanResult> {
        self.scan_with_hints(auction_id, document, floor, seen, SourceHints::default())
    }

    /// Scan with caller hints about the document's origin.
    pub fn scan_with_hints(
        &self,
        auction_id: &str,
        document: &str,
        floor: &AuctionFloor,
        seen: &mut dyn SeenSet,
        hints: SourceHints,
    ) -> Result<ScanResult> {
        let bids = self.evaluate(document, floor, hints)?;
        Ok(BidAggregator::new(auction_id, seen).select(bids))
    }

    /// Scan raw page HTML.
    pub fn scan_html(
        &self,
        auction_id: &str,
        html: &str,
        floor: &AuctionFloor,
        seen: &mut dyn SeenSet,
    ) -> Result<ScanResult> {
        let text = visible_text(self.bounded(html)?);
        self.scan(auction_id, &text, floor, seen)
    }

    /// Every bid in the document that passes validation, ranked for
    /// reporting. Does not consult or update any seen-set.
    pub fn evaluate(
        &self,
        document: &str,
        floor: &AuctionFloor,
        hints: SourceHints,
    ) -> Result<Vec<ValidatedBid>> {
        let text = self.bounded(document)?;

        let mut bids = Vec::new();
        for candidate in self.scanner.scan(text, hints) {
            if let Err(reason) = self.validator.check(&candidate, floor) {
                debug!(
                    amount = candidate.amount,
                    position = candidate.position,
                    kind = %candidate.pattern_kind,
                    %reason,
                    "Rejected candidate"
                );
                continue;
            }
            let bidder_name = self.names.extract(&candidate);
            bids.push(self.validator.accept(candidate, bidder_name));
        }

        rank(&mut bids);
        Ok(bids)
    }

    /// Apply the input size bound.
    fn bounded<'d>(&self, document: &'d str) -> Result<&'d str> {
        let limit = self.options.input.max_bytes;
        if document.len() <= limit {
            return Ok(document);
        }
        match self.options.input.oversize {
            OversizePolicy::Reject => Err(Error::input_too_large(document.len(), limit)),
            OversizePolicy::KeepTail => {
                warn!(
                    size = document.len(),
                    limit,
                    "Document exceeds size limit, scanning the trailing bytes only"
                );
                Ok(keep_tail(document, limit))
            }
        }
    }
}

/// One-shot scan with optional options.
///
/// Builds a fresh engine per call; hold a [`BidEngine`] when scanning
/// repeatedly.
pub fn scan(
    auction_id: &str,
    document: &str,
    floor: &AuctionFloor,
    seen: &mut dyn SeenSet,
    options: Option<EngineOptions>,
) -> Result<ScanResult> {
    BidEngine::new(options.unwrap_or_default())?.scan(auction_id, document, floor, seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use opal_core::{MemorySeenSet, PatternKind, UNKNOWN_BIDDER};

    fn engine() -> BidEngine {
        BidEngine::new(EngineOptions::default()).unwrap()
    }

    fn scan_fresh(document: &str, floor: AuctionFloor) -> ScanResult {
        engine()
            .scan("auction-1", document, &floor, &mut MemorySeenSet::new())
            .unwrap()
    }

    #[test]
    fn test_multiline_comment() {
        let result = scan_fresh("John Smith\n45\n2h\nReply\nShare", AuctionFloor::new(20.0, 10.0));
        let update = result.into_update().unwrap();
        assert_eq!(update.amount, 45.0);
        assert_eq!(update.bidder_name, "John Smith");
        assert_eq!(update.pattern_kind, PatternKind::FacebookMultiline);
        assert_relative_eq!(update.confidence, 0.9, epsilon = 1e-9);
    }

    #[test]
    fn test_concatenated_comment() {
        let result = scan_fresh("JaneDoe3802hLikeReplyShare", AuctionFloor::default());
        let update = result.into_update().unwrap();
        assert_eq!(update.amount, 380.0);
        assert_eq!(update.bidder_name, "Jane Doe");
    }

    #[test]
    fn test_css_is_not_a_bid() {
        let result = scan_fresh(
            "width: 150px; height: 200px; rgba(0,0,0,1)",
            AuctionFloor::default(),
        );
        assert_eq!(result, ScanResult::NoUpdate);
    }

    #[test]
    fn test_below_floor_is_not_a_bid() {
        let result = scan_fresh("$35 please", AuctionFloor::new(40.0, 10.0));
        assert_eq!(result, ScanResult::NoUpdate);
    }

    #[test]
    fn test_excessive_jump() {
        let floor = AuctionFloor::new(50.0, 0.0);
        assert_eq!(scan_fresh("bid: $5000", floor), ScanResult::NoUpdate);

        let options = EngineOptions {
            max_jump: None,
            ..EngineOptions::default()
        };
        let result = BidEngine::new(options)
            .unwrap()
            .scan("auction-1", "bid: $5000", &floor, &mut MemorySeenSet::new())
            .unwrap();
        assert_eq!(result.update().map(|u| u.amount), Some(5000.0));
    }

    #[test]
    fn test_calendar_year_alone() {
        assert_eq!(scan_fresh("2024", AuctionFloor::default()), ScanResult::NoUpdate);
    }

    #[test]
    fn test_reject_listed_and_technical() {
        assert_eq!(scan_fresh("$20", AuctionFloor::default()), ScanResult::NoUpdate);
        assert_eq!(
            scan_fresh(
                "Mary Jones $45 https://scontent.fbcdn.net/v/45.jpg",
                AuctionFloor::default()
            ),
            ScanResult::NoUpdate
        );
    }

    #[test]
    fn test_corroborated_standalone() {
        assert_eq!(scan_fresh("55", AuctionFloor::default()), ScanResult::NoUpdate);

        let update = scan_fresh("Tom Lee 55", AuctionFloor::default())
            .into_update()
            .unwrap();
        assert_eq!(update.amount, 55.0);
        assert_eq!(update.bidder_name, "Tom Lee");
        assert_eq!(update.pattern_kind, PatternKind::StandaloneNumber);
    }

    #[test]
    fn test_unknown_bidder() {
        let update = scan_fresh("bid 60", AuctionFloor::default())
            .into_update()
            .unwrap();
        assert_eq!(update.bidder_name, UNKNOWN_BIDDER);
    }

    #[test]
    fn test_monotonicity() {
        let document = "Amy Wong\n30\n5h\nReply\nBen Hall\n45\n4h\nReply\nCat Ross\n60\n3h\nReply";
        let floor = AuctionFloor::new(50.0, 10.0);
        let update = scan_fresh(document, floor).into_update().unwrap();
        assert_eq!(update.amount, 60.0);
        assert!(update.amount > floor.current_bid);
        assert!(update.amount > floor.starting_bid);
    }

    #[test]
    fn test_determinism() {
        let document = "Mary Jones\n40\n3h\nReply\nJohn Smith\n45\n2h\nReply\nbid $50";
        let floor = AuctionFloor::new(30.0, 10.0);
        assert_eq!(scan_fresh(document, floor), scan_fresh(document, floor));
    }

    #[test]
    fn test_idempotence_and_latest_first() {
        let engine = engine();
        let document = "Mary Jones\n40\n3h\nReply\nJohn Smith\n45\n2h\nReply";
        let floor = AuctionFloor::new(30.0, 10.0);
        let mut seen = MemorySeenSet::new();

        let first = engine.scan("a1", document, &floor, &mut seen).unwrap();
        assert_eq!(first.update().map(|u| u.bidder_name.as_str()), Some("John Smith"));

        let second = engine.scan("a1", document, &floor, &mut seen).unwrap();
        assert_eq!(second.update().map(|u| u.bidder_name.as_str()), Some("Mary Jones"));

        let third = engine.scan("a1", document, &floor, &mut seen).unwrap();
        assert_eq!(third, ScanResult::NoUpdate);

        // Another auction has its own partition.
        let other = engine.scan("a2", document, &floor, &mut seen).unwrap();
        assert!(other.is_found());
    }

    #[test]
    fn test_evaluate_does_not_touch_seen_set() {
        let engine = engine();
        let document = "Mary Jones\n40\n3h\nReply\nJohn Smith\n45\n2h\nReply";
        let bids = engine
            .evaluate(document, &AuctionFloor::new(30.0, 10.0), SourceHints::default())
            .unwrap();
        let amounts: Vec<f64> = bids.iter().map(|b| b.amount()).collect();
        assert_eq!(amounts, vec![45.0, 40.0]);
        assert!(bids.iter().all(|b| b.is_valid));
    }

    #[test]
    fn test_malformed_options() {
        let options = EngineOptions {
            min_amount: 500.0,
            max_amount: 100.0,
            ..EngineOptions::default()
        };
        assert!(matches!(
            BidEngine::new(options),
            Err(Error::MalformedOptions(_))
        ));

        let mut options = EngineOptions::default();
        options.context.denylist = vec!["[".to_string()];
        assert!(matches!(
            BidEngine::new(options),
            Err(Error::MalformedOptions(_))
        ));
    }

    #[test]
    fn test_oversize_reject() {
        let mut options = EngineOptions::default();
        options.input.max_bytes = 10;
        options.input.oversize = OversizePolicy::Reject;
        let engine = BidEngine::new(options).unwrap();

        let err = engine
            .scan("a1", &"x".repeat(20), &AuctionFloor::default(), &mut MemorySeenSet::new())
            .unwrap_err();
        assert!(matches!(err, Error::InputTooLarge { size: 20, limit: 10 }));
    }

    #[test]
    fn test_oversize_keeps_tail() {
        let mut options = EngineOptions::default();
        options.input.max_bytes = 30;
        let engine = BidEngine::new(options).unwrap();

        let document = format!("{}\nJohn Smith\n45\n2h\nReply", "x".repeat(100));
        let update = engine
            .scan("a1", &document, &AuctionFloor::default(), &mut MemorySeenSet::new())
            .unwrap()
            .into_update()
            .unwrap();
        assert_eq!(update.amount, 45.0);
        assert_eq!(update.bidder_name, "John Smith");
    }

    #[test]
    fn test_scan_html() {
        let html = r#"<html><head><style>.c { width: 150px; }</style></head><body>
            <div class="comment"><div><a>Jane Doe</a></div><div>75</div>
            <div><span>1h</span></div><div><span>Like</span> <span>Reply</span></div></div>
            </body></html>"#;
        let update = engine()
            .scan_html("a1", html, &AuctionFloor::new(50.0, 10.0), &mut MemorySeenSet::new())
            .unwrap()
            .into_update()
            .unwrap();
        assert_eq!(update.amount, 75.0);
        assert_eq!(update.bidder_name, "Jane Doe");
    }

    #[test]
    fn test_facebook_profile_requires_markers() {
        let engine = BidEngine::new(EngineOptions::facebook_extension()).unwrap();
        let floor = AuctionFloor::default();

        let plain = engine
            .scan("a1", "bid 60", &floor, &mut MemorySeenSet::new())
            .unwrap();
        assert_eq!(plain, ScanResult::NoUpdate);

        let marked = engine
            .scan("a1", "bid 60 2h Reply", &floor, &mut MemorySeenSet::new())
            .unwrap();
        assert!(marked.is_found());
    }

    #[test]
    fn test_free_function() {
        let mut seen = MemorySeenSet::new();
        let result = scan(
            "a1",
            "John Smith\n45\n2h\nReply\nShare",
            &AuctionFloor::new(20.0, 10.0),
            &mut seen,
            None,
        )
        .unwrap();
        assert!(result.is_found());
        assert!(seen.has("a1:45:John Smith"));

        let bad = EngineOptions {
            min_amount: -1.0,
            ..EngineOptions::default()
        };
        assert!(scan("a1", "45", &AuctionFloor::default(), &mut seen, Some(bad)).is_err());
    }

    #[test]
    fn test_name_with_inner_capital() {
        let mut seen = MemorySeenSet::new();
        let update = engine()
            .scan(
                "a1",
                "Sarah McDonald\n45\n2h\nReply\nShare",
                &AuctionFloor::new(20.0, 10.0),
                &mut seen,
            )
            .unwrap()
            .into_update()
            .unwrap();
        assert_eq!(update.bidder_name, "Sarah McDonald");
        assert!(seen.has("a1:45:Sarah McDonald"));
    }

    #[test]
    fn test_phone_number_is_not_a_bid() {
        let floor = AuctionFloor::new(0.0, 10.0);
        assert_eq!(
            scan_fresh("Mary Jones\n555-123-4567\n2h\nReply", floor),
            ScanResult::NoUpdate
        );
        assert_eq!(
            scan_fresh("Mary Jones call 555 123 4567 2h Reply", floor),
            ScanResult::NoUpdate
        );
    }

    #[test]
    fn test_thousands_separator() {
        let update = scan_fresh("$1,200 bid from Tom Lee 2h Reply", AuctionFloor::new(0.0, 10.0))
            .into_update()
            .unwrap();
        assert_eq!(update.amount, 1200.0);

        // Over the jump limit once there is a current bid; the trailing group
        // is never reported on its own.
        assert_eq!(
            scan_fresh("$1,200 bid from Tom Lee 2h Reply", AuctionFloor::new(150.0, 10.0)),
            ScanResult::NoUpdate
        );
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BidEngine>();
    }
}
