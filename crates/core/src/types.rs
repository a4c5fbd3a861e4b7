//! Core data types for the opal bid engine.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Monetary amount parsed from comment text.
pub type Amount = f64;

/// Byte offset into a scanned document.
pub type Position = usize;

/// Bidder name reported when no candidate name survives cleaning.
pub const UNKNOWN_BIDDER: &str = "Unknown";

/// Extraction pattern that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// "bid 45", "offer: $60", "i'll pay 80".
    ExplicitBidStatement,
    /// "$45".
    DollarSign,
    /// "45 dollars", "60 for me", "200 firm".
    CurrencyPhrase,
    /// Name, amount, age and action tokens on consecutive lines.
    FacebookMultiline,
    /// Name, amount, age and action tokens with whitespace collapsed.
    NameAmountConcatenated,
    /// Bare 2-4 digit number.
    StandaloneNumber,
}

impl PatternKind {
    /// All kinds, in the order the scanner applies them.
    pub const ALL: [PatternKind; 6] = [
        PatternKind::NameAmountConcatenated,
        PatternKind::FacebookMultiline,
        PatternKind::ExplicitBidStatement,
        PatternKind::DollarSign,
        PatternKind::CurrencyPhrase,
        PatternKind::StandaloneNumber,
    ];

    /// Get the priority (lower = more trustworthy).
    pub fn priority(self) -> u8 {
        match self {
            PatternKind::ExplicitBidStatement
            | PatternKind::FacebookMultiline
            | PatternKind::NameAmountConcatenated => 1,
            PatternKind::DollarSign | PatternKind::CurrencyPhrase => 2,
            PatternKind::StandaloneNumber => 4,
        }
    }

    /// Is this one of the Facebook comment layouts?
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            PatternKind::FacebookMultiline | PatternKind::NameAmountConcatenated
        )
    }

    /// Low-trust kinds need corroborating context to be accepted.
    pub fn is_low_trust(self) -> bool {
        self.priority() >= 4
    }

    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::ExplicitBidStatement => "explicit_bid_statement",
            PatternKind::DollarSign => "dollar_sign",
            PatternKind::CurrencyPhrase => "currency_phrase",
            PatternKind::FacebookMultiline => "facebook_multiline",
            PatternKind::NameAmountConcatenated => "name_amount_concatenated",
            PatternKind::StandaloneNumber => "standalone_number",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Caller hints about the scanned document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceHints {
    /// Whether the text was taken from a Facebook page. `None` lets the
    /// scanner decide from the text itself.
    pub has_facebook_chrome: Option<bool>,
}

impl SourceHints {
    /// Hints for a document known to come from Facebook.
    pub fn facebook() -> Self {
        Self {
            has_facebook_chrome: Some(true),
        }
    }

    /// Hints for a document known not to come from Facebook.
    pub fn generic() -> Self {
        Self {
            has_facebook_chrome: Some(false),
        }
    }
}

/// A provisional detection, created per scan and discarded after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidCandidate {
    /// Parsed amount (always > 0).
    pub amount: Amount,
    /// Exact matched substring.
    pub raw_match: String,
    /// Bounded window of surrounding text; contains `raw_match`.
    pub context: String,
    /// Byte offset of `raw_match` inside `context`.
    pub context_offset: usize,
    /// Pattern that produced the match.
    pub pattern_kind: PatternKind,
    /// Byte offset of `raw_match` in the scanned document.
    pub position: Position,
    /// Name captured by a structural pattern, before cleaning.
    pub name_hint: Option<String>,
}

impl BidCandidate {
    /// Get the priority of the producing pattern.
    #[inline]
    pub fn priority(&self) -> u8 {
        self.pattern_kind.priority()
    }

    /// Context text before the match.
    pub fn text_before(&self) -> &str {
        &self.context[..self.context_offset]
    }

    /// Context text after the match.
    pub fn text_after(&self) -> &str {
        &self.context[self.context_offset + self.raw_match.len()..]
    }
}

/// A candidate that passed validation. Lives for one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedBid {
    /// The accepted candidate.
    pub candidate: BidCandidate,
    /// Cleaned bidder name, or [`UNKNOWN_BIDDER`].
    pub bidder_name: String,
    /// Ranking score in [0, 1].
    pub confidence: f64,
    /// Always true; marks the validation boundary.
    pub is_valid: bool,
}

impl ValidatedBid {
    /// Get the bid amount.
    #[inline]
    pub fn amount(&self) -> Amount {
        self.candidate.amount
    }

    /// Get the document position.
    #[inline]
    pub fn position(&self) -> Position {
        self.candidate.position
    }

    /// Convert into the reported update.
    pub fn into_update(self) -> BidUpdate {
        BidUpdate {
            amount: self.candidate.amount,
            bidder_name: self.bidder_name,
            confidence: self.confidence,
            pattern_kind: self.candidate.pattern_kind,
            raw_match: self.candidate.raw_match,
            position: self.candidate.position,
        }
    }
}

/// Minimum acceptable bid inputs for one auction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionFloor {
    /// Current highest bid (0 when nobody has bid).
    pub current_bid: Amount,
    /// Starting bid.
    pub starting_bid: Amount,
}

impl AuctionFloor {
    /// Create a new floor.
    pub fn new(current_bid: Amount, starting_bid: Amount) -> Self {
        Self {
            current_bid,
            starting_bid,
        }
    }

    /// Amount a new bid must strictly exceed.
    #[inline]
    pub fn floor(&self) -> Amount {
        self.current_bid.max(self.starting_bid)
    }

    /// Has anyone bid yet?
    #[inline]
    pub fn has_current_bid(&self) -> bool {
        self.current_bid > 0.0
    }
}

/// Persisted bid state of an auction. Owned by the caller's storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionBidState {
    /// Current highest bid.
    pub current_bid: Amount,
    /// Current highest bidder.
    pub current_bidder: Option<String>,
    /// Starting bid.
    pub starting_bid: Amount,
}

impl AuctionBidState {
    /// Create state for an auction nobody has bid on.
    pub fn opening(starting_bid: Amount) -> Self {
        Self {
            current_bid: 0.0,
            current_bidder: None,
            starting_bid,
        }
    }

    /// Floor view used by the engine.
    pub fn floor(&self) -> AuctionFloor {
        AuctionFloor::new(self.current_bid, self.starting_bid)
    }

    /// Record a new highest bid. Returns false if it does not raise the floor.
    pub fn record(&mut self, amount: Amount, bidder: &str) -> bool {
        if amount <= self.floor().floor() {
            return false;
        }
        self.current_bid = amount;
        self.current_bidder = Some(bidder.to_string());
        true
    }
}

/// The single new bid reported for an auction by one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidUpdate {
    pub amount: Amount,
    pub bidder_name: String,
    pub confidence: f64,
    pub pattern_kind: PatternKind,
    pub raw_match: String,
    pub position: Position,
}

/// Outcome of one scan.
///
/// Serializes as `{"found": false}` or
/// `{"found": true, "amount": .., "bidderName": .., "confidence": ..,
/// "patternKind": .., "rawMatch": ..}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanResult {
    /// Nothing new; the normal quiet-period outcome.
    NoUpdate,
    /// A new bid to report.
    Found(BidUpdate),
}

impl ScanResult {
    /// Was a new bid found?
    pub fn is_found(&self) -> bool {
        matches!(self, ScanResult::Found(_))
    }

    /// Get the update, if any.
    pub fn update(&self) -> Option<&BidUpdate> {
        match self {
            ScanResult::Found(update) => Some(update),
            ScanResult::NoUpdate => None,
        }
    }

    /// Take the update, if any.
    pub fn into_update(self) -> Option<BidUpdate> {
        match self {
            ScanResult::Found(update) => Some(update),
            ScanResult::NoUpdate => None,
        }
    }
}

impl Serialize for ScanResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ScanResult::NoUpdate => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("found", &false)?;
                map.end()
            }
            ScanResult::Found(update) => {
                let mut map = serializer.serialize_map(Some(6))?;
                map.serialize_entry("found", &true)?;
                map.serialize_entry("amount", &update.amount)?;
                map.serialize_entry("bidderName", &update.bidder_name)?;
                map.serialize_entry("confidence", &update.confidence)?;
                map.serialize_entry("patternKind", &update.pattern_kind)?;
                map.serialize_entry("rawMatch", &update.raw_match)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_candidate(context: &str, raw: &str) -> BidCandidate {
        let offset = context.find(raw).unwrap();
        BidCandidate {
            amount: 45.0,
            raw_match: raw.to_string(),
            context: context.to_string(),
            context_offset: offset,
            pattern_kind: PatternKind::DollarSign,
            position: offset,
            name_hint: None,
        }
    }

    #[test]
    fn test_pattern_priority() {
        assert!(PatternKind::ExplicitBidStatement.priority() < PatternKind::DollarSign.priority());
        assert!(PatternKind::DollarSign.priority() < PatternKind::StandaloneNumber.priority());
        assert_eq!(PatternKind::FacebookMultiline.priority(), 1);
        assert!(PatternKind::StandaloneNumber.is_low_trust());
        assert!(!PatternKind::CurrencyPhrase.is_low_trust());
        assert!(PatternKind::NameAmountConcatenated.is_structural());
    }

    #[test]
    fn test_pattern_kind_wire_names() {
        for kind in PatternKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
    }

    #[test]
    fn test_candidate_context_slices() {
        let candidate = make_candidate("Mary Jones $45 please", "$45");
        assert_eq!(candidate.text_before(), "Mary Jones ");
        assert_eq!(candidate.text_after(), " please");
    }

    #[test]
    fn test_floor_is_max_of_current_and_starting() {
        assert_eq!(AuctionFloor::new(20.0, 10.0).floor(), 20.0);
        assert_eq!(AuctionFloor::new(0.0, 25.0).floor(), 25.0);
        assert!(!AuctionFloor::new(0.0, 25.0).has_current_bid());
    }

    #[test]
    fn test_state_record_only_raises() {
        let mut state = AuctionBidState::opening(20.0);
        assert!(!state.record(20.0, "Jane Doe"));
        assert!(state.record(35.0, "Jane Doe"));
        assert!(!state.record(30.0, "John Smith"));
        assert_eq!(state.current_bid, 35.0);
        assert_eq!(state.current_bidder.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_scan_result_serialization() {
        assert_eq!(
            serde_json::to_value(ScanResult::NoUpdate).unwrap(),
            json!({ "found": false })
        );

        let found = ScanResult::Found(BidUpdate {
            amount: 45.0,
            bidder_name: "John Smith".to_string(),
            confidence: 0.9,
            pattern_kind: PatternKind::FacebookMultiline,
            raw_match: "45".to_string(),
            position: 11,
        });
        assert_eq!(
            serde_json::to_value(&found).unwrap(),
            json!({
                "found": true,
                "amount": 45.0,
                "bidderName": "John Smith",
                "confidence": 0.9,
                "patternKind": "facebook_multiline",
                "rawMatch": "45",
            })
        );
        assert!(found.is_found());
        assert_eq!(found.update().map(|u| u.amount), Some(45.0));
    }
}
