//! Bid validation.
//!
//! Validity is binary. A candidate either passes every rule or is dropped
//! with a [`Rejection`] reason; confidence plays no part here.

use crate::confidence::ConfidenceScorer;
use opal_core::{
    Amount, AuctionFloor, BidCandidate, EngineOptions, Error, Result, ValidatedBid,
};
use opal_ingestion::signals;
use regex::Regex;

/// Why a candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("amount is not positive")]
    NonPositive,
    #[error("amount is outside the plausible range")]
    OutOfRange,
    #[error("amount is on the reject list")]
    RejectListed,
    #[error("amount looks like a calendar year")]
    CalendarYear,
    #[error("amount does not exceed the current floor")]
    NotAboveFloor,
    #[error("amount jumps too far above the current bid")]
    ExcessiveJump,
    #[error("context looks like page chrome")]
    TechnicalContext,
    #[error("no corroborating comment markers")]
    Uncorroborated,
    #[error("no Facebook comment markers")]
    MissingFacebookMarkers,
}

const AMOUNT_EPSILON: f64 = 1e-9;

/// Bid validator.
#[derive(Debug, Clone)]
pub struct BidValidator {
    min_amount: Amount,
    max_amount: Amount,
    max_jump: Option<Amount>,
    reject_amounts: Vec<Amount>,
    require_facebook_markers: bool,
    adjacent_name_span: usize,
    denylist: Vec<Regex>,
    scorer: ConfidenceScorer,
}

impl BidValidator {
    /// Create a validator, compiling the context denylist.
    pub fn new(options: &EngineOptions) -> Result<Self> {
        let denylist = options
            .context
            .denylist
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    Error::malformed_options(format!(
                        "invalid denylist pattern {:?}: {}",
                        pattern, e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            min_amount: options.min_amount,
            max_amount: options.max_amount,
            max_jump: options.max_jump,
            reject_amounts: options.reject_amounts.clone(),
            require_facebook_markers: options.require_facebook_markers,
            adjacent_name_span: options.context.adjacent_name_span,
            denylist,
            scorer: ConfidenceScorer::new(&options.scoring, options.min_amount, options.max_amount),
        })
    }

    /// Check a candidate against every rule.
    pub fn check(
        &self,
        candidate: &BidCandidate,
        floor: &AuctionFloor,
    ) -> std::result::Result<(), Rejection> {
        let amount = candidate.amount;
        if amount <= 0.0 {
            return Err(Rejection::NonPositive);
        }
        if amount < self.min_amount || amount > self.max_amount {
            return Err(Rejection::OutOfRange);
        }
        if self
            .reject_amounts
            .iter()
            .any(|r| (r - amount).abs() < AMOUNT_EPSILON)
        {
            return Err(Rejection::RejectListed);
        }
        if is_calendar_year(amount) {
            return Err(Rejection::CalendarYear);
        }
        if amount <= floor.floor() {
            return Err(Rejection::NotAboveFloor);
        }
        if let Some(max_jump) = self.max_jump {
            if floor.has_current_bid() && amount > floor.floor() + max_jump {
                return Err(Rejection::ExcessiveJump);
            }
        }
        if self.denylist.iter().any(|re| re.is_match(&candidate.context)) {
            return Err(Rejection::TechnicalContext);
        }
        if candidate.pattern_kind.is_low_trust()
            && !signals::is_corroborated(
                &candidate.context,
                candidate.context_offset,
                self.adjacent_name_span,
            )
        {
            return Err(Rejection::Uncorroborated);
        }
        if self.require_facebook_markers
            && !signals::has_ui_marker(&candidate.context)
            && !signals::has_time_token(&candidate.context)
        {
            return Err(Rejection::MissingFacebookMarkers);
        }
        Ok(())
    }

    /// Promote an accepted candidate.
    pub fn accept(&self, candidate: BidCandidate, bidder_name: String) -> ValidatedBid {
        let confidence = self.scorer.score(&candidate);
        ValidatedBid {
            candidate,
            bidder_name,
            confidence,
            is_valid: true,
        }
    }
}

fn is_calendar_year(amount: Amount) -> bool {
    amount.fract() == 0.0 && (1900.0..=2099.0).contains(&amount)
}
