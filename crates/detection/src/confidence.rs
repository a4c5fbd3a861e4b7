//! Confidence scoring.
//!
//! Confidence only ranks bids that already passed validation; it never
//! decides whether a candidate is accepted.

use opal_core::{Amount, BidCandidate, PatternKind, ScoringConfig};

/// Confidence scorer.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    config: ScoringConfig,
    min_amount: Amount,
    max_amount: Amount,
}

impl ConfidenceScorer {
    /// Create a scorer for the given plausible range.
    pub fn new(config: &ScoringConfig, min_amount: Amount, max_amount: Amount) -> Self {
        Self {
            config: config.clone(),
            min_amount,
            max_amount,
        }
    }

    /// Weight added for the producing pattern.
    pub fn kind_weight(&self, kind: PatternKind) -> f64 {
        match kind {
            PatternKind::ExplicitBidStatement => self.config.explicit_weight,
            PatternKind::FacebookMultiline | PatternKind::NameAmountConcatenated => {
                self.config.structural_weight
            }
            PatternKind::DollarSign => self.config.dollar_weight,
            PatternKind::CurrencyPhrase => self.config.currency_weight,
            PatternKind::StandaloneNumber => self.config.standalone_weight,
        }
    }

    /// Is the amount inside the typical bid range?
    pub fn is_typical(&self, amount: Amount) -> bool {
        (self.config.typical_min..=self.config.typical_max).contains(&amount)
    }

    /// Is the amount near either end of the plausible range?
    pub fn is_edge(&self, amount: Amount) -> bool {
        amount < self.min_amount * self.config.low_edge_factor
            || amount > self.max_amount * self.config.high_edge_factor
    }

    /// Score a candidate in [0, 1].
    pub fn score(&self, candidate: &BidCandidate) -> f64 {
        let mut score = self.config.base + self.kind_weight(candidate.pattern_kind);
        if self.is_typical(candidate.amount) {
            score += self.config.typical_bonus;
        }
        if self.is_edge(candidate.amount) {
            score -= self.config.edge_penalty;
        }
        score.clamp(0.0, 1.0)
    }
}
