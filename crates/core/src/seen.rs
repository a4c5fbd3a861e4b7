//! Caller-owned record of bids already reported per auction.
//!
//! Keys have the form `{auction_id}:{amount}:{bidder_name}`, with the amount
//! rendered without trailing zeros (`45`, `12.5`, `380.75`).

use crate::types::Amount;
use std::collections::HashSet;

/// Persistence contract for reported bids.
///
/// Implementations may be in-memory or database-backed. The engine only
/// reads and adds keys; it never removes them.
pub trait SeenSet {
    /// Has this key been reported?
    fn has(&self, key: &str) -> bool;

    /// Record a reported key.
    fn add(&mut self, key: &str);
}

/// Render an amount the way it appears in seen-set keys.
pub fn format_amount(amount: Amount) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        let fixed = format!("{:.2}", amount);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Build the seen-set key for a reported bid.
pub fn seen_key(auction_id: &str, amount: Amount, bidder_name: &str) -> String {
    format!("{}:{}:{}", auction_id, format_amount(amount), bidder_name)
}

/// In-memory seen-set.
#[derive(Debug, Clone, Default)]
pub struct MemorySeenSet {
    keys: HashSet<String>,
}

impl MemorySeenSet {
    /// Create an empty seen-set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Is the set empty?
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Drop every key recorded for one auction.
    pub fn forget_auction(&mut self, auction_id: &str) {
        let prefix = format!("{}:", auction_id);
        self.keys.retain(|key| !key.starts_with(&prefix));
    }

    /// Clear all keys.
    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

impl SeenSet for MemorySeenSet {
    fn has(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn add(&mut self, key: &str) {
        self.keys.insert(key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(45.0), "45");
        assert_eq!(format_amount(12.5), "12.5");
        assert_eq!(format_amount(380.75), "380.75");
        assert_eq!(format_amount(100.10), "100.1");
    }

    #[test]
    fn test_seen_key_format() {
        assert_eq!(seen_key("auction-7", 45.0, "John Smith"), "auction-7:45:John Smith");
        assert_eq!(seen_key("a1", 12.5, "Unknown"), "a1:12.5:Unknown");
    }

    #[test]
    fn test_memory_seen_set() {
        let mut seen = MemorySeenSet::new();
        let key = seen_key("a1", 45.0, "John Smith");
        assert!(!seen.has(&key));

        seen.add(&key);
        seen.add(&key);
        assert!(seen.has(&key));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_forget_auction_keeps_other_auctions() {
        let mut seen = MemorySeenSet::new();
        seen.add(&seen_key("a1", 45.0, "John Smith"));
        seen.add(&seen_key("a10", 50.0, "Jane Doe"));

        seen.forget_auction("a1");
        assert!(!seen.has(&seen_key("a1", 45.0, "John Smith")));
        assert!(seen.has(&seen_key("a10", 50.0, "Jane Doe")));
    }
}
