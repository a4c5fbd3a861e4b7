//! Candidate scanner.
//!
//! Runs an ordered battery of matchers over the document. Each matcher
//! claims the spans it matches so a later, less trustworthy matcher never
//! reports the same digits again:
//!
//! 1. `name_amount_concatenated` - `JaneDoe3802hLikeReplyShare`
//! 2. `facebook_multiline` - name, amount, age and action lines
//! 3. `explicit_bid_statement` - `bid: $45`, `i'll pay 60`
//! 4. `dollar_sign` - `$45`
//! 5. `currency_phrase` - `45 dollars`, `60 for me`
//! 6. `standalone_number` - bare 2-4 digit tokens, corroborated
//!
//! Phone numbers are claimed before any matcher runs.

use crate::signals;
use crate::splitter::split_amount_and_age;
use crate::window::{context_window, looks_like_sequence};
use opal_core::{Amount, BidCandidate, EngineOptions, PatternKind, SourceHints};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// A number as written in a comment: `1,200`, `45`, `12.50`.
const NUM: &str = r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?";

lazy_static::lazy_static! {
    static ref CONCATENATED: Regex = Regex::new(
        r"([A-Z][a-z]+(?:[ ]?[A-Z][a-z]+){1,2})[ ]?(\d+(?:\.\d+)?)([dhmwy])(?:Like|Reply|Share)"
    ).unwrap();
    static ref AMOUNT_LINE: Regex = Regex::new(&format!(r"^\$?({})$", NUM)).unwrap();
    static ref AGE_LINE: Regex = Regex::new(r"^\d{1,2}\s?[dhmwy]$").unwrap();
    static ref ACTION_LINE: Regex = Regex::new(r"^(?:Like|Reply|Share)\b").unwrap();
    static ref EXPLICIT: Regex = Regex::new(&format!(
        r"(?i)\b(?:bid|offer|take|i'?ll\s+(?:pay|go|do|bid)|i\s+will\s+(?:pay|go|do))\s*:?\s*\$?\s?({})",
        NUM
    )).unwrap();
    static ref DOLLAR: Regex = Regex::new(&format!(r"\$\s?({})", NUM)).unwrap();
    static ref CURRENCY: Regex = Regex::new(&format!(
        r"(?i)({})\s*(?:dollars?|bucks?|for\s+me|please|firm|final)\b",
        NUM
    )).unwrap();
    static ref NUMBER: Regex = Regex::new(NUM).unwrap();
    static ref PHONE: Regex = Regex::new(
        r"(?:\+\d{1,3}[ -]?|\b0)\d(?:[ -]?\d){7,}|(?:\(\d{3}\)\s?|\b\d{3}[-. ])\d{3}[-. ]\d{4}\b"
    ).unwrap();
}

/// Parse a matched number: 1-4 integer digits, up to two fraction digits.
/// Thousands separators are dropped (`1,200` is 1200).
pub fn parse_amount(digits: &str) -> Option<Amount> {
    let digits = digits.replace(',', "");
    let (int_part, fraction) = match digits.split_once('.') {
        Some((int_part, fraction)) => (int_part, Some(fraction)),
        None => (digits.as_str(), None),
    };
    if int_part.is_empty() || int_part.len() > 4 {
        return None;
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty() || fraction.len() > 2 {
            return None;
        }
    }
    let amount: Amount = digits.parse().ok()?;
    (amount > 0.0).then_some(amount)
}

/// A match waiting for its context window.
struct Hit {
    start: usize,
    end: usize,
    amount: Amount,
    kind: PatternKind,
    name_hint: Option<String>,
}

/// Per-scan mutable state.
struct ScanState<'t> {
    text: &'t str,
    /// Byte offsets of every `\n`.
    newlines: Vec<usize>,
    /// Claimed spans, disjoint, keyed by start.
    claims: BTreeMap<usize, usize>,
    candidates: Vec<BidCandidate>,
}

impl<'t> ScanState<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            newlines: text.match_indices('\n').map(|(i, _)| i).collect(),
            claims: BTreeMap::new(),
            candidates: Vec::new(),
        }
    }

    fn is_claimed(&self, start: usize, end: usize) -> bool {
        self.claims
            .range(..end)
            .next_back()
            .is_some_and(|(_, &claim_end)| claim_end > start)
    }

    fn claim(&mut self, start: usize, end: usize) {
        let overlapping: Vec<(usize, usize)> = self
            .claims
            .range(..end)
            .rev()
            .take_while(|(_, &claim_end)| claim_end > start)
            .map(|(&s, &e)| (s, e))
            .collect();

        let (mut lo, mut hi) = (start, end);
        for (s, e) in overlapping {
            self.claims.remove(&s);
            lo = lo.min(s);
            hi = hi.max(e);
        }
        self.claims.insert(lo, hi);
    }

    /// Byte range of the line holding `[start, end)`, without its `\n`.
    fn line_bounds(&self, start: usize, end: usize) -> (usize, usize) {
        let before = self.newlines.partition_point(|&n| n < start);
        let line_start = before.checked_sub(1).map_or(0, |i| self.newlines[i] + 1);
        let after = self.newlines.partition_point(|&n| n < end);
        let line_end = self.newlines.get(after).copied().unwrap_or(self.text.len());
        (line_start, line_end)
    }
}

/// Candidate scanner.
#[derive(Debug, Clone)]
pub struct CandidateScanner {
    context_radius: usize,
    short_text_len: usize,
    sequence_min_distinct: usize,
    sequence_min_run: usize,
    adjacent_name_span: usize,
}

impl CandidateScanner {
    /// Create a scanner from engine options.
    pub fn new(options: &EngineOptions) -> Self {
        Self {
            context_radius: options.scanner.context_radius,
            short_text_len: options.scanner.short_text_len,
            sequence_min_distinct: options.scanner.sequence_min_distinct,
            sequence_min_run: options.scanner.sequence_min_run,
            adjacent_name_span: options.context.adjacent_name_span,
        }
    }

    /// Context radius in bytes.
    pub fn context_radius(&self) -> usize {
        self.context_radius
    }

    /// Scan a document for bid candidates, ordered by position.
    pub fn scan(&self, text: &str, hints: SourceHints) -> Vec<BidCandidate> {
        let mut state = ScanState::new(text);

        for m in PHONE.find_iter(text) {
            state.claim(m.start(), m.end());
        }

        if hints.has_facebook_chrome != Some(false) {
            self.scan_concatenated(&mut state);
            self.scan_multiline(&mut state);
        }
        self.scan_explicit(&mut state);
        self.scan_dollar(&mut state);
        self.scan_currency(&mut state);
        self.scan_standalone(&mut state);

        let mut candidates = state.candidates;
        candidates.sort_by_key(|c| (c.position, c.priority()));
        candidates
    }

    fn emit(&self, state: &mut ScanState<'_>, hit: Hit) {
        if state.is_claimed(hit.start, hit.end) {
            return;
        }
        state.claim(hit.start, hit.end);

        let (context, context_offset) =
            context_window(state.text, hit.start, hit.end, self.context_radius);
        if looks_like_sequence(&context, self.sequence_min_distinct, self.sequence_min_run) {
            debug!(
                position = hit.start,
                kind = %hit.kind,
                "Dropping candidate inside a numeric sequence"
            );
            return;
        }

        state.candidates.push(BidCandidate {
            amount: hit.amount,
            raw_match: state.text[hit.start..hit.end].to_string(),
            context,
            context_offset,
            pattern_kind: hit.kind,
            position: hit.start,
            name_hint: hit.name_hint,
        });
    }

    fn scan_concatenated(&self, state: &mut ScanState<'_>) {
        let text = state.text;
        for caps in CONCATENATED.captures_iter(text) {
            let (Some(whole), Some(name), Some(run), Some(unit)) =
                (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
            else {
                continue;
            };
            let unit = unit.as_str().chars().next().unwrap_or_default();

            match split_amount_and_age(run.as_str(), unit) {
                Some(split) => self.emit(
                    state,
                    Hit {
                        start: whole.start(),
                        end: whole.end(),
                        amount: split.amount,
                        kind: PatternKind::NameAmountConcatenated,
                        name_hint: Some(name.as_str().to_string()),
                    },
                ),
                None => {
                    debug!(
                        run = run.as_str(),
                        unit = %unit,
                        position = whole.start(),
                        "Dropping ambiguous concatenated run"
                    );
                    state.claim(whole.start(), whole.end());
                }
            }
        }
    }

    fn scan_multiline(&self, state: &mut ScanState<'_>) {
        let lines = trimmed_lines(state.text);
        for (i, &(line, offset)) in lines.iter().enumerate() {
            let Some(digits) = AMOUNT_LINE.captures(line).and_then(|c| c.get(1)) else {
                continue;
            };
            let Some(&(age_line, _)) = lines.get(i + 1) else {
                continue;
            };
            if !AGE_LINE.is_match(age_line) {
                continue;
            }
            let has_action = lines
                .iter()
                .skip(i + 2)
                .take(3)
                .any(|&(l, _)| ACTION_LINE.is_match(l));
            if !has_action {
                continue;
            }
            let Some(amount) = parse_amount(digits.as_str()) else {
                continue;
            };

            let name_hint = i
                .checked_sub(1)
                .and_then(|prev| lines.get(prev))
                .map(|&(l, _)| l.to_string());
            self.emit(
                state,
                Hit {
                    start: offset,
                    end: offset + line.len(),
                    amount,
                    kind: PatternKind::FacebookMultiline,
                    name_hint,
                },
            );
        }
    }

    fn scan_explicit(&self, state: &mut ScanState<'_>) {
        let text = state.text;
        for caps in EXPLICIT.captures_iter(text) {
            let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if let Some(amount) = parse_amount(digits.as_str()) {
                self.emit(
                    state,
                    Hit {
                        start: whole.start(),
                        end: whole.end(),
                        amount,
                        kind: PatternKind::ExplicitBidStatement,
                        name_hint: None,
                    },
                );
            }
        }
    }

    fn scan_dollar(&self, state: &mut ScanState<'_>) {
        let text = state.text;
        for caps in DOLLAR.captures_iter(text) {
            let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if next_char(text, whole.end()).is_some_and(|c| c.is_alphanumeric()) {
                continue;
            }
            if let Some(amount) = parse_amount(digits.as_str()) {
                self.emit(
                    state,
                    Hit {
                        start: whole.start(),
                        end: whole.end(),
                        amount,
                        kind: PatternKind::DollarSign,
                        name_hint: None,
                    },
                );
            }
        }
    }

    fn scan_currency(&self, state: &mut ScanState<'_>) {
        let text = state.text;
        for caps in CURRENCY.captures_iter(text) {
            let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if prev_char(text, whole.start()).is_some_and(|c| c.is_alphanumeric() || c == '.') {
                continue;
            }
            if let Some(amount) = parse_amount(digits.as_str()) {
                self.emit(
                    state,
                    Hit {
                        start: whole.start(),
                        end: whole.end(),
                        amount,
                        kind: PatternKind::CurrencyPhrase,
                        name_hint: None,
                    },
                );
            }
        }
    }

    fn scan_standalone(&self, state: &mut ScanState<'_>) {
        let text = state.text;
        for m in NUMBER.find_iter(text) {
            if prev_char(text, m.start()).is_some_and(|c| c.is_alphanumeric() || c == '$' || c == '.')
                || next_char(text, m.end()).is_some_and(|c| c.is_alphanumeric())
            {
                continue;
            }
            let int_len = m
                .as_str()
                .split('.')
                .next()
                .map_or(0, |int_part| int_part.bytes().filter(u8::is_ascii_digit).count());
            if !(2..=4).contains(&int_len) || state.is_claimed(m.start(), m.end()) {
                continue;
            }
            let Some(amount) = parse_amount(m.as_str()) else {
                continue;
            };

            if !self.is_short_line(state, m.start(), m.end()) {
                let (context, offset) =
                    context_window(text, m.start(), m.end(), self.context_radius);
                if !signals::is_corroborated(&context, offset, self.adjacent_name_span) {
                    continue;
                }
            }

            self.emit(
                state,
                Hit {
                    start: m.start(),
                    end: m.end(),
                    amount,
                    kind: PatternKind::StandaloneNumber,
                    name_hint: None,
                },
            );
        }
    }

    fn is_short_line(&self, state: &ScanState<'_>, start: usize, end: usize) -> bool {
        let (line_start, line_end) = state.line_bounds(start, end);
        state.text[line_start..line_end]
            .trim()
            .chars()
            .take(self.short_text_len)
            .count()
            < self.short_text_len
    }
}

/// Non-empty trimmed lines with the byte offset of their first character.
fn trimmed_lines(text: &str) -> Vec<(&str, usize)> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for raw in text.split('\n') {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let lead = raw.len() - raw.trim_start().len();
            lines.push((trimmed, offset + lead));
        }
        offset += raw.len() + 1;
    }
    lines
}

fn prev_char(text: &str, index: usize) -> Option<char> {
    text[..index].chars().next_back()
}

fn next_char(text: &str, index: usize) -> Option<char> {
    text[index..].chars().next()
}
