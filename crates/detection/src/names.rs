//! Bidder name extraction and cleaning.
//!
//! Names are recovered in three steps, first success wins:
//! 1. the capitalised run right before the amount (or the name captured by a
//!    structural pattern),
//! 2. `First Last` on the preceding lines, nearest first,
//! 3. any `First Last` in the context window.
//!
//! Every step goes through [`clean_name`]. When nothing survives the bidder
//! is reported as [`UNKNOWN_BIDDER`] rather than guessed.

use opal_core::{BidCandidate, UNKNOWN_BIDDER};
use regex::Regex;
use std::borrow::Cow;

lazy_static::lazy_static! {
    static ref LOWER_UPPER: Regex = Regex::new(r"(\p{Ll})(\p{Lu})").unwrap();
    static ref LETTER_DIGIT: Regex = Regex::new(r"(\p{L})(\d)").unwrap();
    static ref NUMERIC_TOKEN: Regex = Regex::new(r"^\$?\d+(?:\.\d+)?[dhmwy]?$").unwrap();
    static ref FULL_NAME: Regex = Regex::new(r"\b[A-Z][a-z]+ [A-Z][a-z]+\b").unwrap();
    static ref TRAILING_NAME: Regex =
        Regex::new(r"([A-Z][a-z]+(?:[ ]?[A-Z][a-z]+){1,2})[\s:,\-]*$").unwrap();
    static ref DATE_LITERAL: Regex = Regex::new(
        r"(?i)\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?\b"
    ).unwrap();
    static ref NOISE: Regex = Regex::new(
        r"(?i)\b(?:most relevant|all comments|newest|top comments|shipping|postage|free post|within australia|log in|sign up|opal trading post|sponsored|follow(?:ing)?|author|admin|moderator|top fan|bid|bidder|just now|yesterday|today|see more|view more|see translation|write a comment|reserve|auction|starting bid|current bid)\b"
    ).unwrap();
}

/// Facebook chrome tokens that border names in scraped text.
const UI_TOKENS: &[&str] = &[
    "like", "reply", "share", "edit", "delete", "facebook", "loading", "unknown",
    "advertiser", "hide", "report",
];

/// Multi-word chrome phrases.
const UI_PHRASES: &[&[&str]] = &[&["open", "menu"], &["learn", "more"]];

/// Words that are dates, not names.
const DATE_WORDS: &[&str] = &[
    "mon", "tue", "tues", "wed", "thu", "thur", "thurs", "fri", "sat", "sun", "monday",
    "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "jan", "feb", "mar",
    "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "january", "february",
    "march", "april", "may", "june", "july", "august", "september", "october", "november",
    "december",
];

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 50;

fn is_ui_token(token: &str) -> bool {
    UI_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(token))
}

fn is_edge_token(token: &str) -> bool {
    is_ui_token(token) || NUMERIC_TOKEN.is_match(token)
}

fn phrase_at(tokens: &[&str], phrase: &[&str]) -> bool {
    tokens.len() >= phrase.len()
        && tokens
            .iter()
            .zip(phrase)
            .all(|(token, word)| token.eq_ignore_ascii_case(word))
}

fn strip_edges(tokens: &mut Vec<&str>) {
    loop {
        if let Some(first) = tokens.first() {
            if is_edge_token(first) {
                tokens.remove(0);
                continue;
            }
        }
        if let Some(last) = tokens.last() {
            if is_edge_token(last) {
                tokens.pop();
                continue;
            }
        }
        if let Some(phrase) = UI_PHRASES.iter().find(|p| phrase_at(tokens, p)) {
            tokens.drain(..phrase.len());
            continue;
        }
        let tail_phrase = UI_PHRASES.iter().find(|p| {
            tokens.len() >= p.len() && phrase_at(&tokens[tokens.len() - p.len()..], p)
        });
        if let Some(phrase) = tail_phrase {
            tokens.truncate(tokens.len() - phrase.len());
            continue;
        }
        break;
    }
}

/// Clean a raw name candidate.
///
/// Re-spaces collapsed text (`JaneDoe3802h` → `Jane Doe 3802h`), strips UI
/// chrome and numeric tokens from both ends, and rejects anything that does
/// not look like a person's name. Text that already has spaces keeps its
/// inner capitals (`Sarah McDonald`).
pub fn clean_name(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let concatenated = !raw.contains(char::is_whitespace);

    let spaced = if concatenated {
        LOWER_UPPER.replace_all(raw, "$1 $2")
    } else {
        Cow::Borrowed(raw)
    };
    let spaced = LETTER_DIGIT.replace_all(&spaced, "$1 $2");
    if DATE_LITERAL.is_match(&spaced) {
        return None;
    }

    let mut tokens: Vec<&str> = spaced
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '$'))
        .filter(|t| !t.is_empty())
        .collect();
    strip_edges(&mut tokens);

    let name = tokens.join(" ");
    let len = name.chars().count();
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
        return None;
    }
    let starts_with_letter = name.chars().next().is_some_and(char::is_alphabetic);
    let ends_with_letter = name.chars().next_back().is_some_and(char::is_alphabetic);
    if !starts_with_letter || !ends_with_letter {
        return None;
    }
    if !name
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '-' || c == '\'')
    {
        return None;
    }
    if concatenated && tokens.iter().any(|t| t.chars().count() < 2) {
        return None;
    }
    if tokens.iter().any(|t| is_ui_token(t)) {
        return None;
    }
    if tokens
        .iter()
        .all(|t| DATE_WORDS.iter().any(|d| d.eq_ignore_ascii_case(t)))
    {
        return None;
    }
    if NOISE.is_match(&name) {
        return None;
    }
    Some(name)
}

/// Bidder name extractor.
#[derive(Debug, Clone)]
pub struct NameExtractor {
    proximity_levels: usize,
}

impl NameExtractor {
    /// Create an extractor searching `proximity_levels` preceding lines.
    pub fn new(proximity_levels: usize) -> Self {
        Self { proximity_levels }
    }

    /// Extract the bidder name for a candidate.
    pub fn extract(&self, candidate: &BidCandidate) -> String {
        let before = candidate.text_before();
        let mut levels: Vec<&str> = before.rsplit('\n').collect();
        levels.truncate(self.proximity_levels + 1);
        self.extract_with_levels(candidate, &levels)
    }

    /// Extract using caller-supplied levels, nearest first.
    ///
    /// The first level is the text on the candidate's own line.
    pub fn extract_with_levels(&self, candidate: &BidCandidate, levels: &[&str]) -> String {
        self.structural(candidate)
            .or_else(|| self.proximity(levels))
            .or_else(|| self.fallback(candidate))
            .unwrap_or_else(|| UNKNOWN_BIDDER.to_string())
    }

    fn structural(&self, candidate: &BidCandidate) -> Option<String> {
        if let Some(name) = candidate.name_hint.as_deref().and_then(clean_name) {
            return Some(name);
        }
        TRAILING_NAME
            .captures(candidate.text_before())
            .and_then(|caps| caps.get(1))
            .and_then(|m| clean_name(m.as_str()))
    }

    fn proximity(&self, levels: &[&str]) -> Option<String> {
        levels.iter().find_map(|level| {
            let matches: Vec<&str> = FULL_NAME.find_iter(level).map(|m| m.as_str()).collect();
            matches.into_iter().rev().find_map(clean_name)
        })
    }

    fn fallback(&self, candidate: &BidCandidate) -> Option<String> {
        let before: Vec<&str> = FULL_NAME
            .find_iter(candidate.text_before())
            .map(|m| m.as_str())
            .collect();
        before
            .into_iter()
            .rev()
            .chain(FULL_NAME.find_iter(candidate.text_after()).map(|m| m.as_str()))
            .find_map(clean_name)
    }
}
