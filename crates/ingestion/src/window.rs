//! Byte-offset windows over scanned text.
//!
//! Offsets are byte positions. Every slice is clamped to a UTF-8 char
//! boundary so emoji and non-Latin names never split.

use regex::Regex;
use std::collections::BTreeSet;

lazy_static::lazy_static! {
    static ref DIGIT_RUN: Regex = Regex::new(r"\d+").unwrap();
}

/// Largest char boundary at or before `index`.
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary at or after `index`.
pub fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Text within `radius` bytes of `[start, end)`.
///
/// Returns the window and the offset of `start` inside it.
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> (String, usize) {
    let lo = floor_char_boundary(text, start.saturating_sub(radius));
    let hi = ceil_char_boundary(text, end.saturating_add(radius));
    (text[lo..hi].to_string(), start - lo)
}

/// Does the window read like a numbered list, table or chart axis rather
/// than a comment thread?
///
/// True when the window holds more than `min_distinct` distinct small
/// integers and at least `min_run` of them are consecutive.
pub fn looks_like_sequence(window: &str, min_distinct: usize, min_run: usize) -> bool {
    let values: BTreeSet<u32> = DIGIT_RUN
        .find_iter(window)
        .filter(|m| m.as_str().len() <= 4)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    if values.len() <= min_distinct {
        return false;
    }

    let mut longest = 1;
    let mut run = 1;
    let mut prev: Option<u32> = None;
    for &value in &values {
        match prev {
            Some(p) if value == p + 1 => {
                run += 1;
                longest = longest.max(run);
            }
            _ => run = 1,
        }
        prev = Some(value);
    }
    longest >= min_run
}

/// Trailing `max_bytes` of `text`, clamped forward to a char boundary.
pub fn keep_tail(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let start = ceil_char_boundary(text, text.len() - max_bytes);
    &text[start..]
}
