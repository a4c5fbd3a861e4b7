//! Facebook comment markers around a match.
//!
//! A bare number is only believable as a bid when something around it looks
//! like a comment: an action link, a relative age, or the commenter's name.

use crate::window::floor_char_boundary;
use regex::Regex;

lazy_static::lazy_static! {
    static ref UI_MARKER: Regex = Regex::new(r"(?:Like|Reply|Share)(?:[^a-z]|$)").unwrap();
    static ref TIME_TOKEN: Regex = Regex::new(r"\d{1,2}[dhmwy](?:[^a-z]|$)").unwrap();
    static ref TRAILING_NAME: Regex =
        Regex::new(r"[A-Z][a-z]+(?:[ ]?[A-Z][a-z]+)+[\s:,\-]*$").unwrap();
}

/// Does the text contain a Like/Reply/Share action link?
pub fn has_ui_marker(text: &str) -> bool {
    UI_MARKER.is_match(text)
}

/// Does the text contain a relative age such as `2h` or `14w`?
pub fn has_time_token(text: &str) -> bool {
    TIME_TOKEN.is_match(text)
}

/// Is the match at `offset` directly preceded by a capitalised name?
///
/// Only the `span` bytes before the match are searched.
pub fn has_adjacent_name(context: &str, offset: usize, span: usize) -> bool {
    let end = floor_char_boundary(context, offset);
    let start = floor_char_boundary(context, end.saturating_sub(span));
    TRAILING_NAME.is_match(&context[start..end])
}

/// Any of the three comment markers.
pub fn is_corroborated(context: &str, offset: usize, span: usize) -> bool {
    has_ui_marker(context) || has_time_token(context) || has_adjacent_name(context, offset, span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_marker() {
        assert!(has_ui_marker("45 2h Like Reply"));
        assert!(has_ui_marker("JaneDoe3802hLikeReplyShare"));
        assert!(!has_ui_marker("Likely to sell"));
        assert!(!has_ui_marker("Shared with Public"));
    }

    #[test]
    fn test_time_token() {
        assert!(has_time_token("45\n2h\nReply"));
        assert!(has_time_token("posted 14w ago"));
        assert!(!has_time_token("width 150px"));
        assert!(!has_time_token("5mm stone"));
    }

    #[test]
    fn test_adjacent_name() {
        let context = "great stone Mary Jones: 60";
        let offset = context.find("60").unwrap();
        assert!(has_adjacent_name(context, offset, 80));

        let context = "MaryJones 60";
        assert!(has_adjacent_name(context, context.find("60").unwrap(), 80));

        let context = "total weight 60";
        assert!(!has_adjacent_name(context, context.find("60").unwrap(), 80));
    }

    #[test]
    fn test_corroboration() {
        assert!(!is_corroborated("2024", 0, 80));
        assert!(is_corroborated("Tom Lee 55", 8, 80));
    }
}
