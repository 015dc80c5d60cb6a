use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref QUOTE_ID: Regex = Regex::new(r"^\d+$").unwrap();
}

/// Parses a quote id taken from a request path.
///
/// Only plain digit strings are accepted. Anything else, including values too
/// large for a SERIAL column, yields `None` so callers can answer with 404.
pub fn parse_quote_id(raw: &str) -> Option<i32> {
    if !QUOTE_ID.is_match(raw) {
        return None;
    }
    raw.parse::<i32>().ok()
}
