//! Fixed-width padding of textual values

use crate::descriptor::{Align, Padding};
use progcall_interface::ParamValue;

/// Apply `padding` to a value about to be written
///
/// Only textual values are touched; numbers and bytes pass through unchanged.
pub fn apply(value: ParamValue, padding: Option<&Padding>) -> ParamValue {
    match (value, padding) {
        (ParamValue::Text(text), Some(rule)) => ParamValue::Text(pad(&text, rule)),
        (value, _) => value,
    }
}

/// Pad or truncate `text` to exactly `rule.length` characters
///
/// Truncation keeps the leading characters regardless of alignment.
pub fn pad(text: &str, rule: &Padding) -> String {
    let len = text.chars().count();
    if len >= rule.length {
        return text.chars().take(rule.length).collect();
    }

    let fill: String = std::iter::repeat(rule.fill)
        .take(rule.length - len)
        .collect();
    match rule.align {
        Align::Left => format!("{}{}", text, fill),
        Align::Right => format!("{}{}", fill, text),
    }
}
