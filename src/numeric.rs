//! Number recognition for cell text.
//!
//! Cells are never typed at load time; sorting and statistics decide per value
//! whether it reads as a number. Both strip `,` grouping separators and take
//! the longest leading number (`"3.5kg"` counts as 3.5).

/// Leading number of a cell, or `None` when the cell does not start with one.
pub fn parse_number_prefix(value: &str) -> Option<f64> {
    let cleaned = strip_grouping(value);
    let trimmed = cleaned.trim_start();
    let len = numeric_prefix_len(trimmed);
    if len == 0 {
        return None;
    }
    finite(&trimmed[..len])
}

fn strip_grouping(value: &str) -> String {
    value.chars().filter(|&c| c != ',').collect()
}

fn finite(literal: &str) -> Option<f64> {
    literal.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Byte length of the longest prefix matching
/// `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`, or 0.
fn numeric_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            i = j;
        }
    }
    if digits == 0 {
        return 0;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}
