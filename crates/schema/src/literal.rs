//! Literal text helpers for the ClickHouse `VALUES` grammar

use std::fmt::Write;

/// Quote a string as a single-quoted ClickHouse literal
///
/// Escaping mirrors JSON string escaping, adapted to ClickHouse: the single
/// quote is always escaped so no input can close the literal early, and
/// control characters without a short escape use `\xHH` (ClickHouse has no
/// `\uXXXX`). Non-ASCII text passes through as UTF-8.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\0' => out.push_str("\\0"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Quote an identifier with backticks unless it is a plain identifier
pub fn quote_identifier(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if plain {
        return name.to_owned();
    }

    let mut out = String::with_capacity(name.len() + 2);
    out.push('`');
    for c in name.chars() {
        match c {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('`');
    out
}

/// Shortest round-trip decimal, with ClickHouse spellings for non-finite values
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_owned()
    } else if f.is_infinite() {
        if f > 0.0 { "inf".to_owned() } else { "-inf".to_owned() }
    } else {
        f.to_string()
    }
}

/// Optional sign followed by ASCII digits only
pub(crate) fn is_integer_text(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Render `secs + nanos / 1e9` with exactly `precision` decimals, rounding
/// half away from zero
pub(crate) fn format_fixed_point(secs: i64, nanos: u32, precision: u32) -> String {
    debug_assert!(precision <= 9);
    debug_assert!(nanos < 1_000_000_000);

    // Work on the magnitude so the fractional part always counts up
    let negative = secs < 0;
    let (mut whole, frac_nanos) = if negative && nanos > 0 {
        (secs.unsigned_abs() - 1, 1_000_000_000 - nanos)
    } else {
        (secs.unsigned_abs(), nanos)
    };

    let scale = 10u32.pow(9 - precision);
    let limit = 10u64.pow(precision);
    let mut frac = u64::from((frac_nanos + scale / 2) / scale);
    if frac >= limit {
        whole += 1;
        frac -= limit;
    }

    let sign = if negative && (whole > 0 || frac > 0) { "-" } else { "" };
    if precision == 0 {
        format!("{sign}{whole}")
    } else {
        format!("{sign}{whole}.{frac:0width$}", width = precision as usize)
    }
}
