// Locale-aware parsing for money and rate cells.
// Pure functions: raw text in, fixed-precision decimal out.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::CellError;

/// Parse a number written with either `,` or `.` as the decimal separator.
///
/// - All whitespace (including non-breaking and thin spaces) and apostrophes
///   are grouping marks and are dropped.
/// - `-1`, `1-` and `(1)` are negative; a leading `+` is allowed.
/// - With both `,` and `.` present, the rightmost kind is the decimal
///   separator and must occur once; the other kind is grouping.
/// - A kind occurring more than once is grouping.
/// - A single separator is grouping only when it reads as a thousands group
///   (`1,234`, `12.500`, `0,150`): one to three leading digits, exactly three
///   trailing digits. Otherwise it is the decimal separator.
pub fn parse_decimal(raw: &str) -> Result<Decimal, CellError> {
    let fail = || CellError::NumberParse { raw: raw.to_string() };

    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '\u{2019}')
        .collect();

    let (negative, body) = split_sign(&cleaned).ok_or_else(fail)?;

    if !body.chars().any(|c| c.is_ascii_digit()) {
        return Err(fail());
    }
    if !body.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.') {
        return Err(fail());
    }

    let decimal_sep = decimal_separator(body).ok_or_else(fail)?;

    let mut canonical = String::with_capacity(body.len() + 1);
    if negative {
        canonical.push('-');
    }
    for c in body.chars() {
        match c {
            '0'..='9' => canonical.push(c),
            c if Some(c) == decimal_sep => canonical.push('.'),
            _ => {} // grouping separator
        }
    }

    Decimal::from_str(&canonical).map_err(|_| fail())
}

/// Strip one sign marker. Returns None for conflicting markers like `(-5)`.
fn split_sign(s: &str) -> Option<(bool, &str)> {
    let (negative, body) = if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        (true, inner)
    } else if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else if let Some(rest) = s.strip_suffix('-') {
        (true, rest)
    } else {
        (false, s)
    };

    if body.contains(|c: char| matches!(c, '-' | '+' | '(' | ')')) {
        return None;
    }
    Some((negative, body))
}

/// Decide which character (if any) is the decimal separator.
/// `Err`-like None means the separators are inconsistent.
fn decimal_separator(body: &str) -> Option<Option<char>> {
    let last_comma = body.rfind(',');
    let last_dot = body.rfind('.');

    match (last_comma, last_dot) {
        (None, None) => Some(None),
        (Some(c), Some(d)) => {
            let sep = if c > d { ',' } else { '.' };
            if body.matches(sep).count() == 1 {
                Some(Some(sep))
            } else {
                None
            }
        }
        (Some(_), None) => Some(single_kind(body, ',')),
        (None, Some(_)) => Some(single_kind(body, '.')),
    }
}

fn single_kind(body: &str, sep: char) -> Option<char> {
    if body.matches(sep).count() > 1 {
        return None;
    }
    let (before, after) = body.split_once(sep)?;
    let looks_like_grouping = after.len() == 3 && (1..=3).contains(&before.len());
    if looks_like_grouping {
        None
    } else {
        Some(sep)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
