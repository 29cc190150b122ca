// Date detection with per-column day-order inference.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CellError;

/// How to read an ambiguous `A/B/Y` numeric date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOrder {
    DayFirst,
    MonthFirst,
}

impl Default for DayOrder {
    fn default() -> Self {
        Self::DayFirst
    }
}

impl fmt::Display for DayOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DayFirst => write!(f, "day_first"),
            Self::MonthFirst => write!(f, "month_first"),
        }
    }
}

/// Month-name layouts, tried after the numeric forms.
const NAMED_FORMATS: &[&str] = &[
    "%d %B %Y",
    "%d-%B-%Y",
    "%d/%B/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %y",
    "%d-%B-%y",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

// ---------------------------------------------------------------------------
// Column inference
// ---------------------------------------------------------------------------

/// Pick one day order for a whole column.
///
/// Any ambiguous value whose first component exceeds 12 makes the column
/// day-first. Failing that, a second component above 12 makes it
/// month-first. With no evidence either way `default` applies.
pub fn infer_day_order<'a, I>(values: I, default: DayOrder) -> DayOrder
where
    I: IntoIterator<Item = &'a str>,
{
    let mut first_over_12 = false;
    let mut second_over_12 = false;

    for value in values {
        if let Some((a, b, _)) = ambiguous_parts(strip_time(value.trim())) {
            first_over_12 |= a > 12;
            second_over_12 |= b > 12;
        }
    }

    if first_over_12 {
        DayOrder::DayFirst
    } else if second_over_12 {
        DayOrder::MonthFirst
    } else {
        default
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse one (non-empty) cell using the column's day order.
pub fn parse_date(raw: &str, order: DayOrder) -> Result<NaiveDate, CellError> {
    let s = strip_time(raw.trim());

    let parsed = parse_year_first(s)
        .or_else(|| parse_ambiguous(s, order))
        .or_else(|| {
            NAMED_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        });

    parsed.ok_or_else(|| CellError::DateParse { raw: raw.to_string() })
}

/// Drop a trailing `THH:MM[:SS[.fff]]` or ` HH:MM...` component.
fn strip_time(s: &str) -> &str {
    if let Some(idx) = s.rfind(|c: char| c == 'T' || c == ' ') {
        let tail = &s[idx + 1..];
        if TIME_FORMATS
            .iter()
            .any(|fmt| NaiveTime::parse_from_str(tail, fmt).is_ok())
        {
            return s[..idx].trim_end();
        }
    }
    s
}

/// `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD`, `YYYYMMDD`.
fn parse_year_first(s: &str) -> Option<NaiveDate> {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let y = s[0..4].parse().ok()?;
        let m = s[4..6].parse().ok()?;
        let d = s[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    let parts = split_numeric(s)?;
    if parts[0].len() != 4 {
        return None;
    }
    let y = parts[0].parse().ok()?;
    let m = parts[1].parse().ok()?;
    let d = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

fn parse_ambiguous(s: &str, order: DayOrder) -> Option<NaiveDate> {
    let (a, b, year) = ambiguous_parts(s)?;
    let (day, month) = match order {
        DayOrder::DayFirst => (a, b),
        DayOrder::MonthFirst => (b, a),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `A<sep>B<sep>Y` with one- or two-digit `A`/`B` and a two- or four-digit year.
/// `A` or `B` above 31 cannot be a day, so `24-01-31` (a two-digit year first) is rejected.
fn ambiguous_parts(s: &str) -> Option<(u32, u32, i32)> {
    let parts = split_numeric(s)?;
    if !(1..=2).contains(&parts[0].len()) || !(1..=2).contains(&parts[1].len()) {
        return None;
    }
    let a: u32 = parts[0].parse().ok()?;
    let b: u32 = parts[1].parse().ok()?;
    if a > 31 || b > 31 {
        return None;
    }
    let year: i32 = match parts[2].len() {
        4 => parts[2].parse().ok()?,
        2 => {
            let yy: i32 = parts[2].parse().ok()?;
            if yy < 70 {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        _ => return None,
    };
    Some((a, b, year))
}

/// Split on a single consistent separator (`-`, `/` or `.`) into three digit groups.
fn split_numeric(s: &str) -> Option<[&str; 3]> {
    let sep = s.chars().find(|c| matches!(c, '-' | '/' | '.'))?;
    let mut it = s.split(sep);
    let parts = [it.next()?, it.next()?, it.next()?];
    if it.next().is_some() {
        return None;
    }
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    Some(parts)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
