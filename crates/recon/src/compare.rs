// Type-aware comparison of one matched custody/NBIM row pair.

use rust_decimal::Decimal;

use crate::config::ToleranceConfig;
use crate::mapping::{Field, FieldMapping, FieldType};
use crate::model::{Dataset, FieldValue, NormalizedRow};

/// One field that failed its comparison rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub field: Field,
    pub custody_value: String,
    pub nbim_value: String,
    pub reason: String,
}

/// Compare every mapped field of a matched pair, in mapping order.
///
/// Join-key fields are compared like any other text field; they are equal by
/// construction for a matched pair.
pub fn compare_pair(
    mapping: &FieldMapping,
    tolerance: &ToleranceConfig,
    custody: &NormalizedRow,
    nbim: &NormalizedRow,
) -> Vec<FieldMismatch> {
    let mut out = Vec::new();
    for entry in mapping.entries() {
        let c = custody.get(entry.field);
        let n = nbim.get(entry.field);
        if let Some(reason) = compare_values(entry.field, entry.kind, tolerance, c, n) {
            out.push(FieldMismatch {
                field: entry.field,
                custody_value: render(c),
                nbim_value: render(n),
                reason,
            });
        }
    }
    out
}

fn render(value: Option<&FieldValue>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// `None` when the pair is equal under the field's rule, otherwise the reason.
pub fn compare_values(
    field: Field,
    kind: FieldType,
    tolerance: &ToleranceConfig,
    custody: Option<&FieldValue>,
    nbim: Option<&FieldValue>,
) -> Option<String> {
    // Unparseable on either side always breaks, even if both sides fail alike.
    let unparseable: Vec<String> = [(Dataset::Custody, custody), (Dataset::Nbim, nbim)]
        .into_iter()
        .filter_map(|(dataset, v)| match v {
            Some(FieldValue::Unparseable(err)) => Some(format!("{field} unparseable at {dataset}: {err}")),
            _ => None,
        })
        .collect();
    if !unparseable.is_empty() {
        return Some(unparseable.join("; "));
    }

    let custody = custody.filter(|v| !is_blank(v));
    let nbim = nbim.filter(|v| !is_blank(v));

    let (c, n) = match (custody, nbim) {
        (None, None) => return None,
        (None, Some(_)) => return Some(format!("{field} missing at custody")),
        (Some(_), None) => return Some(format!("{field} missing at nbim")),
        (Some(c), Some(n)) => (c, n),
    };

    match (kind, c, n) {
        (FieldType::Money, FieldValue::Number(a), FieldValue::Number(b)) => {
            numeric_break("money", *a, *b, tolerance.money)
        }
        (FieldType::Rate, FieldValue::Number(a), FieldValue::Number(b)) => {
            numeric_break("rate", *a, *b, tolerance.rate)
        }
        (FieldType::Date, FieldValue::Date(a), FieldValue::Date(b)) => {
            (a != b).then(|| format!("date {c} differs from {n}"))
        }
        (FieldType::Currency, _, _) => (c != n).then(|| format!("currency {c} differs from {n}")),
        _ => (c != n).then(|| format!("text '{c}' differs from '{n}'")),
    }
}

/// Empty date/number cells and empty text both count as "no value".
fn is_blank(value: &FieldValue) -> bool {
    match value {
        FieldValue::Empty => true,
        FieldValue::Text(s) | FieldValue::Currency(s) => s.is_empty(),
        _ => false,
    }
}

fn numeric_break(label: &str, a: Decimal, b: Decimal, tolerance: Decimal) -> Option<String> {
    match a.checked_sub(b) {
        Some(diff) => {
            let diff = diff.abs();
            (diff > tolerance).then(|| format!("{label} difference {diff} exceeds tolerance {tolerance}"))
        }
        None => Some(format!("{label} difference between {a} and {b} is out of range")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
