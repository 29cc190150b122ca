use crate::compare::compare_pair;
use crate::config::ToleranceConfig;
use crate::mapping::FieldMapping;
use crate::matcher::{KeyMatch, MatchSet};
use crate::model::{BreakRecord, BreakType};

pub const REASON_CUSTODY_ONLY: &str = "key present in custody only";
pub const REASON_NBIM_ONLY: &str = "key present in nbim only";

/// Turn a match set into the ordered break list.
///
/// Missing-key records come first, then field mismatches. Both sections keep
/// first-seen key order; mismatches within a key follow mapping order.
pub fn emit_breaks(set: &MatchSet<'_>, mapping: &FieldMapping, tolerance: &ToleranceConfig) -> Vec<BreakRecord> {
    let mut breaks = Vec::new();

    for entry in &set.entries {
        let (key, break_type, reason) = match entry {
            KeyMatch::CustodyOnly { key, .. } => (key, BreakType::MissingAtNbim, REASON_CUSTODY_ONLY),
            KeyMatch::NbimOnly { key, .. } => (key, BreakType::MissingAtCustody, REASON_NBIM_ONLY),
            KeyMatch::Matched { .. } => continue,
        };
        breaks.push(BreakRecord {
            join_key: key.clone(),
            break_type,
            column: None,
            custody_value: String::new(),
            nbim_value: String::new(),
            reason: reason.to_string(),
        });
    }

    for (key, custody, nbim) in set.matched() {
        for m in compare_pair(mapping, tolerance, custody, nbim) {
            breaks.push(BreakRecord {
                join_key: key.clone(),
                break_type: BreakType::Mismatch,
                column: Some(m.field),
                custody_value: m.custody_value,
                nbim_value: m.nbim_value,
                reason: m.reason,
            });
        }
    }

    breaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Field;
    use crate::matcher::build_match_set;
    use crate::model::{FieldValue, NormalizedRow};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn row(event: &str, gross: i64) -> NormalizedRow {
        let mut values = BTreeMap::new();
        values.insert(Field::CoacEventKey, FieldValue::Text(event.into()));
        values.insert(Field::BankAccount, FieldValue::Text("ACC".into()));
        values.insert(Field::GrossAmount, FieldValue::Number(Decimal::new(gross, 2)));
        NormalizedRow { line: 2, values }
    }

    #[test]
    fn missing_records_precede_mismatches() {
        let custody = vec![row("A", 100), row("B", 100), row("X", 100)];
        let nbim = vec![row("B", 200), row("C", 100), row("X", 100)];
        let set = build_match_set(&custody, &nbim);
        let breaks = emit_breaks(&set, &FieldMapping::dividend(), &ToleranceConfig::default());

        let summary: Vec<(String, BreakType)> = breaks
            .iter()
            .map(|b| (b.join_key.to_string(), b.break_type))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("A/ACC".to_string(), BreakType::MissingAtNbim),
                ("C/ACC".to_string(), BreakType::MissingAtCustody),
                ("B/ACC".to_string(), BreakType::Mismatch),
            ]
        );
        assert_eq!(breaks[0].reason, REASON_CUSTODY_ONLY);
        assert_eq!(breaks[0].column, None);
        assert!(breaks[0].custody_value.is_empty());
        assert_eq!(breaks[1].reason, REASON_NBIM_ONLY);
        assert_eq!(breaks[2].column, Some(Field::GrossAmount));
        assert_eq!(breaks[2].reason, "money difference 1.00 exceeds tolerance 0.01");
    }

    #[test]
    fn clean_match_emits_nothing() {
        let custody = vec![row("A", 100)];
        let nbim = vec![row("A", 101)];
        let set = build_match_set(&custody, &nbim);
        assert!(emit_breaks(&set, &FieldMapping::dividend(), &ToleranceConfig::default()).is_empty());
    }
}
