use std::collections::{BTreeMap, BTreeSet};

use crate::matcher::MatchSet;
use crate::model::{BreakRecord, BreakType, JoinKey, ReconSummary};
use crate::normalize::NormalizedTable;

/// Compute run totals from the normalized inputs, the match set and the emitted breaks.
pub fn compute_summary(
    custody: &NormalizedTable,
    nbim: &NormalizedTable,
    set: &MatchSet<'_>,
    breaks: &[BreakRecord],
) -> ReconSummary {
    let mut breaks_by_column: BTreeMap<String, usize> = BTreeMap::new();
    let mut mismatched_keys: BTreeSet<&JoinKey> = BTreeSet::new();
    let mut mismatches = 0;

    for b in breaks {
        if b.break_type == BreakType::Mismatch {
            mismatches += 1;
            mismatched_keys.insert(&b.join_key);
        }
        let column = match b.column {
            Some(field) => field.to_string(),
            None => b.break_type.to_string(),
        };
        *breaks_by_column.entry(column).or_insert(0) += 1;
    }

    ReconSummary {
        custody_rows: custody.rows.len(),
        nbim_rows: nbim.rows.len(),
        matched_keys: set.matched().count(),
        custody_only: set.custody_only().count(),
        nbim_only: set.nbim_only().count(),
        keys_with_mismatch: mismatched_keys.len(),
        mismatches,
        total_breaks: breaks.len(),
        unparseable_cells: custody.unparseable_cells + nbim.unparseable_cells,
        duplicate_keys: set.duplicates.len(),
        breaks_by_column,
    }
}
