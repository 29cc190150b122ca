use std::collections::BTreeMap;

use crate::model::{Dataset, DuplicateKey, JoinKey, NormalizedRow};

/// Outcome for one distinct join key.
#[derive(Debug, Clone)]
pub enum KeyMatch<'a> {
    Matched {
        key: JoinKey,
        custody: &'a NormalizedRow,
        nbim: &'a NormalizedRow,
    },
    CustodyOnly {
        key: JoinKey,
        row: &'a NormalizedRow,
    },
    NbimOnly {
        key: JoinKey,
        row: &'a NormalizedRow,
    },
}

impl KeyMatch<'_> {
    pub fn key(&self) -> &JoinKey {
        match self {
            Self::Matched { key, .. } | Self::CustodyOnly { key, .. } | Self::NbimOnly { key, .. } => key,
        }
    }
}

/// Keys of both datasets partitioned into matched / custody-only / NBIM-only.
///
/// Entries keep first-seen order: custody keys in input order, then keys that
/// only NBIM has, in NBIM input order.
#[derive(Debug, Clone, Default)]
pub struct MatchSet<'a> {
    pub entries: Vec<KeyMatch<'a>>,
    pub duplicates: Vec<DuplicateKey>,
}

impl<'a> MatchSet<'a> {
    pub fn matched(&self) -> impl Iterator<Item = (&JoinKey, &'a NormalizedRow, &'a NormalizedRow)> + '_ {
        self.entries.iter().filter_map(|e| match e {
            KeyMatch::Matched { key, custody, nbim } => Some((key, *custody, *nbim)),
            _ => None,
        })
    }

    pub fn custody_only(&self) -> impl Iterator<Item = (&JoinKey, &'a NormalizedRow)> + '_ {
        self.entries.iter().filter_map(|e| match e {
            KeyMatch::CustodyOnly { key, row } => Some((key, *row)),
            _ => None,
        })
    }

    pub fn nbim_only(&self) -> impl Iterator<Item = (&JoinKey, &'a NormalizedRow)> + '_ {
        self.entries.iter().filter_map(|e| match e {
            KeyMatch::NbimOnly { key, row } => Some((key, *row)),
            _ => None,
        })
    }
}

/// Index one side by join key: first row per key, in first-seen order.
/// Repeated keys are reported, never silently merged.
fn index_side<'a>(
    dataset: Dataset,
    rows: &'a [NormalizedRow],
    duplicates: &mut Vec<DuplicateKey>,
) -> (Vec<(JoinKey, &'a NormalizedRow)>, BTreeMap<JoinKey, &'a NormalizedRow>) {
    let mut order = Vec::new();
    let mut first: BTreeMap<JoinKey, &'a NormalizedRow> = BTreeMap::new();
    let mut lines: BTreeMap<JoinKey, Vec<usize>> = BTreeMap::new();

    for row in rows {
        let key = row.join_key();
        lines.entry(key.clone()).or_default().push(row.line);
        if !first.contains_key(&key) {
            order.push((key.clone(), row));
            first.insert(key, row);
        }
    }

    for (key, _) in &order {
        if let Some(seen) = lines.remove(key) {
            if seen.len() > 1 {
                log::warn!(
                    "{dataset}: join key {key} appears {} times (lines {:?}); comparing the first",
                    seen.len(),
                    seen
                );
                duplicates.push(DuplicateKey {
                    dataset,
                    key: key.clone(),
                    count: seen.len(),
                    lines: seen,
                });
            }
        }
    }

    (order, first)
}

/// Pair custody and NBIM rows by exact (event key, bank account).
pub fn build_match_set<'a>(custody: &'a [NormalizedRow], nbim: &'a [NormalizedRow]) -> MatchSet<'a> {
    let mut duplicates = Vec::new();
    let (custody_order, custody_map) = index_side(Dataset::Custody, custody, &mut duplicates);
    let (nbim_order, nbim_map) = index_side(Dataset::Nbim, nbim, &mut duplicates);

    let mut entries = Vec::with_capacity(custody_order.len() + nbim_order.len());

    for (key, c) in custody_order {
        match nbim_map.get(&key) {
            Some(n) => entries.push(KeyMatch::Matched {
                key,
                custody: c,
                nbim: *n,
            }),
            None => entries.push(KeyMatch::CustodyOnly { key, row: c }),
        }
    }

    for (key, row) in nbim_order {
        if !custody_map.contains_key(&key) {
            entries.push(KeyMatch::NbimOnly { key, row });
        }
    }

    MatchSet {
        entries,
        duplicates,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Field;
    use crate::model::FieldValue;

    fn row(line: usize, event: &str, account: &str) -> NormalizedRow {
        let mut values = BTreeMap::new();
        values.insert(Field::CoacEventKey, FieldValue::Text(event.into()));
        values.insert(Field::BankAccount, FieldValue::Text(account.into()));
        NormalizedRow { line, values }
    }

    fn keys<'a>(it: impl Iterator<Item = &'a JoinKey>) -> Vec<String> {
        it.map(|k| k.to_string()).collect()
    }

    #[test]
    fn partition_is_complete() {
        let custody = vec![row(2, "A", "1"), row(3, "B", "1")];
        let nbim = vec![row(2, "B", "1"), row(3, "C", "1")];
        let set = build_match_set(&custody, &nbim);

        assert_eq!(keys(set.matched().map(|(k, _, _)| k)), vec!["B/1"]);
        assert_eq!(keys(set.custody_only().map(|(k, _)| k)), vec!["A/1"]);
        assert_eq!(keys(set.nbim_only().map(|(k, _)| k)), vec!["C/1"]);
        assert!(set.duplicates.is_empty());
    }

    #[test]
    fn account_is_part_of_the_key() {
        let custody = vec![row(2, "E1", "100")];
        let nbim = vec![row(2, "E1", "200")];
        let set = build_match_set(&custody, &nbim);
        assert_eq!(set.matched().count(), 0);
        assert_eq!(set.custody_only().count(), 1);
        assert_eq!(set.nbim_only().count(), 1);
    }

    #[test]
    fn key_comparison_is_case_sensitive() {
        let custody = vec![row(2, "e1", "A")];
        let nbim = vec![row(2, "E1", "A")];
        let set = build_match_set(&custody, &nbim);
        assert_eq!(set.matched().count(), 0);
    }

    #[test]
    fn first_seen_order() {
        let custody = vec![row(2, "Z", "1"), row(3, "A", "1"), row(4, "M", "1")];
        let nbim = vec![row(2, "Y", "1"), row(3, "M", "1"), row(4, "B", "1")];
        let set = build_match_set(&custody, &nbim);
        assert_eq!(
            keys(set.entries.iter().map(|e| e.key())),
            vec!["Z/1", "A/1", "M/1", "Y/1", "B/1"]
        );
    }

    #[test]
    fn duplicates_are_reported_and_first_row_wins() {
        let custody = vec![row(2, "A", "1"), row(3, "A", "1"), row(4, "A", "1")];
        let nbim = vec![row(2, "A", "1")];
        let set = build_match_set(&custody, &nbim);

        assert_eq!(set.duplicates.len(), 1);
        let dup = &set.duplicates[0];
        assert_eq!(dup.dataset, Dataset::Custody);
        assert_eq!(dup.count, 3);
        assert_eq!(dup.lines, vec![2, 3, 4]);

        let (_, c, _) = set.matched().next().unwrap();
        assert_eq!(c.line, 2);
        assert_eq!(set.entries.len(), 1);
    }

    #[test]
    fn empty_inputs() {
        let set = build_match_set(&[], &[]);
        assert!(set.entries.is_empty());

        let nbim = vec![row(2, "A", "1")];
        let set = build_match_set(&[], &nbim);
        assert_eq!(set.nbim_only().count(), 1);
    }
}
