// Grouping of breaks per join key, for whatever explains them downstream.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::mapping::{Field, FieldType};
use crate::model::{BreakRecord, BreakType, JoinKey, NormalizedRow, ReconOutput};
use crate::normalize::NormalizedTable;

/// Deterministic first-pass label for a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakCategory {
    MissingAtCustody,
    MissingAtNbim,
    AmountMismatch,
    CurrencyMismatch,
    DateMismatch,
    IdentifierMismatch,
    OtherMismatch,
}

impl BreakCategory {
    pub fn of(record: &BreakRecord, kind: Option<FieldType>) -> Self {
        match record.break_type {
            BreakType::MissingAtCustody => Self::MissingAtCustody,
            BreakType::MissingAtNbim => Self::MissingAtNbim,
            BreakType::Mismatch => match (record.column, kind) {
                (Some(field), _) if field.is_identifier() => Self::IdentifierMismatch,
                (_, Some(FieldType::Money | FieldType::Rate)) => Self::AmountMismatch,
                (_, Some(FieldType::Currency)) => Self::CurrencyMismatch,
                (_, Some(FieldType::Date)) => Self::DateMismatch,
                _ => Self::OtherMismatch,
            },
        }
    }
}

impl fmt::Display for BreakCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingAtCustody => "missing_at_custody",
            Self::MissingAtNbim => "missing_at_nbim",
            Self::AmountMismatch => "amount_mismatch",
            Self::CurrencyMismatch => "currency_mismatch",
            Self::DateMismatch => "date_mismatch",
            Self::IdentifierMismatch => "identifier_mismatch",
            Self::OtherMismatch => "other_mismatch",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorizedBreak {
    pub category: BreakCategory,
    #[serde(flatten)]
    pub record: BreakRecord,
}

/// All breaks of one join key plus the rows they came from.
#[derive(Debug, Clone, Serialize)]
pub struct BreakGroup {
    pub join_key: JoinKey,
    pub breaks: Vec<CategorizedBreak>,
    pub custody: Option<BTreeMap<Field, String>>,
    pub nbim: Option<BTreeMap<Field, String>>,
}

/// One group per join key that has breaks, in break order.
pub fn group_breaks(output: &ReconOutput) -> Vec<BreakGroup> {
    let custody_rows = first_rows(&output.custody);
    let nbim_rows = first_rows(&output.nbim);

    let mut groups: Vec<BreakGroup> = Vec::new();
    let mut index: BTreeMap<&JoinKey, usize> = BTreeMap::new();

    for record in &output.breaks {
        let slot = *index.entry(&record.join_key).or_insert_with(|| {
            groups.push(BreakGroup {
                join_key: record.join_key.clone(),
                breaks: Vec::new(),
                custody: custody_rows.get(&record.join_key).map(|r| render_values(r)),
                nbim: nbim_rows.get(&record.join_key).map(|r| render_values(r)),
            });
            groups.len() - 1
        });
        let kind = record
            .column
            .and_then(|field| output.mapping.get(field))
            .map(|entry| entry.kind);
        groups[slot].breaks.push(CategorizedBreak {
            category: BreakCategory::of(record, kind),
            record: record.clone(),
        });
    }

    groups
}

/// The row kept for each key (the first one, as the matcher does).
fn first_rows(table: &NormalizedTable) -> BTreeMap<JoinKey, &NormalizedRow> {
    let mut rows = BTreeMap::new();
    for row in &table.rows {
        rows.entry(row.join_key()).or_insert(row);
    }
    rows
}

fn render_values(row: &NormalizedRow) -> BTreeMap<Field, String> {
    row.values.iter().map(|(f, v)| (*f, v.to_string())).collect()
}

// ---------------------------------------------------------------------------
// Enrichment boundary
// ---------------------------------------------------------------------------

/// Hook for a downstream stage that annotates break groups (for example a
/// language model writing an explanation). Groups are independent, so an
/// implementation may be called in any order.
pub trait BreakEnricher {
    type Annotation;
    type Error;

    fn enrich(&mut self, group: &BreakGroup) -> Result<Self::Annotation, Self::Error>;
}

/// Annotate every group in order. Stops at the first error.
pub fn enrich_groups<E: BreakEnricher>(
    enricher: &mut E,
    groups: &[BreakGroup],
) -> Result<Vec<(JoinKey, E::Annotation)>, E::Error> {
    groups
        .iter()
        .map(|g| enricher.enrich(g).map(|a| (g.join_key.clone(), a)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
