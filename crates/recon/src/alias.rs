use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ReconError;
use crate::mapping::{Field, FieldMapping};
use crate::model::Dataset;

/// Known vendor spellings per header. Symmetric where both sides use a
/// different spelling for the same concept.
const HEADER_ALIASES: &[(&str, &[&str])] = &[
    // Keys
    ("BANK_ACCOUNTS", &["BANK_ACCOUNT", "BANK_ACCT", "ACCOUNT", "ACCT"]),
    ("BANK_ACCOUNT", &["BANK_ACCOUNTS", "BANK_ACCT", "ACCOUNT", "ACCT"]),
    ("COAC_EVENT_KEY", &["COAC KEY", "EVENT_KEY", "EVENT ID", "COACKEY", "COAC-EVENT-KEY"]),
    // Dates & currencies
    ("EX_DATE", &["EXDATE", "EX-DATE", "EX DATE"]),
    ("EXDATE", &["EX_DATE", "EX-DATE", "EX DATE"]),
    ("PAY_DATE", &["PAYMENT_DATE", "PAYDATE", "PAY DATE"]),
    ("PAYMENT_DATE", &["PAY_DATE", "PAYDATE", "PAY DATE"]),
    ("CURRENCIES", &["QUOTATION_CURRENCY", "CURRENCY", "QUOTATIONCURRENCY"]),
    ("QUOTATION_CURRENCY", &["CURRENCIES", "QUOTATIONCURRENCY", "CCY_QUOTE"]),
    // Amounts & rates
    (
        "DIV_RATE",
        &["DIVIDENDS_PER_SHARE", "DIVIDEND_PER_SHARE", "DIV_PER_SHARE", "DIV_PER_SHR", "DIVIDENDSPS", "DIVPS"],
    ),
    ("DIVIDENDS_PER_SHARE", &["DIV_RATE", "DIV_PER_SHARE", "DIV_PER_SHR", "DIVPS"]),
    ("TAX_RATE", &["WTHTAX_RATE", "WITHHOLDING_TAX_RATE"]),
    ("WTHTAX_RATE", &["TAX_RATE", "WITHHOLDING_TAX_RATE"]),
    ("GROSS_AMOUNT", &["GROSS_AMOUNT_QUOTATION", "GROSS_AMOUNT_QC", "GROSS_QC"]),
    ("GROSS_AMOUNT_QUOTATION", &["GROSS_AMOUNT", "GROSS_AMOUNT_QC", "GROSS_QC"]),
    ("NET_AMOUNT_QC", &["NET_AMOUNT_QUOTATION", "NET_QC"]),
    ("NET_AMOUNT_QUOTATION", &["NET_AMOUNT_QC", "NET_QC"]),
    ("TAX", &["WTHTAX_COST_QUOTATION", "WTHTAX_QUOTATION", "TAX_COST_QC"]),
    ("WTHTAX_COST_QUOTATION", &["TAX", "WTHTAX_QUOTATION", "TAX_COST_QC"]),
    ("NET_AMOUNT_SC", &["NET_AMOUNT_SETTLEMENT", "NET_SC", "NET_SETTLEMENT"]),
    ("NET_AMOUNT_SETTLEMENT", &["NET_AMOUNT_SC", "NET_SC", "NET_SETTLEMENT"]),
    ("SETTLED_CURRENCY", &["SETTLEMENT_CURRENCY", "SETTLED_CCY", "SETTLEMENT_CCY"]),
    ("SETTLEMENT_CURRENCY", &["SETTLED_CURRENCY", "SETTLED_CCY", "SETTLEMENT_CCY"]),
];

fn builtin_aliases(header: &str) -> &'static [&'static str] {
    HEADER_ALIASES
        .iter()
        .find(|(h, _)| h.eq_ignore_ascii_case(header))
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

// ---------------------------------------------------------------------------
// Alias table
// ---------------------------------------------------------------------------

/// Accepted header spellings per canonical field, kept separately for each
/// dataset. Candidate order is lookup priority.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AliasTable {
    custody: BTreeMap<Field, Vec<String>>,
    nbim: BTreeMap<Field, Vec<String>>,
}

impl AliasTable {
    /// Each side's candidates are its own mapped header followed by the
    /// built-in aliases for that header.
    pub fn for_mapping(mapping: &FieldMapping) -> Self {
        let mut table = Self::default();
        for entry in mapping.entries() {
            for dataset in [Dataset::Custody, Dataset::Nbim] {
                let header = entry.header(dataset);
                let mut spellings = vec![header.to_string()];
                spellings.extend(builtin_aliases(header).iter().map(|a| a.to_string()));
                table.side_mut(dataset).insert(entry.field, spellings);
            }
        }
        table
    }

    /// Append extra spellings for a field, after the built-in ones.
    pub fn extend(&mut self, dataset: Dataset, field: Field, spellings: &[String]) {
        let list = self.side_mut(dataset).entry(field).or_default();
        for s in spellings {
            if !list.iter().any(|existing| existing.eq_ignore_ascii_case(s.trim())) {
                list.push(s.trim().to_string());
            }
        }
    }

    pub fn candidates(&self, dataset: Dataset, field: Field) -> &[String] {
        self.side(dataset)
            .get(&field)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    fn side(&self, dataset: Dataset) -> &BTreeMap<Field, Vec<String>> {
        match dataset {
            Dataset::Custody => &self.custody,
            Dataset::Nbim => &self.nbim,
        }
    }

    fn side_mut(&mut self, dataset: Dataset) -> &mut BTreeMap<Field, Vec<String>> {
        match dataset {
            Dataset::Custody => &mut self.custody,
            Dataset::Nbim => &mut self.nbim,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub index: usize,
    pub header: String,
}

/// Canonical field → the header actually present in one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeaderMap {
    columns: BTreeMap<Field, ResolvedColumn>,
}

impl HeaderMap {
    pub fn get(&self, field: Field) -> Option<&ResolvedColumn> {
        self.columns.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &ResolvedColumn)> {
        self.columns.iter()
    }
}

/// Header reduced to upper-case ASCII letters and digits: `Pay-Date`,
/// `pay date` and `PAY_DATE` all become `PAYDATE`.
fn canonical_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Resolve every mapped field against a file's literal header row.
///
/// Two passes, each trying candidates in alias-table order so the first one
/// present wins:
/// 1. case-insensitive match on trimmed text;
/// 2. match on the canonical form (punctuation and spaces dropped), so
///    `Gross Amount` or `ex.date` still resolve.
///
/// If the same header occurs twice the leftmost column is used.
pub fn resolve_headers(
    dataset: Dataset,
    headers: &[String],
    mapping: &FieldMapping,
    aliases: &AliasTable,
) -> Result<HeaderMap, ReconError> {
    let folded: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let canonical: Vec<String> = headers.iter().map(|h| canonical_header(h)).collect();
    let mut columns = BTreeMap::new();

    for entry in mapping.entries() {
        let candidates = aliases.candidates(dataset, entry.field);
        let hit = candidates
            .iter()
            .find_map(|cand| {
                let cand = cand.trim().to_lowercase();
                folded.iter().position(|h| *h == cand)
            })
            .or_else(|| {
                candidates.iter().find_map(|cand| {
                    let cand = canonical_header(cand);
                    if cand.is_empty() {
                        return None;
                    }
                    canonical.iter().position(|h| *h == cand)
                })
            });

        match hit {
            Some(index) => {
                log::debug!("{dataset}: {} <- column {index} '{}'", entry.field, headers[index]);
                columns.insert(
                    entry.field,
                    ResolvedColumn {
                        index,
                        header: headers[index].clone(),
                    },
                );
            }
            None => {
                return Err(ReconError::MissingColumn {
                    dataset,
                    field: entry.field,
                    tried: candidates.to_vec(),
                })
            }
        }
    }

    Ok(HeaderMap { columns })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
