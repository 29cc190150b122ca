use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::date::DayOrder;
use crate::error::CellError;
use crate::mapping::{Field, FieldMapping};
use crate::normalize::NormalizedTable;

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Custody,
    Nbim,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custody => write!(f, "custody"),
            Self::Nbim => write!(f, "nbim"),
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One input line, cells in header order. Original text is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based source line.
    pub line: usize,
    pub values: Vec<String>,
}

impl RawRow {
    /// Cell at a column index; short rows read as empty.
    pub fn get(&self, index: usize) -> &str {
        self.values.get(index).map(|s| s.as_str()).unwrap_or("")
    }
}

/// A decoded, delimiter-split input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub delimiter: u8,
    pub encoding: String,
}

impl RawTable {
    /// In-memory table with comma delimiter and UTF-8 label. Handy for callers
    /// that already hold parsed rows.
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, cells)| RawRow {
                    line: i + 2,
                    values: cells.iter().map(|c| c.to_string()).collect(),
                })
                .collect(),
            delimiter: b',',
            encoding: "UTF-8".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Currency(String),
    Date(NaiveDate),
    Number(Decimal),
    /// Blank date/number cell.
    Empty,
    Unparseable(CellError),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) | Self::Currency(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Number(n) => write!(f, "{n}"),
            Self::Empty => Ok(()),
            Self::Unparseable(err) => write!(f, "UNPARSEABLE({})", err.raw()),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Typed view of one input row, keyed by canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRow {
    pub line: usize,
    pub values: BTreeMap<Field, FieldValue>,
}

impl NormalizedRow {
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    pub fn join_key(&self) -> JoinKey {
        JoinKey {
            event: self.key_part(Field::CoacEventKey),
            account: self.key_part(Field::BankAccount),
        }
    }

    fn key_part(&self, field: Field) -> String {
        self.get(field).map(|v| v.to_string()).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Transaction identity: (event key, bank account), compared case-sensitively
/// after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JoinKey {
    pub event: String,
    pub account: String,
}

impl JoinKey {
    pub fn new(event: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            account: account.into(),
        }
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.event, self.account)
    }
}

/// A join key seen more than once on one side. Only the first row is compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub dataset: Dataset,
    pub key: JoinKey,
    pub count: usize,
    pub lines: Vec<usize>,
}

// ---------------------------------------------------------------------------
// Breaks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakType {
    Mismatch,
    MissingAtCustody,
    MissingAtNbim,
}

impl BreakType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mismatch => "mismatch",
            Self::MissingAtCustody => "missing_at_custody",
            Self::MissingAtNbim => "missing_at_nbim",
        }
    }
}

impl fmt::Display for BreakType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakRecord {
    pub join_key: JoinKey,
    pub break_type: BreakType,
    pub column: Option<Field>,
    pub custody_value: String,
    pub nbim_value: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub custody_rows: usize,
    pub nbim_rows: usize,
    pub matched_keys: usize,
    pub custody_only: usize,
    pub nbim_only: usize,
    pub keys_with_mismatch: usize,
    pub mismatches: usize,
    pub total_breaks: usize,
    pub unparseable_cells: usize,
    pub duplicate_keys: usize,
    pub breaks_by_column: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
}

/// The day order applied to one date column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateOrderReport {
    pub dataset: Dataset,
    pub field: Field,
    pub order: DayOrder,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconOutput {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub duplicates: Vec<DuplicateKey>,
    pub date_orders: Vec<DateOrderReport>,
    pub breaks: Vec<BreakRecord>,
    /// The mapping the run compared with.
    #[serde(skip)]
    pub mapping: FieldMapping,
    #[serde(skip)]
    pub custody: NormalizedTable,
    #[serde(skip)]
    pub nbim: NormalizedTable,
}

impl ReconOutput {
    pub fn has_breaks(&self) -> bool {
        !self.breaks.is_empty()
    }
}
