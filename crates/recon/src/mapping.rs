use std::fmt;

use serde::Serialize;

use crate::error::ReconError;
use crate::model::Dataset;

// ---------------------------------------------------------------------------
// Canonical fields
// ---------------------------------------------------------------------------

/// Closed set of comparable business fields. The canonical name is the
/// custody-side header, which is also what break records report as `COLUMN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Field {
    #[serde(rename = "COAC_EVENT_KEY")]
    CoacEventKey,
    #[serde(rename = "BANK_ACCOUNTS")]
    BankAccount,
    #[serde(rename = "ISIN")]
    Isin,
    #[serde(rename = "SEDOL")]
    Sedol,
    #[serde(rename = "NOMINAL_BASIS")]
    NominalBasis,
    #[serde(rename = "EX_DATE")]
    ExDate,
    #[serde(rename = "PAY_DATE")]
    PayDate,
    #[serde(rename = "CURRENCIES")]
    QuotationCurrency,
    #[serde(rename = "DIV_RATE")]
    DivRate,
    #[serde(rename = "TAX_RATE")]
    TaxRate,
    #[serde(rename = "GROSS_AMOUNT")]
    GrossAmount,
    #[serde(rename = "NET_AMOUNT_QC")]
    NetAmountQc,
    #[serde(rename = "TAX")]
    Tax,
    #[serde(rename = "NET_AMOUNT_SC")]
    NetAmountSc,
    #[serde(rename = "SETTLED_CURRENCY")]
    SettlementCurrency,
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::CoacEventKey,
        Field::BankAccount,
        Field::Isin,
        Field::Sedol,
        Field::NominalBasis,
        Field::ExDate,
        Field::PayDate,
        Field::QuotationCurrency,
        Field::DivRate,
        Field::TaxRate,
        Field::GrossAmount,
        Field::NetAmountQc,
        Field::Tax,
        Field::NetAmountSc,
        Field::SettlementCurrency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoacEventKey => "COAC_EVENT_KEY",
            Self::BankAccount => "BANK_ACCOUNTS",
            Self::Isin => "ISIN",
            Self::Sedol => "SEDOL",
            Self::NominalBasis => "NOMINAL_BASIS",
            Self::ExDate => "EX_DATE",
            Self::PayDate => "PAY_DATE",
            Self::QuotationCurrency => "CURRENCIES",
            Self::DivRate => "DIV_RATE",
            Self::TaxRate => "TAX_RATE",
            Self::GrossAmount => "GROSS_AMOUNT",
            Self::NetAmountQc => "NET_AMOUNT_QC",
            Self::Tax => "TAX",
            Self::NetAmountSc => "NET_AMOUNT_SC",
            Self::SettlementCurrency => "SETTLED_CURRENCY",
        }
    }

    /// Look up a field by canonical name (case-insensitive, trimmed).
    pub fn from_name(name: &str) -> Option<Field> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(name))
    }

    /// Fields that identify the security or the booking rather than describe it.
    pub fn is_identifier(&self) -> bool {
        matches!(
            self,
            Self::CoacEventKey | Self::BankAccount | Self::Isin | Self::Sedol
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Field types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Date,
    Currency,
    Rate,
    Money,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Date => write!(f, "date"),
            Self::Currency => write!(f, "currency"),
            Self::Rate => write!(f, "rate"),
            Self::Money => write!(f, "money"),
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingEntry {
    pub field: Field,
    pub custody_field: String,
    pub nbim_field: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
}

impl MappingEntry {
    pub fn new(field: Field, custody_field: &str, nbim_field: &str, kind: FieldType) -> Self {
        Self {
            field,
            custody_field: custody_field.into(),
            nbim_field: nbim_field.into(),
            kind,
        }
    }

    /// Header name this entry expects in the given dataset.
    pub fn header(&self, dataset: Dataset) -> &str {
        match dataset {
            Dataset::Custody => &self.custody_field,
            Dataset::Nbim => &self.nbim_field,
        }
    }
}

/// The complete comparable surface. Nothing outside these entries is ever compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    entries: Vec<MappingEntry>,
}

impl FieldMapping {
    /// The fixed custody-vs-NBIM dividend mapping.
    pub fn dividend() -> Self {
        use Field as F;
        use FieldType as T;

        let entries = vec![
            MappingEntry::new(F::CoacEventKey, "COAC_EVENT_KEY", "COAC_EVENT_KEY", T::Text),
            MappingEntry::new(F::BankAccount, "BANK_ACCOUNTS", "BANK_ACCOUNT", T::Text),
            MappingEntry::new(F::Isin, "ISIN", "ISIN", T::Text),
            MappingEntry::new(F::Sedol, "SEDOL", "SEDOL", T::Text),
            MappingEntry::new(F::NominalBasis, "NOMINAL_BASIS", "NOMINAL_BASIS", T::Text),
            MappingEntry::new(F::ExDate, "EX_DATE", "EXDATE", T::Date),
            MappingEntry::new(F::PayDate, "PAY_DATE", "PAYMENT_DATE", T::Date),
            MappingEntry::new(F::QuotationCurrency, "CURRENCIES", "QUOTATION_CURRENCY", T::Currency),
            MappingEntry::new(F::DivRate, "DIV_RATE", "DIVIDENDS_PER_SHARE", T::Rate),
            MappingEntry::new(F::TaxRate, "TAX_RATE", "WTHTAX_RATE", T::Rate),
            MappingEntry::new(F::GrossAmount, "GROSS_AMOUNT", "GROSS_AMOUNT_QUOTATION", T::Money),
            MappingEntry::new(F::NetAmountQc, "NET_AMOUNT_QC", "NET_AMOUNT_QUOTATION", T::Money),
            MappingEntry::new(F::Tax, "TAX", "WTHTAX_COST_QUOTATION", T::Money),
            MappingEntry::new(F::NetAmountSc, "NET_AMOUNT_SC", "NET_AMOUNT_SETTLEMENT", T::Money),
            MappingEntry::new(F::SettlementCurrency, "SETTLED_CURRENCY", "SETTLEMENT_CURRENCY", T::Currency),
        ];
        Self { entries }
    }

    /// Build a custom mapping. Both join-key fields must be present as text
    /// entries, and no field may appear twice.
    pub fn from_entries(entries: Vec<MappingEntry>) -> Result<Self, ReconError> {
        for key_field in [Field::CoacEventKey, Field::BankAccount] {
            match entries.iter().find(|e| e.field == key_field) {
                None => {
                    return Err(ReconError::ConfigValidation(format!(
                        "mapping must include join-key field {key_field}"
                    )))
                }
                Some(e) if e.kind != FieldType::Text => {
                    return Err(ReconError::ConfigValidation(format!(
                        "join-key field {key_field} must be text, got {}",
                        e.kind
                    )))
                }
                Some(_) => {}
            }
        }

        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.field == entry.field) {
                return Err(ReconError::ConfigValidation(format!(
                    "field {} mapped more than once",
                    entry.field
                )));
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn get(&self, field: Field) -> Option<&MappingEntry> {
        self.entries.iter().find(|e| e.field == field)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::dividend()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
