use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::alias::AliasTable;
use crate::date::DayOrder;
use crate::error::ReconError;
use crate::mapping::{Field, FieldMapping};
use crate::model::Dataset;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything a run depends on. Built once, never mutated by the engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub dates: DateConfig,
    #[serde(default)]
    pub aliases: AliasConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Not configurable from TOML; library callers may swap in a reduced mapping.
    #[serde(skip)]
    pub mapping: FieldMapping,
}

fn default_name() -> String {
    "dividend-reconciliation".into()
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            tolerance: ToleranceConfig::default(),
            dates: DateConfig::default(),
            aliases: AliasConfig::default(),
            output: OutputConfig::default(),
            mapping: FieldMapping::dividend(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Inclusive absolute tolerances: `|a - b| <= tolerance` is equal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ToleranceConfig {
    #[serde(default = "default_money_tolerance")]
    pub money: Decimal,
    #[serde(default = "default_rate_tolerance")]
    pub rate: Decimal,
}

fn default_money_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

fn default_rate_tolerance() -> Decimal {
    Decimal::new(1, 4)
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            money: default_money_tolerance(),
            rate: default_rate_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DateConfig {
    /// Used for a date column whose values never disambiguate day vs month.
    #[serde(default)]
    pub default_order: DayOrder,
}

/// Extra header spellings per canonical field name, appended after the
/// built-in aliases.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AliasConfig {
    #[serde(default)]
    pub custody: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub nbim: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

impl OutputConfig {
    pub const DELIMITERS: [char; 4] = [',', ';', '|', '\t'];

    pub fn delimiter_byte(&self) -> u8 {
        // Validated to be one of the ASCII delimiters above.
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        for (label, value) in [("money", self.tolerance.money), ("rate", self.tolerance.rate)] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ReconError::ConfigValidation(format!(
                    "tolerance.{label} must be >= 0, got {value}"
                )));
            }
        }

        if !OutputConfig::DELIMITERS.contains(&self.output.delimiter) {
            return Err(ReconError::ConfigValidation(format!(
                "output.delimiter must be one of ',', ';', '|' or tab, got {:?}",
                self.output.delimiter
            )));
        }

        // Resolving the alias table checks every field name.
        self.alias_table()?;
        Ok(())
    }

    /// Built-in aliases for the mapping, extended with configured spellings.
    pub fn alias_table(&self) -> Result<AliasTable, ReconError> {
        let mut table = AliasTable::for_mapping(&self.mapping);
        for (dataset, extra) in [
            (Dataset::Custody, &self.aliases.custody),
            (Dataset::Nbim, &self.aliases.nbim),
        ] {
            for (name, spellings) in extra {
                let field = Field::from_name(name).ok_or_else(|| {
                    ReconError::ConfigValidation(format!("aliases.{dataset}: unknown field '{name}'"))
                })?;
                if self.mapping.get(field).is_none() {
                    return Err(ReconError::ConfigValidation(format!(
                        "aliases.{dataset}: field {field} is not in the mapping"
                    )));
                }
                if spellings.iter().any(|s| s.trim().is_empty()) {
                    return Err(ReconError::ConfigValidation(format!(
                        "aliases.{dataset}.{field}: empty header spelling"
                    )));
                }
                table.extend(dataset, field, spellings);
            }
        }
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
