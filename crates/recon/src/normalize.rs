use std::collections::BTreeMap;

use crate::alias::{resolve_headers, AliasTable, HeaderMap};
use crate::date::{infer_day_order, parse_date, DayOrder};
use crate::error::ReconError;
use crate::mapping::{Field, FieldMapping, FieldType};
use crate::model::{Dataset, FieldValue, NormalizedRow, RawTable};
use crate::number::parse_decimal;

/// One dataset after header resolution and value normalization.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub headers: HeaderMap,
    pub rows: Vec<NormalizedRow>,
    /// Day order applied to each date column.
    pub date_orders: BTreeMap<Field, DayOrder>,
    pub unparseable_cells: usize,
}

/// Normalize a single trimmed-or-not cell for a field type.
///
/// Text and currency never fail. Blank date/number cells become
/// [`FieldValue::Empty`]; anything else that does not parse becomes
/// [`FieldValue::Unparseable`].
pub fn normalize_value(kind: FieldType, raw: &str, order: DayOrder) -> FieldValue {
    let s = raw.trim();
    match kind {
        FieldType::Text => FieldValue::Text(s.to_string()),
        FieldType::Currency => FieldValue::Currency(s.to_uppercase()),
        FieldType::Date | FieldType::Money | FieldType::Rate if s.is_empty() => FieldValue::Empty,
        FieldType::Date => match parse_date(s, order) {
            Ok(d) => FieldValue::Date(d),
            Err(e) => FieldValue::Unparseable(e),
        },
        FieldType::Money | FieldType::Rate => match parse_decimal(s) {
            Ok(n) => FieldValue::Number(n),
            Err(e) => FieldValue::Unparseable(e),
        },
    }
}

/// Resolve headers and normalize every mapped cell of one dataset.
///
/// Fails only when a mapped field has no matching column. Bad cells are kept
/// as unparseable values and counted.
pub fn normalize_table(
    dataset: Dataset,
    table: &RawTable,
    mapping: &FieldMapping,
    aliases: &AliasTable,
    default_order: DayOrder,
) -> Result<NormalizedTable, ReconError> {
    let headers = resolve_headers(dataset, &table.headers, mapping, aliases)?;

    // Column-level day order: sample the whole column before parsing any value.
    let mut date_orders = BTreeMap::new();
    for entry in mapping.entries().iter().filter(|e| e.kind == FieldType::Date) {
        if let Some(col) = headers.get(entry.field) {
            let order = infer_day_order(table.rows.iter().map(|r| r.get(col.index)), default_order);
            log::info!("{dataset}: {} read as {order}", entry.field);
            date_orders.insert(entry.field, order);
        }
    }

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut unparseable_cells = 0;

    for raw_row in &table.rows {
        let mut values = BTreeMap::new();
        for entry in mapping.entries() {
            let Some(col) = headers.get(entry.field) else {
                continue;
            };
            let order = date_orders.get(&entry.field).copied().unwrap_or(default_order);
            let value = normalize_value(entry.kind, raw_row.get(col.index), order);
            if let FieldValue::Unparseable(ref err) = value {
                unparseable_cells += 1;
                log::warn!("{dataset}: line {}: {}: {err}", raw_row.line, entry.field);
            }
            values.insert(entry.field, value);
        }
        rows.push(NormalizedRow {
            line: raw_row.line,
            values,
        });
    }

    Ok(NormalizedTable {
        headers,
        rows,
        date_orders,
        unparseable_cells,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CellError;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn text_is_trimmed_and_empty_is_legitimate() {
        assert_eq!(
            normalize_value(FieldType::Text, "  ABC ", DayOrder::DayFirst),
            FieldValue::Text("ABC".into())
        );
        assert_eq!(
            normalize_value(FieldType::Text, "   ", DayOrder::DayFirst),
            FieldValue::Text(String::new())
        );
    }

    #[test]
    fn currency_is_upper_cased_leniently() {
        assert_eq!(
            normalize_value(FieldType::Currency, " nok ", DayOrder::DayFirst),
            FieldValue::Currency("NOK".into())
        );
        assert_eq!(
            normalize_value(FieldType::Currency, "usdx", DayOrder::DayFirst),
            FieldValue::Currency("USDX".into())
        );
    }

    #[test]
    fn blank_number_and_date_are_empty() {
        for kind in [FieldType::Money, FieldType::Rate, FieldType::Date] {
            assert_eq!(normalize_value(kind, "  ", DayOrder::DayFirst), FieldValue::Empty);
        }
    }

    #[test]
    fn bad_cells_are_unparseable() {
        assert_eq!(
            normalize_value(FieldType::Money, "abc", DayOrder::DayFirst),
            FieldValue::Unparseable(CellError::NumberParse { raw: "abc".into() })
        );
        assert_eq!(
            normalize_value(FieldType::Date, "soon", DayOrder::DayFirst),
            FieldValue::Unparseable(CellError::DateParse { raw: "soon".into() })
        );
    }

    #[test]
    fn typed_values() {
        assert_eq!(
            normalize_value(FieldType::Money, "1.234,56", DayOrder::DayFirst),
            FieldValue::Number(Decimal::new(123456, 2))
        );
        assert_eq!(
            normalize_value(FieldType::Date, "31/01/2024", DayOrder::DayFirst),
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
    }

    fn mapping() -> FieldMapping {
        use crate::mapping::MappingEntry;
        FieldMapping::from_entries(vec![
            MappingEntry::new(Field::CoacEventKey, "COAC_EVENT_KEY", "COAC_EVENT_KEY", FieldType::Text),
            MappingEntry::new(Field::BankAccount, "BANK_ACCOUNTS", "BANK_ACCOUNT", FieldType::Text),
            MappingEntry::new(Field::PayDate, "PAY_DATE", "PAYMENT_DATE", FieldType::Date),
            MappingEntry::new(Field::GrossAmount, "GROSS_AMOUNT", "GROSS_AMOUNT_QUOTATION", FieldType::Money),
        ])
        .unwrap()
    }

    #[test]
    fn day_order_is_decided_per_column() {
        // 02/03 alone is ambiguous; 02/25 later in the column settles month-first.
        let table = RawTable::from_rows(
            &["COAC_EVENT_KEY", "BANK_ACCOUNTS", "PAY_DATE", "GROSS_AMOUNT"],
            &[
                &["E1", "A1", "02/03/2024", "1"],
                &["E2", "A1", "02/25/2024", "2"],
            ],
        );
        let mapping = mapping();
        let aliases = AliasTable::for_mapping(&mapping);
        let out = normalize_table(Dataset::Custody, &table, &mapping, &aliases, DayOrder::DayFirst).unwrap();

        assert_eq!(out.date_orders[&Field::PayDate], DayOrder::MonthFirst);
        assert_eq!(
            out.rows[0].get(Field::PayDate),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 2, 3).unwrap()))
        );
        assert_eq!(out.unparseable_cells, 0);
    }

    #[test]
    fn unparseable_cells_are_counted_not_fatal() {
        let table = RawTable::from_rows(
            &["COAC_EVENT_KEY", "BANK_ACCOUNT", "PAYMENT_DATE", "GROSS_AMOUNT_QUOTATION"],
            &[&["E1", "A1", "yesterday", "12x"], &["E2", "A1", "2024-01-02", "5"]],
        );
        let mapping = mapping();
        let aliases = AliasTable::for_mapping(&mapping);
        let out = normalize_table(Dataset::Nbim, &table, &mapping, &aliases, DayOrder::DayFirst).unwrap();

        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.unparseable_cells, 2);
        assert_eq!(out.rows[0].line, 2);
        assert!(matches!(out.rows[0].get(Field::GrossAmount), Some(FieldValue::Unparseable(_))));
    }

    #[test]
    fn short_rows_read_as_blank() {
        let table = RawTable::from_rows(
            &["COAC_EVENT_KEY", "BANK_ACCOUNTS", "PAY_DATE", "GROSS_AMOUNT"],
            &[&["E1", "A1"]],
        );
        let mapping = mapping();
        let aliases = AliasTable::for_mapping(&mapping);
        let out = normalize_table(Dataset::Custody, &table, &mapping, &aliases, DayOrder::DayFirst).unwrap();
        assert_eq!(out.rows[0].get(Field::GrossAmount), Some(&FieldValue::Empty));
    }
}
