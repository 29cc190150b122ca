use crate::config::ReconConfig;
use crate::emit::emit_breaks;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::matcher::build_match_set;
use crate::model::{Dataset, DateOrderReport, RawTable, ReconMeta, ReconOutput};
use crate::normalize::{normalize_table, NormalizedTable};

/// Run one reconciliation. Same config and same tables always give the same
/// output, break order included.
pub fn run(config: &ReconConfig, custody: &RawTable, nbim: &RawTable) -> Result<ReconOutput, ReconError> {
    let aliases = config.alias_table()?;
    let order = config.dates.default_order;

    let custody = normalize_table(Dataset::Custody, custody, &config.mapping, &aliases, order)?;
    let nbim = normalize_table(Dataset::Nbim, nbim, &config.mapping, &aliases, order)?;

    let (breaks, summary, duplicates) = {
        let set = build_match_set(&custody.rows, &nbim.rows);
        let breaks = emit_breaks(&set, &config.mapping, &config.tolerance);
        let summary = compute_summary(&custody, &nbim, &set, &breaks);
        (breaks, summary, set.duplicates)
    };

    log::info!(
        "{}: {} custody rows, {} nbim rows, {} matched, {} breaks",
        config.name,
        summary.custody_rows,
        summary.nbim_rows,
        summary.matched_keys,
        summary.total_breaks
    );

    let mut date_orders = date_order_reports(Dataset::Custody, &custody);
    date_orders.extend(date_order_reports(Dataset::Nbim, &nbim));

    Ok(ReconOutput {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        summary,
        duplicates,
        date_orders,
        breaks,
        mapping: config.mapping.clone(),
        custody,
        nbim,
    })
}

fn date_order_reports(dataset: Dataset, table: &NormalizedTable) -> Vec<DateOrderReport> {
    table
        .date_orders
        .iter()
        .map(|(field, order)| DateOrderReport {
            dataset,
            field: *field,
            order: *order,
        })
        .collect()
}
