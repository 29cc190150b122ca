//! `divrecon run | validate | mapping`

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use divrecon_io::json::{export_context, write_json, write_report};
use divrecon_io::{read_table, write_breaks};
use divrecon_recon::{group_breaks, run, AliasTable, Dataset, FieldMapping, ReconConfig, ReconOutput};
use serde::Serialize;

use crate::exit_codes::EXIT_BREAKS;
use crate::CliError;

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn cmd_run(
    custody_path: PathBuf,
    nbim_path: PathBuf,
    config_path: Option<PathBuf>,
    output_file: Option<PathBuf>,
    json_output: bool,
    context_file: Option<PathBuf>,
) -> Result<(), CliError> {
    for (dataset, path) in [(Dataset::Custody, &custody_path), (Dataset::Nbim, &nbim_path)] {
        if !path.is_file() {
            return Err(CliError::usage(format!("{dataset} file not found: {}", path.display()))
                .with_hint("usage: divrecon run <CUSTODY> <NBIM>"));
        }
    }

    let config = load_config(config_path.as_deref())?;

    let custody = read_table(Dataset::Custody, &custody_path)?;
    let nbim = read_table(Dataset::Nbim, &nbim_path)?;
    let output = run(&config, &custody, &nbim)?;

    match &output_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| CliError::io(format!("cannot create {}: {e}", path.display())))?;
            let mut writer = BufWriter::new(file);
            write_output(&mut writer, &output, &config, json_output)?;
            writer
                .flush()
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
            log::info!("wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            write_output(&mut writer, &output, &config, json_output)?;
            writer
                .flush()
                .map_err(|e| CliError::io(format!("cannot write stdout: {e}")))?;
        }
    }

    if let Some(path) = &context_file {
        let groups = group_breaks(&output);
        export_context(&groups, path)?;
        log::info!("wrote {} break groups to {}", groups.len(), path.display());
    }

    // Human summary to stderr
    eprintln!("{}", summary_line(&output));

    if output.has_breaks() {
        return Err(CliError::silent(EXIT_BREAKS));
    }
    Ok(())
}

fn write_output<W: Write>(
    writer: &mut W,
    output: &ReconOutput,
    config: &ReconConfig,
    json_output: bool,
) -> Result<(), CliError> {
    if json_output {
        write_report(writer, output)?;
    } else {
        write_breaks(writer, &output.breaks, config.output.delimiter_byte())?;
    }
    Ok(())
}

fn summary_line(output: &ReconOutput) -> String {
    let s = &output.summary;
    let mut line = format!(
        "{} breaks: {} keys matched, {} with mismatches ({} fields), {} missing at nbim, {} missing at custody",
        s.total_breaks, s.matched_keys, s.keys_with_mismatch, s.mismatches, s.custody_only, s.nbim_only,
    );
    if s.unparseable_cells > 0 {
        line.push_str(&format!(", {} unparseable cells", s.unparseable_cells));
    }
    if s.duplicate_keys > 0 {
        line.push_str(&format!(", {} duplicate keys", s.duplicate_keys));
    }
    line
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    println!(
        "ok: \"{}\" (money tolerance {}, rate tolerance {}, default date order {})",
        config.name, config.tolerance.money, config.tolerance.rate, config.dates.default_order,
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// mapping
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct MappingReport<'a> {
    mapping: &'a FieldMapping,
    aliases: &'a AliasTable,
}

pub fn cmd_mapping(config_path: Option<PathBuf>, json_output: bool) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let aliases = config.alias_table()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json_output {
        let report = MappingReport { mapping: &config.mapping, aliases: &aliases };
        write_json(&mut out, &report)?;
        return Ok(());
    }

    let render = |out: &mut io::StdoutLock<'_>| -> io::Result<()> {
        writeln!(out, "{:<18} {:<28} {:<28} {}", "FIELD", "CUSTODY", "NBIM", "TYPE")?;
        for entry in config.mapping.entries() {
            writeln!(
                out,
                "{:<18} {:<28} {:<28} {}",
                entry.field.as_str(),
                entry.custody_field,
                entry.nbim_field,
                entry.kind
            )?;
        }
        for dataset in [Dataset::Custody, Dataset::Nbim] {
            writeln!(out)?;
            writeln!(out, "aliases ({dataset}):")?;
            for entry in config.mapping.entries() {
                let candidates = aliases.candidates(dataset, entry.field);
                writeln!(out, "  {:<18} {}", entry.field.as_str(), candidates.join(", "))?;
            }
        }
        Ok(())
    };
    render(&mut out).map_err(|e| CliError::io(format!("cannot write stdout: {e}")))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Built-in defaults when no path is given.
fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::usage(format!("cannot read config {}: {e}", path.display()))
    })?;
    let config = ReconConfig::from_toml(&text)?;
    log::debug!("loaded config \"{}\" from {}", config.name, path.display());
    Ok(config)
}
