// JSON reports: run output and enrichment groups

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use divrecon_recon::context::BreakGroup;
use divrecon_recon::model::ReconOutput;
use divrecon_recon::ReconError;
use serde::Serialize;

/// Pretty JSON of any report value, newline-terminated.
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<(), ReconError> {
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| ReconError::Io(format!("cannot write JSON: {e}")))?;
    writeln!(writer).map_err(|e| ReconError::Io(format!("cannot write JSON: {e}")))?;
    Ok(())
}

/// `{meta, summary, duplicates, date_orders, breaks}` for one run.
pub fn write_report<W: Write>(writer: W, output: &ReconOutput) -> Result<(), ReconError> {
    write_json(writer, output)
}

/// Enrichment groups to a file.
pub fn export_context(groups: &[BreakGroup], path: &Path) -> Result<(), ReconError> {
    let file = File::create(path)
        .map_err(|e| ReconError::Io(format!("cannot create {}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    write_json(&mut writer, groups)?;
    writer
        .flush()
        .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))
}
